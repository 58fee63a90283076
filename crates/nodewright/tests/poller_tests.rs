//! Timing behavior of the polling searches

use nodewright::platforms::memory::{MemoryTree, NodeId, NodeSpec};
use nodewright::{Criteria, Node, Poller, RefreshMode, RetryPolicy, RootProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

fn policy(poll_ms: u64, timeout_ms: u64) -> RetryPolicy {
    RetryPolicy {
        poll_interval: Duration::from_millis(poll_ms),
        timeout: Duration::from_millis(timeout_ms),
        refresh: RefreshMode::Root,
    }
}

fn screen() -> MemoryTree {
    MemoryTree::new(
        NodeSpec::new("android.widget.FrameLayout")
            .key("root")
            .child(NodeSpec::new("android.widget.LinearLayout").key("content")),
    )
}

/// Reveals a "Send" button on the `reveal_on`-th forced root read.
struct RevealingRoots {
    tree: MemoryTree,
    parent: NodeId,
    reveal_on: usize,
    calls: AtomicUsize,
}

impl RootProvider for RevealingRoots {
    fn current_root(&self, force_refresh: bool) -> Option<Node> {
        if force_refresh {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.reveal_on {
                self.tree.insert(
                    self.parent,
                    None,
                    NodeSpec::new("android.widget.Button").text("Send").clickable(),
                );
            }
        }
        self.tree.root()
    }
}

struct NoRoots;

impl RootProvider for NoRoots {
    fn current_root(&self, _force_refresh: bool) -> Option<Node> {
        None
    }
}

#[test]
fn test_found_on_third_attempt() {
    init_tracing();
    let tree = screen();
    let roots = Arc::new(RevealingRoots {
        parent: tree.id("content").expect("content"),
        tree: tree.clone(),
        reveal_on: 2,
        calls: AtomicUsize::new(0),
    });
    let poller = Poller::new(roots.clone(), policy(150, 1000));
    let start = tree.root().expect("root");

    let started = Instant::now();
    let found = poller.find_one(&start, &Criteria::exact_text(["Send"]));
    let elapsed = started.elapsed();

    assert!(found.is_some());
    assert_eq!(roots.calls.load(Ordering::SeqCst), 2);
    assert!(elapsed >= Duration::from_millis(300), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1000), "elapsed {elapsed:?}");
}

#[test]
fn test_never_found_returns_after_timeout() {
    init_tracing();
    let tree = screen();
    let poller = Poller::new(Arc::new(tree.clone()), policy(150, 1000));
    let start = tree.root().expect("root");

    let started = Instant::now();
    let found = poller.find_one(&start, &Criteria::text(["Send"]));
    let elapsed = started.elapsed();

    assert!(found.is_none());
    assert!(elapsed >= Duration::from_millis(1000), "elapsed {elapsed:?}");
    assert!(tree.root_requests() >= 1);
}

#[test]
fn test_zero_timeout_makes_one_attempt() {
    let tree = screen();
    let poller = Poller::new(Arc::new(tree.clone()), policy(10, 0));
    let start = tree.root().expect("root");

    let mut attempts = 0;
    let found = poller.poll_until(&start, "zero timeout", |_| {
        attempts += 1;
        None::<Node>
    });
    assert!(found.is_none());
    assert_eq!(attempts, 1);
}

#[test]
fn test_min_results_waits_for_enough_matches() {
    let tree = screen();
    let content = tree.id("content").expect("content");
    tree.insert(content, None, NodeSpec::new("android.widget.Button").text("one"));

    let writer = tree.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(60));
        writer.insert(content, None, NodeSpec::new("android.widget.Button").text("two"));
    });

    let poller = Poller::new(Arc::new(tree.clone()), policy(20, 2000));
    let found = poller.find_all(
        &tree.root().expect("root"),
        &Criteria::class(["android.widget.Button"]),
        2,
    );
    handle.join().expect("writer thread");
    assert_eq!(found.len(), 2);
}

#[test]
fn test_node_refresh_never_asks_for_root() {
    let tree = screen();
    let poller =
        Poller::new(Arc::new(tree.clone()), policy(10, 60)).with_refresh(RefreshMode::Node);
    let found = poller.find_one(&tree.root().expect("root"), &Criteria::desc("missing"));
    assert!(found.is_none());
    assert_eq!(tree.root_requests(), 0);
}

#[test]
fn test_missing_root_keeps_previous_start() {
    init_tracing();
    let tree = screen();
    let content = tree.id("content").expect("content");
    let writer = tree.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        writer.insert(content, None, NodeSpec::new("android.widget.TextView").text("late"));
    });

    let poller = Poller::new(Arc::new(NoRoots), policy(20, 2000));
    let found = poller.find_one(&tree.root().expect("root"), &Criteria::exact_text(["late"]));
    handle.join().expect("writer thread");
    assert!(found.is_some());
}

#[test]
fn test_invalid_criteria_fail_fast() {
    let tree = screen();
    let poller = Poller::new(Arc::new(tree.clone()), policy(150, 5000));
    let started = Instant::now();
    assert!(poller
        .find_one(&tree.root().expect("root"), &Criteria::from("class:"))
        .is_none());
    assert!(started.elapsed() < Duration::from_millis(150));
}
