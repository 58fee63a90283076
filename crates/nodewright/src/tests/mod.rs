//! Engine tests against the in-memory host

mod query_tests;
mod scroll_search_tests;

use crate::platforms::memory::{MemoryHost, MemoryTree, NodeSpec};
use crate::{Driver, DriverConfig};
use std::sync::Arc;

pub(crate) const SCREEN_WIDTH: i32 = 1080;
pub(crate) const SCREEN_HEIGHT: i32 = 1920;

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Default stroke durations with waits short enough for unit tests.
pub(crate) fn fast_config() -> DriverConfig {
    DriverConfig {
        poll_interval_ms: 10,
        timeout_ms: 200,
        scroll_settle_ms: 1,
        click_fallback_delay_ms: 1,
        ..DriverConfig::default()
    }
}

pub(crate) fn host() -> Arc<MemoryHost> {
    Arc::new(MemoryHost::new(SCREEN_WIDTH, SCREEN_HEIGHT))
}

pub(crate) fn driver(tree: &MemoryTree, host: &Arc<MemoryHost>) -> Driver {
    Driver::new(Arc::new(tree.clone()), host.clone(), fast_config()).expect("valid config")
}

pub(crate) fn text_view(key: &str, text: &str) -> NodeSpec {
    NodeSpec::new("android.widget.TextView").key(key).text(text)
}

/// ```text
/// FrameLayout (root)
/// ├── LinearLayout (row, clickable)
/// │   ├── TextView "XAY" (xay)
/// │   └── TextView "A" (a)
/// ├── ListView (list, scrollable)
/// │   ├── LinearLayout (item0, clickable) > TextView "Alpha"
/// │   ├── LinearLayout (item1, clickable) > TextView "Beta"
/// │   └── LinearLayout (item2, clickable) > TextView "Gamma"
/// └── EditText (input) "foo"
/// ```
pub(crate) fn sample_tree() -> MemoryTree {
    let item = |key: &str, label: &str, top: i32| {
        NodeSpec::new("android.widget.LinearLayout")
            .key(key)
            .clickable()
            .bounds(0, top, 1080, top + 100)
            .child(text_view(&format!("{key}_label"), label).bounds(20, top, 500, top + 100))
    };
    MemoryTree::new(
        NodeSpec::new("android.widget.FrameLayout")
            .key("root")
            .bounds(0, 0, 1080, 1920)
            .child(
                NodeSpec::new("android.widget.LinearLayout")
                    .key("row")
                    .clickable()
                    .bounds(0, 0, 1080, 200)
                    .child(text_view("xay", "XAY").bounds(0, 0, 500, 200))
                    .child(text_view("a", "A").bounds(500, 0, 1080, 200)),
            )
            .child(
                NodeSpec::new("android.widget.ListView")
                    .key("list")
                    .scrollable()
                    .bounds(0, 200, 1080, 1700)
                    .child(item("item0", "Alpha", 200))
                    .child(item("item1", "Beta", 300))
                    .child(item("item2", "Gamma", 400)),
            )
            .child(
                NodeSpec::new(crate::EDIT_TEXT_CLASS)
                    .key("input")
                    .text("foo")
                    .bounds(0, 1700, 1080, 1800),
            ),
    )
}

pub(crate) fn keyed(tree: &MemoryTree, key: &str) -> crate::Node {
    tree.node_by_key(key)
        .unwrap_or_else(|| panic!("no node keyed {key}"))
}
