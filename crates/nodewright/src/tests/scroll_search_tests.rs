use super::{driver, host, init_tracing, keyed, sample_tree, text_view, SCREEN_HEIGHT};
use crate::platforms::memory::MemoryTree;
use crate::scroll_search::{ScrollPhase, ScrollPlan};
use crate::selector::TextQuery;
use crate::types::{NodeAction, Point};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn count(tree: &MemoryTree, action: &NodeAction) -> usize {
    tree.actions().iter().filter(|r| r.action == *action).count()
}

#[test]
fn test_found_during_native_forward() {
    init_tracing();
    let tree = sample_tree();
    let host = host();
    let driver = driver(&tree, &host);
    let list_id = tree.id("list").expect("list");

    let scrolls = Arc::new(AtomicUsize::new(0));
    let seen = scrolls.clone();
    tree.on_action(move |tree, _, action| {
        if *action == NodeAction::ScrollForward && seen.fetch_add(1, Ordering::SeqCst) == 1 {
            tree.insert(list_id, None, text_view("target", "Delta"));
        }
    });

    let hit = driver
        .scroll_and_find_with_plan(
            &keyed(&tree, "root"),
            &TextQuery::contains(["Delta"]),
            &ScrollPlan::standard(3),
        )
        .expect("found");
    assert_eq!(hit.phase, ScrollPhase::NativeForward);
    assert_eq!(hit.attempt, 2);
    assert_eq!(tree.key_of(&hit.node).as_deref(), Some("target"));
    assert!(host.gestures().is_empty());
}

#[test]
fn test_found_during_synthetic_up_after_native_phases() {
    init_tracing();
    let tree = sample_tree();
    let host = host();
    let driver = driver(&tree, &host);
    let list_id = tree.id("list").expect("list");

    let revealer = tree.clone();
    host.on_gesture(move |gesture| {
        let path = &gesture.strokes()[0].path;
        if path.len() == 2 && path[1].y < path[0].y {
            revealer.insert(list_id, None, text_view("target", "Delta"));
        }
    });

    let hit = driver
        .scroll_and_find_with_plan(
            &keyed(&tree, "root"),
            &TextQuery::exact(["Delta"]),
            &ScrollPlan::standard(2),
        )
        .expect("found");
    assert_eq!(hit.phase, ScrollPhase::SyntheticUp);
    assert_eq!(hit.attempt, 1);

    // Both native phases ran to exhaustion first
    assert_eq!(count(&tree, &NodeAction::ScrollForward), 2);
    assert_eq!(count(&tree, &NodeAction::ScrollBackward), 4);

    let gestures = host.gestures();
    assert_eq!(gestures.len(), 1);
    let center = Point::new(540.0, 960.0);
    assert_eq!(
        gestures[0].strokes()[0].path,
        vec![center, center.offset(0.0, -(SCREEN_HEIGHT / 2) as f32)]
    );
}

#[test]
fn test_found_during_synthetic_down() {
    let tree = sample_tree();
    let host = host();
    let driver = driver(&tree, &host);
    let list_id = tree.id("list").expect("list");

    let revealer = tree.clone();
    host.on_gesture(move |gesture| {
        let path = &gesture.strokes()[0].path;
        if path.len() == 2 && path[1].y > path[0].y {
            revealer.insert(list_id, None, text_view("target", "Delta"));
        }
    });

    let hit = driver
        .scroll_and_find_with_plan(
            &keyed(&tree, "root"),
            &TextQuery::contains(["Delta"]),
            &ScrollPlan::standard(1),
        )
        .expect("found");
    assert_eq!(hit.phase, ScrollPhase::SyntheticDown);
    assert_eq!(hit.attempt, 1);
    // 2 synthetic-up drags, then the successful downward one
    assert_eq!(host.gestures().len(), 3);
}

#[test]
fn test_exhausted_plan_returns_none() {
    let tree = sample_tree();
    let host = host();
    let driver = driver(&tree, &host);

    let found = driver.scroll_and_find(&keyed(&tree, "root"), &TextQuery::contains(["Omega"]), 1);
    assert!(found.is_none());
    assert_eq!(count(&tree, &NodeAction::ScrollForward), 1);
    assert_eq!(count(&tree, &NodeAction::ScrollBackward), 2);
    assert_eq!(host.gestures().len(), 2 + 3);
}

#[test]
fn test_visible_target_still_scrolls_once() {
    let tree = sample_tree();
    let host = host();
    let driver = driver(&tree, &host);

    let found = driver
        .scroll_and_find(&keyed(&tree, "root"), &TextQuery::contains(["Beta"]), 3)
        .expect("found");
    assert_eq!(tree.key_of(&found).as_deref(), Some("item1_label"));
    assert_eq!(count(&tree, &NodeAction::ScrollForward), 1);
}
