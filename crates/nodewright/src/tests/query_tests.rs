use super::{keyed, sample_tree};
use crate::element::{Node, NodeImpl, MAX_TREE_DEPTH};
use crate::platforms::memory::{MemoryTree, NodeSpec};
use crate::query::{self, PreOrder};
use crate::selector::{ClassQuery, Criteria, TextPattern, TextQuery};
use crate::types::{NodeAction, Rect};
use std::time::{Duration, Instant};

/// Malformed host node that lists itself as its only child.
#[derive(Debug)]
struct SelfLoop;

impl NodeImpl for SelfLoop {
    fn class_name(&self) -> String {
        "android.view.View".to_string()
    }
    fn text(&self) -> Option<String> {
        None
    }
    fn content_description(&self) -> Option<String> {
        None
    }
    fn is_clickable(&self) -> bool {
        false
    }
    fn is_long_clickable(&self) -> bool {
        false
    }
    fn is_scrollable(&self) -> bool {
        false
    }
    fn child_count(&self) -> usize {
        1
    }
    fn child(&self, index: usize) -> Option<Node> {
        (index == 0).then(|| Node::from_impl(SelfLoop))
    }
    fn parent(&self) -> Option<Node> {
        None
    }
    fn bounds_in_screen(&self) -> Rect {
        Rect::default()
    }
    fn perform_action(&self, _action: &NodeAction) -> bool {
        false
    }
    fn refresh(&self) -> bool {
        true
    }
    fn same_node(&self, other: &dyn NodeImpl) -> bool {
        other.as_any().is::<SelfLoop>()
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[test]
fn test_pre_order_visits_parent_before_children() {
    let tree = sample_tree();
    let root = keyed(&tree, "root");
    let keys: Vec<String> = PreOrder::new(&root)
        .filter_map(|(node, _)| tree.key_of(&node))
        .collect();
    assert_eq!(
        keys,
        vec![
            "root",
            "row",
            "xay",
            "a",
            "list",
            "item0",
            "item0_label",
            "item1",
            "item1_label",
            "item2",
            "item2_label",
            "input"
        ]
    );
}

#[test]
fn test_pre_order_depths() {
    let tree = sample_tree();
    let depths: Vec<usize> = PreOrder::new(&keyed(&tree, "list"))
        .map(|(_, depth)| depth)
        .collect();
    assert_eq!(depths, vec![0, 1, 2, 1, 2, 1, 2]);
}

#[test]
fn test_queries_are_idempotent_on_unchanged_tree() {
    let tree = sample_tree();
    let root = keyed(&tree, "root");
    let criteria = Criteria::class(["android.widget.TextView"]);
    let first = query::find_all(&root, &criteria);
    let second = query::find_all(&root, &criteria);
    assert_eq!(first.len(), 5);
    assert_eq!(first.into_vec(), second.into_vec());
    assert!(tree.actions().is_empty());
}

#[test]
fn test_find_by_class_includes_start_node() {
    let tree = sample_tree();
    let list = keyed(&tree, "list");
    let found = query::find_by_class(&list, &ClassQuery::new(["android.widget.ListView"]))
        .expect("start node matches");
    assert!(found.same_node(&list));
}

#[test]
fn test_class_query_depth_is_relative_to_start() {
    let tree = sample_tree();
    let root = keyed(&tree, "root");
    let layouts = ClassQuery::new(["android.widget.LinearLayout"]);

    let at_one = query::find_all_by_class(&root, &layouts.clone().at_depth(1));
    assert_eq!(at_one.len(), 1);
    assert_eq!(tree.key_of(&at_one[0]).as_deref(), Some("row"));

    let at_two = query::find_all_by_class(&root, &layouts.at_depth(2));
    let keys: Vec<_> = at_two.iter().filter_map(|n| tree.key_of(n)).collect();
    assert_eq!(keys, vec!["item0", "item1", "item2"]);
}

#[test]
fn test_class_query_structural_constraints() {
    let tree = sample_tree();
    let root = keyed(&tree, "root");

    let big = ClassQuery::new(["android.widget.LinearLayout"]).min_children(2);
    let found = query::find_all_by_class(&root, &big);
    assert_eq!(found.len(), 1);
    assert_eq!(tree.key_of(&found[0]).as_deref(), Some("row"));

    let with_label =
        ClassQuery::new(["android.widget.ListView"]).first_child("android.widget.TextView");
    assert!(query::find_by_class(&root, &with_label).is_none());

    let with_item =
        ClassQuery::new(["android.widget.ListView"]).first_child("android.widget.LinearLayout");
    assert!(query::find_by_class(&root, &with_item).is_some());
}

#[test]
fn test_first_child_constraint_needs_a_child() {
    let tree = MemoryTree::new(NodeSpec::new("android.widget.ListView"));
    let root = tree.root().expect("root");
    let query = ClassQuery::new(["android.widget.ListView"]).first_child("android.widget.TextView");
    assert!(query::find_by_class(&root, &query).is_none());
}

#[test]
fn test_text_contains_prefers_verbatim_hit() {
    let tree = sample_tree();
    let root = keyed(&tree, "root");

    // "XAY" comes first in pre-order but "A" equals the candidate
    let found = query::find_by_text(&root, &TextQuery::contains(["A"])).expect("match");
    assert_eq!(tree.key_of(&found).as_deref(), Some("a"));

    let all = query::find_all_by_text(&root, &TextQuery::contains(["A"]));
    let keys: Vec<_> = all.iter().filter_map(|n| tree.key_of(n)).collect();
    assert_eq!(keys, vec!["xay", "a", "item0_label"]);
}

#[test]
fn test_text_contains_without_verbatim_hit_returns_first() {
    let tree = sample_tree();
    let root = keyed(&tree, "root");
    let found = query::find_by_text(&root, &TextQuery::contains(["Y"])).expect("match");
    assert_eq!(tree.key_of(&found).as_deref(), Some("xay"));
}

#[test]
fn test_text_exact() {
    let tree = sample_tree();
    let root = keyed(&tree, "root");
    assert!(query::find_by_text(&root, &TextQuery::exact(["AY"])).is_none());
    let found = query::find_by_text(&root, &TextQuery::exact(["Gamma", "Beta"])).expect("match");
    assert_eq!(tree.key_of(&found).as_deref(), Some("item1_label"));
}

#[test]
fn test_desc_and_regex() {
    let tree = sample_tree();
    let root = keyed(&tree, "root");
    let list = tree.id("list").expect("list");
    tree.insert(
        list,
        Some(0),
        NodeSpec::new("android.widget.ImageView").key("icon").desc("Refresh"),
    );

    let icon = query::find_by_desc(&root, "Refresh").expect("desc match");
    assert_eq!(tree.key_of(&icon).as_deref(), Some("icon"));
    assert!(query::find_by_desc(&root, "Refres").is_none());

    let pattern = TextPattern::new("[A-Z][a-z]+a").expect("valid");
    let keys: Vec<_> = query::find_all_by_regex(&root, &pattern)
        .iter()
        .filter_map(|n| tree.key_of(n))
        .collect();
    assert_eq!(keys, vec!["item0_label", "item1_label", "item2_label"]);
}

#[test]
fn test_find_all_scrollable_and_clickable() {
    let tree = sample_tree();
    let root = keyed(&tree, "root");
    let scrollables = query::find_all_scrollable(&root);
    assert_eq!(scrollables.len(), 1);
    let first = query::find_scrollable(&root).expect("scrollable");
    assert_eq!(tree.key_of(&first).as_deref(), Some("list"));

    let clickable = query::find_clickable(&keyed(&tree, "list")).expect("clickable item");
    assert_eq!(tree.key_of(&clickable).as_deref(), Some("item0"));
    assert!(query::find_long_clickable(&root).is_none());
}

#[test]
fn test_node_set_deduplicates() {
    let tree = sample_tree();
    let a = keyed(&tree, "a");
    let again = keyed(&tree, "a");
    let set: query::NodeSet = vec![a, again, keyed(&tree, "xay")].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_string_criteria_through_find_one() {
    let tree = sample_tree();
    let root = keyed(&tree, "root");
    let found = query::find_one(&root, &Criteria::from("exact:Beta")).expect("match");
    assert_eq!(tree.key_of(&found).as_deref(), Some("item1_label"));
    assert!(query::find_one(&root, &Criteria::from("class:")).is_none());
}

#[test]
fn test_find_by_class_is_first_of_find_all() {
    let tree = sample_tree();
    let root = keyed(&tree, "root");
    let queries = [
        ClassQuery::new(["android.widget.TextView"]),
        ClassQuery::new(["android.widget.LinearLayout"])
            .at_depth(2)
            .min_children(1),
    ];
    for class_query in &queries {
        let one = query::find_by_class(&root, class_query).expect("match");
        let all = query::find_all_by_class(&root, class_query);
        let first = all.first().expect("non-empty");
        assert!(one.same_node(first), "{class_query:?}");
    }
}

#[test]
fn test_find_all_on_wide_tree_is_linear() {
    let tree = MemoryTree::new(
        NodeSpec::new("android.widget.FrameLayout")
            .children((0..20_000).map(|_| NodeSpec::new("android.view.View"))),
    );
    let root = tree.root().expect("root");

    let started = Instant::now();
    let found = query::find_all(&root, &Criteria::class(["android.view.View"]));
    let elapsed = started.elapsed();

    assert_eq!(found.len(), 20_000);
    assert!(elapsed < Duration::from_secs(2), "elapsed {elapsed:?}");
}

#[test]
fn test_cyclic_child_links_terminate() {
    let start = Node::from_impl(SelfLoop);
    assert_eq!(PreOrder::new(&start).count(), MAX_TREE_DEPTH + 1);
    assert!(query::find_one(&start, &Criteria::desc("missing")).is_none());
    assert_eq!(
        query::find_all(&start, &Criteria::class(["android.view.View"])).len(),
        MAX_TREE_DEPTH + 1
    );
}
