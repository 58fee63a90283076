//! Single-pass tree queries
//!
//! Every query walks the subtree below a start node depth-first in pre-order
//! (a node before its children, children left to right) exactly once. Nothing
//! here sleeps, retries or mutates the tree; wrap a query in
//! [`Poller`](crate::locator::Poller) to wait for a node to appear.

use crate::element::{Node, MAX_TREE_DEPTH};
use crate::selector::{ClassQuery, Criteria, TextPattern, TextQuery};
use std::ops::Deref;
use tracing::{trace, warn};

/// Lazy pre-order walk yielding `(node, depth)` with the start node at depth 0.
///
/// Children are fetched when their parent is yielded, so a child that
/// disappears mid-walk is skipped rather than aborting the traversal. Nodes
/// 256 levels below the start are yielded but not descended into, so a host
/// with cyclic child links still terminates.
pub struct PreOrder {
    stack: Vec<(Node, usize)>,
    depth_limit_hit: bool,
}

impl PreOrder {
    pub fn new(start: &Node) -> Self {
        Self {
            stack: vec![(start.clone(), 0)],
            depth_limit_hit: false,
        }
    }
}

impl Iterator for PreOrder {
    type Item = (Node, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        if depth >= MAX_TREE_DEPTH {
            if !self.depth_limit_hit {
                self.depth_limit_hit = true;
                warn!(
                    "tree walk hit depth limit {} below the start, not descending further",
                    MAX_TREE_DEPTH
                );
            }
            return Some((node, depth));
        }
        let children = node.children();
        // Reverse so the leftmost child is popped first
        self.stack
            .extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        Some((node, depth))
    }
}

/// Ordered collection of distinct nodes, in the order they were first found.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: Vec<Node>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `node` unless an identical handle is already present.
    /// Returns whether it was added.
    pub fn insert(&mut self, node: Node) -> bool {
        if self.nodes.iter().any(|existing| existing.same_node(&node)) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn into_vec(self) -> Vec<Node> {
        self.nodes
    }

    pub fn into_first(self) -> Option<Node> {
        self.nodes.into_iter().next()
    }
}

impl Deref for NodeSet {
    type Target = [Node];

    fn deref(&self) -> &[Node] {
        &self.nodes
    }
}

impl IntoIterator for NodeSet {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl NodeSet {
    /// Collect nodes from a single tree walk, which never yields a node twice.
    pub(crate) fn from_traversal<I: IntoIterator<Item = Node>>(nodes: I) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }
}

/// Merging collection: duplicates are dropped through [`NodeSet::insert`].
impl FromIterator<Node> for NodeSet {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        let mut set = NodeSet::new();
        for node in iter {
            set.insert(node);
        }
        set
    }
}

/// First node in pre-order matching `criteria`.
///
/// Text criteria follow [`find_by_text`]: an exact candidate hit beats an
/// earlier substring hit.
pub fn find_one(start: &Node, criteria: &Criteria) -> Option<Node> {
    match criteria {
        Criteria::Text(query) => find_by_text(start, query),
        _ => PreOrder::new(start)
            .find(|(node, depth)| criteria.matches(node, *depth))
            .map(|(node, _)| node),
    }
}

/// All nodes matching `criteria`, in pre-order.
pub fn find_all(start: &Node, criteria: &Criteria) -> NodeSet {
    NodeSet::from_traversal(
        PreOrder::new(start)
            .filter(|(node, depth)| criteria.matches(node, *depth))
            .map(|(node, _)| node),
    )
}

pub fn find_by_class(start: &Node, query: &ClassQuery) -> Option<Node> {
    let result = PreOrder::new(start)
        .find(|(node, depth)| query.matches(node, *depth))
        .map(|(node, _)| node);
    trace!(
        "class: {} found: {}",
        query.class_names.join(", "),
        result.is_some()
    );
    result
}

pub fn find_all_by_class(start: &Node, query: &ClassQuery) -> NodeSet {
    let result = NodeSet::from_traversal(
        PreOrder::new(start)
            .filter(|(node, depth)| query.matches(node, *depth))
            .map(|(node, _)| node),
    );
    trace!(
        "class: {} count: {}",
        query.class_names.join(", "),
        result.len()
    );
    result
}

/// Best text match below `start`.
///
/// Collects every matching node; the first one whose text equals a candidate
/// verbatim wins, otherwise the first match in pre-order.
pub fn find_by_text(start: &Node, query: &TextQuery) -> Option<Node> {
    let matches = find_all_by_text(start, query);
    if query.exact {
        return matches.into_first();
    }
    let exact_hit = matches
        .iter()
        .position(|node| node.text().is_some_and(|text| query.is_exact_hit(&text)));
    match exact_hit {
        Some(index) => matches.into_vec().into_iter().nth(index),
        None => matches.into_first(),
    }
}

pub fn find_all_by_text(start: &Node, query: &TextQuery) -> NodeSet {
    let result = NodeSet::from_traversal(
        PreOrder::new(start)
            .filter(|(node, _)| query.matches(node))
            .map(|(node, _)| node),
    );
    trace!("text: {} count: {}", query.texts.join(", "), result.len());
    result
}

pub fn find_by_desc(start: &Node, desc: &str) -> Option<Node> {
    PreOrder::new(start)
        .map(|(node, _)| node)
        .find(|node| node.content_description().as_deref() == Some(desc))
}

pub fn find_all_by_desc(start: &Node, desc: &str) -> NodeSet {
    NodeSet::from_traversal(
        PreOrder::new(start)
            .map(|(node, _)| node)
            .filter(|node| node.content_description().as_deref() == Some(desc)),
    )
}

pub fn find_by_regex(start: &Node, pattern: &TextPattern) -> Option<Node> {
    find_all_by_regex(start, pattern).into_first()
}

pub fn find_all_by_regex(start: &Node, pattern: &TextPattern) -> NodeSet {
    let result = NodeSet::from_traversal(
        PreOrder::new(start)
            .map(|(node, _)| node)
            .filter(|node| pattern.matches(node)),
    );
    trace!("regex: {} count: {}", pattern.as_str(), result.len());
    result
}

/// First scrollable node at or below `start`, in pre-order.
pub fn find_scrollable(start: &Node) -> Option<Node> {
    PreOrder::new(start)
        .map(|(node, _)| node)
        .find(Node::is_scrollable)
}

/// Scrollable nodes at or below `start`, in pre-order.
pub fn find_all_scrollable(start: &Node) -> NodeSet {
    NodeSet::from_traversal(
        PreOrder::new(start)
            .map(|(node, _)| node)
            .filter(Node::is_scrollable),
    )
}

/// First clickable node at or below `start`, in pre-order.
pub fn find_clickable(start: &Node) -> Option<Node> {
    PreOrder::new(start)
        .map(|(node, _)| node)
        .find(Node::is_clickable)
}

/// First long-clickable node at or below `start`, in pre-order.
pub fn find_long_clickable(start: &Node) -> Option<Node> {
    PreOrder::new(start)
        .map(|(node, _)| node)
        .find(Node::is_long_clickable)
}
