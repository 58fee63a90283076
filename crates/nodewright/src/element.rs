//! Node handles over a host's live accessibility tree
//!
//! Hosts implement [`NodeImpl`]; the rest of the crate only sees [`Node`], a
//! cheap cloneable handle. A handle describes the element as of the snapshot
//! it was read from. Once the live UI changes its cached attributes may be
//! stale until [`Node::refresh`] re-syncs it.

use crate::types::{NodeAction, Rect};
use std::fmt;
use std::sync::Arc;

/// Guard against malformed hosts whose parent or child links form a cycle.
pub(crate) const MAX_TREE_DEPTH: usize = 256;

/// Capability surface a host exposes for one element.
pub trait NodeImpl: Send + Sync + fmt::Debug {
    fn class_name(&self) -> String;
    fn text(&self) -> Option<String>;
    fn content_description(&self) -> Option<String>;
    fn is_clickable(&self) -> bool;
    fn is_long_clickable(&self) -> bool;
    fn is_scrollable(&self) -> bool;
    fn child_count(&self) -> usize;

    /// Child at `index` in the current snapshot. `None` when the index is out
    /// of range or the child vanished since the count was read.
    fn child(&self, index: usize) -> Option<Node>;

    /// Parent handle. Used for navigation only, never ownership.
    fn parent(&self) -> Option<Node>;

    fn bounds_in_screen(&self) -> Rect;

    /// Ask the host to perform `action`. `true` means the host accepted it.
    fn perform_action(&self, action: &NodeAction) -> bool;

    /// Re-sync this handle with the live UI. `false` when the element no
    /// longer exists.
    fn refresh(&self) -> bool;

    /// Position of this element among its parent's children, if the host
    /// tracks it.
    fn index_in_parent(&self) -> Option<usize> {
        None
    }

    /// Whether `other` refers to the same live element.
    fn same_node(&self, other: &dyn NodeImpl) -> bool;

    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handle to one element in a live, externally mutated UI tree.
#[derive(Clone)]
pub struct Node {
    inner: Arc<dyn NodeImpl>,
}

impl Node {
    pub fn new(inner: Arc<dyn NodeImpl>) -> Self {
        Self { inner }
    }

    pub fn from_impl<T: NodeImpl + 'static>(inner: T) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn class_name(&self) -> String {
        self.inner.class_name()
    }

    pub fn text(&self) -> Option<String> {
        self.inner.text()
    }

    pub fn content_description(&self) -> Option<String> {
        self.inner.content_description()
    }

    pub fn is_clickable(&self) -> bool {
        self.inner.is_clickable()
    }

    pub fn is_long_clickable(&self) -> bool {
        self.inner.is_long_clickable()
    }

    pub fn is_scrollable(&self) -> bool {
        self.inner.is_scrollable()
    }

    pub fn child_count(&self) -> usize {
        self.inner.child_count()
    }

    pub fn child(&self, index: usize) -> Option<Node> {
        self.inner.child(index)
    }

    /// Children that could still be fetched, in index order.
    pub fn children(&self) -> Vec<Node> {
        (0..self.child_count())
            .filter_map(|i| self.child(i))
            .collect()
    }

    pub fn parent(&self) -> Option<Node> {
        self.inner.parent()
    }

    pub fn bounds(&self) -> Rect {
        self.inner.bounds_in_screen()
    }

    pub fn perform(&self, action: &NodeAction) -> bool {
        self.inner.perform_action(action)
    }

    pub fn refresh(&self) -> bool {
        self.inner.refresh()
    }

    pub fn index_in_parent(&self) -> Option<usize> {
        self.inner.index_in_parent()
    }

    pub fn same_node(&self, other: &Node) -> bool {
        self.inner.same_node(other.inner.as_ref())
    }

    /// Downcast to the host's concrete handle type.
    pub fn as_impl<T: 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Ancestor chain starting with this node itself.
    pub fn ancestors_or_self(&self) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
            visited: 0,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("class_name", &self.class_name())
            .field("text", &self.text())
            .field("content_description", &self.content_description())
            .field("child_count", &self.child_count())
            .finish()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.same_node(other)
    }
}

/// Iterator over a node and its ancestors, nearest first.
pub struct Ancestors {
    next: Option<Node>,
    visited: usize,
}

impl Iterator for Ancestors {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        let current = self.next.take()?;
        self.visited += 1;
        if self.visited >= MAX_TREE_DEPTH {
            tracing::warn!("ancestor walk hit depth limit without reaching the root");
        } else {
            self.next = current.parent();
        }
        Some(current)
    }
}
