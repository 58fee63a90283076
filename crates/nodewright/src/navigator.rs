//! Sibling navigation
//!
//! Lookups climb parent links until some ancestor level offers a sibling in
//! the requested direction. A node's position under its parent is resolved
//! positionally when the host reports it, and by scanning the parent's
//! children for an identical handle otherwise.

use crate::element::Node;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Preceding,
    Following,
}

/// Index of `child` among `parent`'s current children.
pub fn position_in_parent(parent: &Node, child: &Node) -> Option<usize> {
    let child_count = parent.child_count();
    if let Some(index) = child.index_in_parent() {
        if index < child_count {
            return Some(index);
        }
    }
    (0..child_count).find(|&i| parent.child(i).is_some_and(|c| c.same_node(child)))
}

fn sibling_step(node: &Node, direction: Direction) -> Option<Node> {
    let mut chain = node.ancestors_or_self();
    let mut current = chain.next()?;
    for parent in chain {
        let child_count = parent.child_count();
        let sibling_index = match (position_in_parent(&parent, &current), direction) {
            (Some(index), Direction::Preceding) if index > 0 => Some(index - 1),
            (Some(index), Direction::Following) if index + 1 < child_count => Some(index + 1),
            // Unresolvable position: treat like an edge and keep climbing
            _ => None,
        };
        if let Some(sibling) = sibling_index.and_then(|i| parent.child(i)) {
            trace!(
                "{:?} sibling found under {} at index {:?}",
                direction,
                parent.class_name(),
                sibling_index
            );
            return Some(sibling);
        }
        current = parent;
    }
    None
}

/// Nearest preceding sibling of `node` or of its closest ancestor that has
/// one. While the result has fewer than `min_child_count` children the search
/// repeats from the result. `None` once the climb reaches the root.
pub fn preceding_sibling(node: &Node, min_child_count: usize) -> Option<Node> {
    let mut found = sibling_step(node, Direction::Preceding)?;
    while found.child_count() < min_child_count {
        found = sibling_step(&found, Direction::Preceding)?;
    }
    Some(found)
}

/// Nearest following sibling of `node` or of its closest ancestor that has
/// one.
///
/// Only the first hop moves forward. If that sibling has fewer than
/// `min_child_count` children, the escalation walks *backward* from it,
/// exactly like [`preceding_sibling`]. Callers depend on this asymmetry.
pub fn following_sibling(node: &Node, min_child_count: usize) -> Option<Node> {
    let mut found = sibling_step(node, Direction::Following)?;
    while found.child_count() < min_child_count {
        found = sibling_step(&found, Direction::Preceding)?;
    }
    Some(found)
}
