//! Debug dumps of a live node tree
//!
//! Two shapes: an indented text outline for logs, and a serializable
//! [`NodeSnapshot`] tree for attaching to bug reports or diffing runs.

use crate::element::Node;
use crate::query::PreOrder;
use crate::types::Rect;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::debug;

/// Detached copy of a node and its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NodeSnapshot {
    pub class_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,
    pub clickable: bool,
    pub long_clickable: bool,
    pub scrollable: bool,
    pub bounds: Rect,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// Capture `node` and up to `max_depth` levels below it (`None`: all).
    pub fn capture(node: &Node, max_depth: Option<usize>) -> Self {
        Self::capture_at(node, 0, max_depth)
    }

    fn capture_at(node: &Node, depth: usize, max_depth: Option<usize>) -> Self {
        let children = if max_depth.is_some_and(|limit| depth >= limit) {
            Vec::new()
        } else {
            node.children()
                .iter()
                .map(|child| Self::capture_at(child, depth + 1, max_depth))
                .collect()
        };
        Self {
            class_name: node.class_name(),
            text: node.text(),
            content_description: node.content_description(),
            clickable: node.is_clickable(),
            long_clickable: node.is_long_clickable(),
            scrollable: node.is_scrollable(),
            bounds: node.bounds(),
            children,
        }
    }

    /// Number of nodes in this snapshot, itself included.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(NodeSnapshot::node_count)
            .sum::<usize>()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One line per node, `---` per depth level, in pre-order:
///
/// ```text
///  depth: 0 className: android.widget.FrameLayout isClickable: false
/// --- depth: 1 className: android.widget.TextView isClickable: true
/// --- depth: 1 text: Send
/// ```
pub fn format_node_tree(node: &Node, include_text: bool) -> String {
    let mut output = String::new();
    for (current, depth) in PreOrder::new(node) {
        let prefix = "---".repeat(depth);
        let _ = writeln!(
            output,
            "{prefix} depth: {depth} className: {} isClickable: {}",
            current.class_name(),
            current.is_clickable()
        );
        if include_text {
            if let Some(text) = current.text() {
                let _ = writeln!(output, "{prefix} depth: {depth} text: {text}");
            }
            if let Some(desc) = current.content_description() {
                let _ = writeln!(output, "{prefix} depth: {depth} desc: {desc}");
            }
        }
    }
    output
}

/// Write [`format_node_tree`] to the debug log, one event per line.
pub fn log_node_tree(node: &Node, include_text: bool) {
    for line in format_node_tree(node, include_text).lines() {
        debug!(target: "nodewright::tree", "{}", line);
    }
}
