//! Semantic actions with fallback chains
//!
//! Hosts often report the visible element (a label, an icon) as inert while
//! some ancestor or descendant carries the action. Each operation here looks
//! for the nearest node that advertises the capability and performs the
//! action there. Failures come back as `false`; nothing here returns an
//! error or panics on a stale handle.

use crate::config::DriverConfig;
use crate::element::Node;
use crate::gesture::GestureSynthesizer;
use crate::platforms::HostDispatcher;
use crate::query;
use crate::types::{GlobalAction, NodeAction};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

#[derive(Clone)]
pub struct Interactor {
    host: Arc<dyn HostDispatcher>,
    gestures: GestureSynthesizer,
    click_fallback_delay: Duration,
    scroll_settle: Duration,
}

impl Interactor {
    pub fn new(host: Arc<dyn HostDispatcher>, config: &DriverConfig) -> Self {
        let gestures = GestureSynthesizer::new(
            host.clone(),
            config.tap_duration(),
            config.node_tap_duration(),
            config.drag_duration(),
        );
        Self {
            host,
            gestures,
            click_fallback_delay: config.click_fallback_delay(),
            scroll_settle: config.scroll_settle(),
        }
    }

    pub fn gestures(&self) -> &GestureSynthesizer {
        &self.gestures
    }

    /// Click `node` or its nearest clickable ancestor.
    ///
    /// When no node on the ancestor chain is clickable and `retry` is set,
    /// waits briefly, refreshes `node` and taps its screen center as a last
    /// resort. The tap is fire-and-forget, so this path still returns `false`
    /// whatever the host says about the gesture.
    pub fn click(&self, node: &Node, retry: bool) -> bool {
        if let Some(target) = node.ancestors_or_self().find(Node::is_clickable) {
            let performed = target.perform(&NodeAction::Click);
            debug!(
                "click success on {} (target {}, host accepted: {})",
                node.class_name(),
                target.class_name(),
                performed
            );
            return true;
        }

        error!("click failed, retry: {} {}", retry, node.class_name());
        if retry {
            thread::sleep(self.click_fallback_delay);
            node.refresh();
            let accepted = self.gestures.tap_node(node);
            error!("click failed, synthetic tap accepted: {}", accepted);
        }
        false
    }

    /// Click `node` if clickable, else its first clickable descendant in
    /// pre-order. `false` only when nothing in the subtree is clickable.
    pub fn click_with_descendant(&self, node: &Node) -> bool {
        match query::find_clickable(node) {
            Some(target) => {
                trace!("click_with_descendant target {}", target.class_name());
                target.perform(&NodeAction::Click);
                true
            }
            None => {
                debug!("click_with_descendant: nothing clickable under {}", node.class_name());
                false
            }
        }
    }

    /// Long-click `node` or its nearest long-clickable ancestor.
    pub fn long_click(&self, node: &Node) -> bool {
        match node.ancestors_or_self().find(Node::is_long_clickable) {
            Some(target) => {
                target.perform(&NodeAction::LongClick);
                true
            }
            None => {
                debug!("long_click: no long-clickable ancestor of {}", node.class_name());
                false
            }
        }
    }

    /// Long-click `node` if possible, else its first long-clickable
    /// descendant in pre-order.
    pub fn long_click_with_descendant(&self, node: &Node) -> bool {
        match query::find_long_clickable(node) {
            Some(target) => {
                target.perform(&NodeAction::LongClick);
                true
            }
            None => {
                debug!(
                    "long_click_with_descendant: nothing long-clickable under {}",
                    node.class_name()
                );
                false
            }
        }
    }

    /// Scroll the nearest scrollable ancestor-or-self backward.
    pub fn scroll_up(&self, node: &Node) -> bool {
        self.scroll_ancestor(node, NodeAction::ScrollBackward)
    }

    /// Scroll the nearest scrollable ancestor-or-self forward.
    pub fn scroll_down(&self, node: &Node) -> bool {
        self.scroll_ancestor(node, NodeAction::ScrollForward)
    }

    fn scroll_ancestor(&self, node: &Node, action: NodeAction) -> bool {
        match node.ancestors_or_self().find(Node::is_scrollable) {
            Some(target) => {
                target.perform(&action);
                true
            }
            None => {
                debug!("{}: no scrollable ancestor of {}", action.name(), node.class_name());
                false
            }
        }
    }

    /// Scroll backward the `index`-th scrollable node below `node`
    /// (pre-order), then wait for the UI to settle.
    pub fn scroll_up_indexed(&self, node: &Node, index: usize) -> bool {
        self.scroll_indexed(node, index, NodeAction::ScrollBackward)
    }

    /// Scroll forward the `index`-th scrollable node below `node`
    /// (pre-order), then wait for the UI to settle.
    pub fn scroll_down_indexed(&self, node: &Node, index: usize) -> bool {
        self.scroll_indexed(node, index, NodeAction::ScrollForward)
    }

    fn scroll_indexed(&self, node: &Node, index: usize, action: NodeAction) -> bool {
        let scrollables = query::find_all_scrollable(node);
        let Some(target) = scrollables.get(index) else {
            debug!(
                "{}: only {} scrollable nodes, wanted index {}",
                action.name(),
                scrollables.len(),
                index
            );
            return false;
        };
        let performed = target.perform(&action);
        thread::sleep(self.scroll_settle);
        performed
    }

    /// Replace (or with `append`, extend) the text of `node`.
    ///
    /// Refreshes first so the appended-to text is current. No retry: wrap the
    /// lookup in a [`Poller`](crate::locator::Poller) if the field may be late.
    pub fn set_text(&self, node: &Node, text: &str, append: bool) -> bool {
        node.refresh();
        let old_text = node.text().unwrap_or_default();
        trace!("set_text old text: {}", old_text);
        let new_text = if append {
            format!("{old_text}{text}")
        } else {
            text.to_string()
        };
        let performed = node.perform(&NodeAction::SetText(new_text));
        if !performed {
            warn!("set_text rejected by {}", node.class_name());
        }
        performed
    }

    /// Set the text of `node` as-is, without refreshing or appending.
    pub fn set_text_direct(&self, node: &Node, text: &str) -> bool {
        node.perform(&NodeAction::SetText(text.to_string()))
    }

    pub fn global_back(&self) -> bool {
        self.host.perform_global_action(GlobalAction::Back)
    }

    pub fn global_home(&self) -> bool {
        self.host.perform_global_action(GlobalAction::Home)
    }
}
