//! Query and drive live accessibility trees
//!
//! `nodewright` searches a host's accessibility node tree by class, text,
//! description or pattern, waits for nodes that have not appeared yet, walks
//! to siblings and ancestors, and acts on what it finds: semantic clicks and
//! scrolls with ancestor/descendant fallbacks, text entry, and synthetic taps
//! and drags when nothing semantic is available.
//!
//! The host is reached only through the traits in [`platforms`]. [`Driver`]
//! bundles the pieces behind one handle.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

pub mod config;
pub mod element;
pub mod errors;
pub mod gesture;
pub mod interaction;
pub mod locator;
pub mod logging;
pub mod navigator;
pub mod platforms;
pub mod query;
pub mod scroll_search;
pub mod selector;
#[cfg(test)]
mod tests;
pub mod tree_formatter;
pub mod types;

pub use config::DriverConfig;
pub use element::{Node, NodeImpl};
pub use errors::AutomationError;
pub use gesture::{Gesture, GestureOutcome, GestureSynthesizer, Stroke};
pub use interaction::Interactor;
pub use locator::{Locator, Poller, RefreshMode, RetryPolicy};
pub use logging::init_logging;
pub use platforms::{GestureCallback, HostDispatcher, RootProvider};
pub use query::{NodeSet, PreOrder};
pub use scroll_search::{ScrollHit, ScrollPhase, ScrollPlan, ScrollSearch};
pub use selector::{ClassQuery, Criteria, TextPattern, TextQuery};
pub use tree_formatter::{format_node_tree, NodeSnapshot};
pub use types::{GlobalAction, NodeAction, Point, Rect};

/// Class name of editable text fields.
pub const EDIT_TEXT_CLASS: &str = "android.widget.EditText";

/// Class names treated as scrolling lists by [`Driver::find_list_item_and_click`].
pub const LIST_CLASSES: [&str; 2] = [
    "androidx.recyclerview.widget.RecyclerView",
    "android.widget.ListView",
];

/// How [`Driver::find_text_input`] looks for its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Poll until the field appears or the timeout passes
    #[default]
    Retry,
    /// Look once
    Once,
}

/// Entry point tying a host's tree and input surface to the engine.
#[derive(Clone)]
pub struct Driver {
    config: DriverConfig,
    roots: Arc<dyn RootProvider>,
    poller: Poller,
    interactor: Interactor,
}

impl Driver {
    /// Build a driver over `roots` and `host`. Fails on an invalid config.
    #[instrument(level = "debug", skip(roots, host))]
    pub fn new(
        roots: Arc<dyn RootProvider>,
        host: Arc<dyn HostDispatcher>,
        config: DriverConfig,
    ) -> Result<Self, AutomationError> {
        config.validate()?;
        let poller = Poller::new(roots.clone(), config.retry_policy());
        let interactor = Interactor::new(host, &config);
        Ok(Self {
            config,
            roots,
            poller,
            interactor,
        })
    }

    /// Driver with the default timings.
    pub fn with_defaults(
        roots: Arc<dyn RootProvider>,
        host: Arc<dyn HostDispatcher>,
    ) -> Result<Self, AutomationError> {
        Self::new(roots, host, DriverConfig::default())
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn interactor(&self) -> &Interactor {
        &self.interactor
    }

    pub fn gestures(&self) -> &GestureSynthesizer {
        self.interactor.gestures()
    }

    /// Current root, re-read from the host when `force_refresh` is set.
    pub fn root(&self, force_refresh: bool) -> Result<Node, AutomationError> {
        self.roots.current_root(force_refresh).ok_or_else(|| {
            AutomationError::PlatformError("root provider has no active window".to_string())
        })
    }

    /// Async handle for `criteria`, searching from the provider's root.
    pub fn locator(&self, criteria: impl Into<Criteria>) -> Locator {
        Locator::new(self.poller.clone(), criteria.into())
    }

    // Polling lookups

    pub fn find_one(&self, start: &Node, criteria: &Criteria) -> Option<Node> {
        self.poller.find_one(start, criteria)
    }

    pub fn find_all(&self, start: &Node, criteria: &Criteria, min_results: usize) -> NodeSet {
        self.poller.find_all(start, criteria, min_results)
    }

    pub fn find_by_class(&self, start: &Node, query: &ClassQuery) -> Option<Node> {
        self.poller.find_by_class(start, query)
    }

    pub fn find_all_by_class(
        &self,
        start: &Node,
        query: &ClassQuery,
        min_results: usize,
    ) -> NodeSet {
        self.poller.find_all_by_class(start, query, min_results)
    }

    pub fn find_by_text(&self, start: &Node, query: &TextQuery) -> Option<Node> {
        self.poller.find_by_text(start, query)
    }

    pub fn find_all_by_text(&self, start: &Node, query: &TextQuery, min_results: usize) -> NodeSet {
        self.poller.find_all_by_text(start, query, min_results)
    }

    pub fn find_by_desc(&self, start: &Node, desc: &str) -> Option<Node> {
        self.poller.find_by_desc(start, desc)
    }

    pub fn find_all_by_desc(&self, start: &Node, desc: &str, min_results: usize) -> NodeSet {
        self.poller.find_all_by_desc(start, desc, min_results)
    }

    pub fn find_by_regex(&self, start: &Node, pattern: &TextPattern) -> Option<Node> {
        self.poller.find_by_regex(start, pattern)
    }

    pub fn find_all_by_regex(
        &self,
        start: &Node,
        pattern: &TextPattern,
        min_results: usize,
    ) -> NodeSet {
        self.poller.find_all_by_regex(start, pattern, min_results)
    }

    /// Wait up to `timeout` instead of the configured one.
    pub fn find_one_within(
        &self,
        start: &Node,
        criteria: &Criteria,
        timeout: Duration,
    ) -> Option<Node> {
        self.poller.with_timeout(timeout).find_one(start, criteria)
    }

    // Navigation

    pub fn preceding_sibling(&self, node: &Node, min_child_count: usize) -> Option<Node> {
        navigator::preceding_sibling(node, min_child_count)
    }

    pub fn following_sibling(&self, node: &Node, min_child_count: usize) -> Option<Node> {
        navigator::following_sibling(node, min_child_count)
    }

    // Actions

    pub fn click(&self, node: &Node, retry: bool) -> bool {
        self.interactor.click(node, retry)
    }

    pub fn click_with_descendant(&self, node: &Node) -> bool {
        self.interactor.click_with_descendant(node)
    }

    pub fn long_click(&self, node: &Node) -> bool {
        self.interactor.long_click(node)
    }

    pub fn long_click_with_descendant(&self, node: &Node) -> bool {
        self.interactor.long_click_with_descendant(node)
    }

    pub fn scroll_up(&self, node: &Node) -> bool {
        self.interactor.scroll_up(node)
    }

    pub fn scroll_down(&self, node: &Node) -> bool {
        self.interactor.scroll_down(node)
    }

    pub fn scroll_up_indexed(&self, node: &Node, index: usize) -> bool {
        self.interactor.scroll_up_indexed(node, index)
    }

    pub fn scroll_down_indexed(&self, node: &Node, index: usize) -> bool {
        self.interactor.scroll_down_indexed(node, index)
    }

    pub fn set_text(&self, node: &Node, text: &str, append: bool) -> bool {
        self.interactor.set_text(node, text, append)
    }

    pub fn set_text_direct(&self, node: &Node, text: &str) -> bool {
        self.interactor.set_text_direct(node, text)
    }

    pub fn tap(&self, point: Point) -> bool {
        self.gestures().tap(point)
    }

    pub fn tap_node(&self, node: &Node) -> bool {
        self.gestures().tap_node(node)
    }

    pub fn drag_by(&self, origin: Point, dx: f32, dy: f32) -> bool {
        let gestures = self.gestures();
        gestures.drag_by(origin, dx, dy, gestures.drag_duration())
    }

    pub fn drag_node(&self, node: &Node, dx: f32, dy: f32) -> bool {
        self.gestures().drag_node(node, dx, dy)
    }

    pub fn back(&self) -> bool {
        self.interactor.global_back()
    }

    pub fn home(&self) -> bool {
        self.interactor.global_home()
    }

    // Workflows

    /// Scroll the nearest list under `node` until a node matching `query`
    /// appears.
    pub fn scroll_and_find(
        &self,
        node: &Node,
        query: &TextQuery,
        max_retry: usize,
    ) -> Option<Node> {
        self.scroll_search().scroll_and_find(node, query, max_retry)
    }

    /// Like [`Driver::scroll_and_find`] with a custom phase plan.
    pub fn scroll_and_find_with_plan(
        &self,
        node: &Node,
        query: &TextQuery,
        plan: &ScrollPlan,
    ) -> Option<ScrollHit> {
        self.scroll_search().run(node, query, plan)
    }

    fn scroll_search(&self) -> ScrollSearch {
        ScrollSearch::new(self.interactor.clone(), self.config.scroll_settle())
    }

    /// Wait for a node containing any of `texts` and click it.
    pub fn find_text_and_click(&self, node: &Node, texts: &[&str]) -> bool {
        let query = TextQuery::contains(texts.iter().copied());
        match self.poller.find_by_text(node, &query) {
            Some(target) => self.interactor.click(&target, true),
            None => {
                error!("find_text_and_click: {:?} not found", texts);
                false
            }
        }
    }

    /// Find the first editable field under `node` and type `text` into it.
    pub fn find_text_input(
        &self,
        node: &Node,
        text: &str,
        search: SearchMode,
        append: bool,
    ) -> bool {
        let field_query = ClassQuery::new([EDIT_TEXT_CLASS]);
        let field = match search {
            SearchMode::Retry => self.poller.find_by_class(node, &field_query),
            SearchMode::Once => query::find_by_class(node, &field_query),
        };
        match field {
            Some(field) => {
                debug!("find_text_input: typing into {:?}", field);
                self.interactor.set_text(&field, text, append)
            }
            None => {
                error!("find_text_input: no {} under {}", EDIT_TEXT_CLASS, node.class_name());
                false
            }
        }
    }

    /// Click child `index` of the first list under `node`.
    pub fn find_list_item_and_click(&self, node: &Node, index: usize) -> bool {
        let Some(list) = query::find_by_class(node, &ClassQuery::new(LIST_CLASSES)) else {
            error!("find_list_item_and_click: no list under {}", node.class_name());
            return false;
        };
        match list.child(index) {
            Some(item) => {
                info!("find_list_item_and_click: clicking item {}", index);
                self.interactor.click(&item, true)
            }
            None => {
                error!(
                    "find_list_item_and_click: list has {} items, wanted {}",
                    list.child_count(),
                    index
                );
                false
            }
        }
    }

    // Diagnostics

    /// Emit the class tree under `node` at debug level.
    pub fn log_tree(&self, node: &Node, include_text: bool) {
        tree_formatter::log_node_tree(node, include_text);
    }

    /// Serializable copy of the subtree under `node`.
    pub fn snapshot(&self, node: &Node, max_depth: Option<usize>) -> NodeSnapshot {
        NodeSnapshot::capture(node, max_depth)
    }
}
