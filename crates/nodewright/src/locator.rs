//! Time-bounded polling over single-pass queries
//!
//! [`Poller`] turns any query from [`crate::query`] into a blocking wait: it
//! runs the query, and while nothing is found it sleeps the poll interval,
//! re-reads the tree (a fresh root or a refreshed start node) and tries
//! again until the wall-clock timeout passes. [`Locator`] offers the same
//! wait to async callers by running the poller on tokio's blocking pool.

use crate::element::Node;
use crate::errors::AutomationError;
use crate::platforms::RootProvider;
use crate::query::{self, NodeSet};
use crate::selector::{ClassQuery, Criteria, TextPattern, TextQuery};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::task;
use tracing::{debug, error, instrument, warn};

/// What to re-read between two polling attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// Ask the root provider for a fresh root and search from there
    #[default]
    Root,
    /// Refresh the start node in place and search below it again
    Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub poll_interval: Duration,
    /// Elapsed-time bound; one attempt is always made, even for zero
    pub timeout: Duration,
    pub refresh: RefreshMode,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(crate::config::DEFAULT_POLL_INTERVAL_MS),
            timeout: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS),
            refresh: RefreshMode::Root,
        }
    }
}

/// Blocking retry loop around single-pass searches.
#[derive(Clone)]
pub struct Poller {
    roots: Arc<dyn RootProvider>,
    policy: RetryPolicy,
}

impl Poller {
    pub fn new(roots: Arc<dyn RootProvider>, policy: RetryPolicy) -> Self {
        Self { roots, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn roots(&self) -> &Arc<dyn RootProvider> {
        &self.roots
    }

    pub fn with_policy(&self, policy: RetryPolicy) -> Self {
        Self {
            roots: self.roots.clone(),
            policy,
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_policy(RetryPolicy {
            timeout,
            ..self.policy
        })
    }

    pub fn with_refresh(&self, refresh: RefreshMode) -> Self {
        self.with_policy(RetryPolicy {
            refresh,
            ..self.policy
        })
    }

    /// Run `search` until `satisfied` accepts its result or the timeout
    /// passes. Returns the accepted result, or `None` after logging
    /// `description` at error level.
    pub fn poll<T, F, P>(
        &self,
        start: &Node,
        description: &str,
        mut search: F,
        satisfied: P,
    ) -> Option<T>
    where
        F: FnMut(&Node) -> T,
        P: Fn(&T) -> bool,
    {
        let started = Instant::now();
        let mut node = start.clone();
        let mut attempts = 0usize;
        loop {
            attempts += 1;
            let result = search(&node);
            if satisfied(&result) {
                debug!(
                    "{}: matched on attempt {} after {:?}",
                    description,
                    attempts,
                    started.elapsed()
                );
                return Some(result);
            }

            thread::sleep(self.policy.poll_interval);
            match self.policy.refresh {
                RefreshMode::Root => match self.roots.current_root(true) {
                    Some(root) => node = root,
                    None => warn!(
                        "{}: root provider returned no root, reusing previous",
                        description
                    ),
                },
                RefreshMode::Node => {
                    if !node.refresh() {
                        debug!("{}: start node no longer refreshes", description);
                    }
                }
            }

            let elapsed = started.elapsed();
            if elapsed > self.policy.timeout {
                error!(
                    "{}: not found after {} attempts in {:?}",
                    description, attempts, elapsed
                );
                return None;
            }
        }
    }

    /// Poll a search that yields at most one node.
    pub fn poll_until<T, F>(&self, start: &Node, description: &str, search: F) -> Option<T>
    where
        F: FnMut(&Node) -> Option<T>,
    {
        self.poll(start, description, search, Option::is_some).flatten()
    }

    /// First node matching `criteria`, waiting up to the policy timeout.
    #[instrument(level = "debug", skip(self, start, criteria), fields(criteria = %criteria))]
    pub fn find_one(&self, start: &Node, criteria: &Criteria) -> Option<Node> {
        if let Err(e) = criteria.validate() {
            error!("find_one: {}", e);
            return None;
        }
        let description = format!("find_one {criteria}");
        self.poll_until(start, &description, |node| query::find_one(node, criteria))
    }

    /// All nodes matching `criteria` once at least `min_results` are present.
    /// Empty when the timeout passes first.
    #[instrument(level = "debug", skip(self, start, criteria), fields(criteria = %criteria))]
    pub fn find_all(&self, start: &Node, criteria: &Criteria, min_results: usize) -> NodeSet {
        if let Err(e) = criteria.validate() {
            error!("find_all: {}", e);
            return NodeSet::new();
        }
        let description = format!("find_all {criteria} (min {min_results})");
        self.poll(
            start,
            &description,
            |node| query::find_all(node, criteria),
            |found: &NodeSet| found.len() >= min_results,
        )
        .unwrap_or_default()
    }

    pub fn find_by_class(&self, start: &Node, query: &ClassQuery) -> Option<Node> {
        self.find_one(start, &Criteria::Class(query.clone()))
    }

    pub fn find_all_by_class(
        &self,
        start: &Node,
        query: &ClassQuery,
        min_results: usize,
    ) -> NodeSet {
        self.find_all(start, &Criteria::Class(query.clone()), min_results)
    }

    pub fn find_by_text(&self, start: &Node, query: &TextQuery) -> Option<Node> {
        self.find_one(start, &Criteria::Text(query.clone()))
    }

    pub fn find_all_by_text(&self, start: &Node, query: &TextQuery, min_results: usize) -> NodeSet {
        self.find_all(start, &Criteria::Text(query.clone()), min_results)
    }

    pub fn find_by_desc(&self, start: &Node, desc: &str) -> Option<Node> {
        self.find_one(start, &Criteria::desc(desc))
    }

    pub fn find_all_by_desc(&self, start: &Node, desc: &str, min_results: usize) -> NodeSet {
        self.find_all(start, &Criteria::desc(desc), min_results)
    }

    pub fn find_by_regex(&self, start: &Node, pattern: &TextPattern) -> Option<Node> {
        self.find_one(start, &Criteria::Regex(pattern.clone()))
    }

    pub fn find_all_by_regex(
        &self,
        start: &Node,
        pattern: &TextPattern,
        min_results: usize,
    ) -> NodeSet {
        self.find_all(start, &Criteria::Regex(pattern.clone()), min_results)
    }
}

/// Async handle for waiting on nodes that match some criteria.
#[derive(Clone)]
pub struct Locator {
    poller: Poller,
    criteria: Criteria,
    timeout: Duration,
    root: Option<Node>,
}

impl Locator {
    pub(crate) fn new(poller: Poller, criteria: Criteria) -> Self {
        let timeout = poller.policy().timeout;
        Self {
            poller,
            criteria,
            timeout,
            root: None,
        }
    }

    /// Timeout used when a wait method gets `None`.
    pub fn set_default_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Search below `node` instead of the provider's root. Between attempts
    /// `node` is refreshed in place, so the scope never widens.
    pub fn within(mut self, node: Node) -> Self {
        self.root = Some(node);
        self
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    fn scoped_poller(&self, timeout: Duration) -> Poller {
        let poller = self.poller.with_timeout(timeout);
        match self.root {
            Some(_) => poller.with_refresh(RefreshMode::Node),
            None => poller,
        }
    }

    fn start_node(&self) -> Result<Node, AutomationError> {
        match &self.root {
            Some(node) => Ok(node.clone()),
            None => self.poller.roots().current_root(false).ok_or_else(|| {
                AutomationError::PlatformError("root provider has no active window".to_string())
            }),
        }
    }

    /// Wait for the first matching node.
    #[instrument(level = "debug", skip(self, timeout))]
    pub async fn wait(&self, timeout: Option<Duration>) -> Result<Node, AutomationError> {
        debug!("Waiting for node matching {}", self.criteria);
        self.criteria.validate()?;

        let effective_timeout = timeout.unwrap_or(self.timeout);
        let poller = self.scoped_poller(effective_timeout);
        let criteria = self.criteria.clone();
        let start = self.start_node()?;

        // The poller sleeps between attempts; keep it off the async workers
        task::spawn_blocking(move || poller.find_one(&start, &criteria))
            .await
            .map_err(|e| AutomationError::PlatformError(format!("Task join error: {e}")))?
            .ok_or_else(|| {
                AutomationError::Timeout(format!(
                    "Timed out after {effective_timeout:?} waiting for node {}",
                    self.criteria
                ))
            })
    }

    pub async fn first(&self, timeout: Option<Duration>) -> Result<Node, AutomationError> {
        self.wait(timeout).await
    }

    /// All matching nodes once at least `min_results` exist. An expired wait
    /// yields an empty set, not an error.
    pub async fn all(
        &self,
        timeout: Option<Duration>,
        min_results: usize,
    ) -> Result<NodeSet, AutomationError> {
        self.criteria.validate()?;
        let poller = self.scoped_poller(timeout.unwrap_or(self.timeout));
        let criteria = self.criteria.clone();
        let start = self.start_node()?;

        task::spawn_blocking(move || poller.find_all(&start, &criteria, min_results))
            .await
            .map_err(|e| AutomationError::PlatformError(format!("Task join error: {e}")))
    }

    /// Node at `index` among all matches; negative indices count from the end.
    pub async fn nth(
        &self,
        index: isize,
        timeout: Option<Duration>,
    ) -> Result<Node, AutomationError> {
        let nodes = self.all(timeout, 1).await?;
        if nodes.is_empty() {
            return Err(AutomationError::ElementNotFound(format!(
                "No nodes found for {}",
                self.criteria
            )));
        }

        let position = if index >= 0 {
            Some(index as usize)
        } else {
            nodes.len().checked_sub(index.unsigned_abs())
        };

        position
            .and_then(|i| nodes.get(i).cloned())
            .ok_or_else(|| {
                AutomationError::InvalidArgument(format!(
                    "nth index {} is out of bounds for {} nodes",
                    index,
                    nodes.len()
                ))
            })
    }
}
