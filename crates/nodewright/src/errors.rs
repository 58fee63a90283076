//! Error types for construction-time failures.
//!
//! Query misses and unavailable actions are not errors here: they surface as
//! `None`, an empty [`NodeSet`](crate::NodeSet) or `false`. This enum covers
//! the things a caller can get wrong up front (bad patterns, malformed
//! gestures, broken configuration) and host failures that cannot be expressed
//! as a plain boolean.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Platform error: {0}")]
    PlatformError(String),
}

impl From<regex::Error> for AutomationError {
    fn from(err: regex::Error) -> Self {
        AutomationError::InvalidSelector(err.to_string())
    }
}

impl From<serde_json::Error> for AutomationError {
    fn from(err: serde_json::Error) -> Self {
        AutomationError::ConfigError(err.to_string())
    }
}
