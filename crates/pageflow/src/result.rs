//! Result and error types for pageflow.
//!
//! The harness performs no recovery: every variant here is surfaced to the
//! calling test as the sole signal of failure.

use std::time::Duration;

use thiserror::Error;

use crate::locator::Locator;
use crate::wait::ConditionKind;

/// Result type for pageflow operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can occur while driving a page
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A wait predicate never held within the allotted time
    #[error("timed out after {}ms waiting for {condition} on {}", .elapsed.as_millis(), describe_target(.locator.as_ref()))]
    Timeout {
        /// Condition that was polled
        condition: ConditionKind,
        /// Target locator, absent for page-level conditions
        locator: Option<Locator>,
        /// Time spent polling
        elapsed: Duration,
    },

    /// The driver refused an interaction because the element is not interactable
    #[error("element {locator} is not interactable: {reason}")]
    NotInteractable {
        /// Locator the handle was resolved from
        locator: Locator,
        /// Driver-reported reason
        reason: String,
    },

    /// No dropdown option carries the requested visible text
    #[error("no option with visible text {text:?} in {locator}")]
    OptionNotFound {
        /// Locator of the select element
        locator: Locator,
        /// Requested option text
        text: String,
    },

    /// A resolved handle no longer refers to a live DOM node
    #[error("stale element reference for {locator}")]
    StaleReference {
        /// Locator the handle was resolved from
        locator: Locator,
    },

    /// Locator resolution matched nothing
    #[error("no element matches {locator}")]
    NoSuchElement {
        /// Locator that was applied
        locator: Locator,
    },

    /// Element has a different tag than the operation requires
    #[error("expected <{expected}> for {locator}, found <{actual}>")]
    UnexpectedTag {
        /// Locator the handle was resolved from
        locator: Locator,
        /// Tag the operation requires
        expected: String,
        /// Tag the element actually has
        actual: String,
    },

    /// Script execution failed inside the page
    #[error("script execution failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Generic driver failure (transport, protocol)
    #[error("driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Invalid configuration or misuse of the wait API
    #[error("configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// Check whether this is a wait timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check whether this is a stale reference failure
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleReference { .. })
    }

    /// Elapsed wait time, for timeouts only
    #[must_use]
    pub const fn elapsed(&self) -> Option<Duration> {
        match self {
            Self::Timeout { elapsed, .. } => Some(*elapsed),
            _ => None,
        }
    }

    pub(crate) fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

fn describe_target(locator: Option<&Locator>) -> String {
    locator.map_or_else(|| "page".to_string(), ToString::to_string)
}
