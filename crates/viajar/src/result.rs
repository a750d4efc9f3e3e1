//! Result and error types for Viajar.
//!
//! The taxonomy deliberately keeps three distinct failure families:
//! a wait budget running out (`ConditionTimeout`), the browser session
//! becoming unusable (`SessionError` and friends), and deferred check
//! failures (`AssertionViolation`). Boolean probes on a page object
//! collapse only the first family to `false`; the other two always
//! propagate.

use thiserror::Error;

/// Result type for Viajar operations
pub type ViajarResult<T> = Result<T, ViajarError>;

/// Errors that can occur in Viajar
#[derive(Debug, Error)]
pub enum ViajarError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// The underlying browser session is unusable (crashed, disconnected,
    /// malformed selector). Fatal to the scenario; never converted to a
    /// boolean `false`.
    #[error("Session error: {message}")]
    SessionError {
        /// Error message
        message: String,
    },

    /// An always-present element was missing at page-object construction
    #[error("Element not found on page load: {selector}")]
    ElementMissing {
        /// Selector expression that matched nothing
        selector: String,
    },

    /// A wait's condition never became true within budget
    #[error("Condition not met within {ms}ms: {condition}")]
    ConditionTimeout {
        /// Description of the condition that was polled
        condition: String,
        /// Wait budget in milliseconds
        ms: u64,
    },

    /// One or more recorded checks failed, raised once at scenario end
    #[error("{} soft assertion(s) failed:\n{}", failures.len(), failures.join("\n"))]
    AssertionViolation {
        /// Descriptions of every failed check, in recording order
        failures: Vec<String>,
    },

    /// A scenario lifecycle method was called in the wrong state
    #[error("Invalid scenario state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ViajarError {
    /// Whether this error is fatal to the scenario.
    ///
    /// Timeouts are recoverable (a boolean probe turns them into `false`);
    /// everything else aborts the scenario because continuing would produce
    /// misleading assertion results.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::ConditionTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_recoverable() {
        let err = ViajarError::ConditionTimeout {
            condition: "visibility of //li".to_string(),
            ms: 5000,
        };
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_session_error_is_fatal() {
        let err = ViajarError::SessionError {
            message: "browser disconnected".to_string(),
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn test_assertion_violation_message_lists_all_failures() {
        let err = ViajarError::AssertionViolation {
            failures: vec![
                "Itinerary failed to be displayed!".to_string(),
                "Walking only trip failed to be displayed".to_string(),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 soft assertion(s) failed"));
        assert!(msg.contains("Itinerary failed"));
        assert!(msg.contains("Walking only trip"));
    }

    #[test]
    fn test_condition_timeout_message() {
        let err = ViajarError::ConditionTimeout {
            condition: "presence of button".to_string(),
            ms: 250,
        };
        assert!(err.to_string().contains("250ms"));
        assert!(err.to_string().contains("presence of button"));
    }
}
