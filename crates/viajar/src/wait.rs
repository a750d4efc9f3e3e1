//! Bounded-wait engine for asynchronously rendered elements.
//!
//! The engine polls the driver until a [`WaitCondition`] holds or the
//! budget elapses. Two rules are load-bearing:
//!
//! - The selector is resolved fresh on every poll. No element handle is
//!   cached across retries, so a re-render between polls cannot poison
//!   the wait.
//! - "Condition never became true" and "the session broke" are different
//!   outcomes. The first is [`WaitOutcome::TimedOut`]; the second is an
//!   `Err` that propagates and aborts the scenario.

use std::time::Duration;

use tokio::time::Instant;

use crate::driver::{ElementHandle, SessionDriver};
use crate::locator::{Selector, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{ViajarError, ViajarResult};

/// Predicate over current page state, applied to a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// At least one element matches
    Presence(Selector),
    /// At least one match is visible
    Visibility(Selector),
    /// At least one match is visible and enabled
    Clickable(Selector),
    /// At least one match exists and every current match is visible;
    /// yields the full set so callers can apply a count threshold
    AllVisible(Selector),
}

impl WaitCondition {
    /// The selector this condition polls
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        match self {
            Self::Presence(s) | Self::Visibility(s) | Self::Clickable(s) | Self::AllVisible(s) => s,
        }
    }
}

impl std::fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Presence(s) => write!(f, "presence of {s}"),
            Self::Visibility(s) => write!(f, "visibility of {s}"),
            Self::Clickable(s) => write!(f, "clickability of {s}"),
            Self::AllVisible(s) => write!(f, "visibility of all {s}"),
        }
    }
}

/// Outcome of a bounded wait
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    /// The condition held; the first satisfying element
    Found(ElementHandle),
    /// The `AllVisible` condition held; every current match
    FoundAll(Vec<ElementHandle>),
    /// The condition never became true within budget. Not an error:
    /// boolean probes collapse this to `false`.
    TimedOut,
}

impl WaitOutcome {
    /// Whether the condition held
    #[must_use]
    pub const fn is_found(&self) -> bool {
        !matches!(self, Self::TimedOut)
    }

    /// The matched elements, empty on timeout
    #[must_use]
    pub fn elements(self) -> Vec<ElementHandle> {
        match self {
            Self::Found(el) => vec![el],
            Self::FoundAll(els) => els,
            Self::TimedOut => Vec::new(),
        }
    }
}

/// Bounded-retry resolver for wait conditions.
///
/// Borrows the session's driver for the duration of one wait; the default
/// budget is 5 seconds with a 100ms poll interval, both overridable per
/// engine.
#[derive(Clone, Copy)]
pub struct WaitEngine<'a> {
    driver: &'a dyn SessionDriver,
    timeout: Duration,
    poll_interval: Duration,
}

impl std::fmt::Debug for WaitEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitEngine")
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl<'a> WaitEngine<'a> {
    /// Create an engine with default timeout and poll interval
    #[must_use]
    pub fn new(driver: &'a dyn SessionDriver) -> Self {
        Self {
            driver,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Override the wait budget
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The configured wait budget
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll until the condition holds or the budget elapses.
    ///
    /// The condition is checked at least once even with a zero budget.
    /// Driver errors propagate immediately; they are never converted to
    /// `TimedOut`.
    pub async fn poll(&self, condition: &WaitCondition) -> ViajarResult<WaitOutcome> {
        let deadline = Instant::now() + self.timeout;
        loop {
            let elements = self.driver.find_elements(condition.selector()).await?;
            if let Some(outcome) = evaluate(condition, elements) {
                return Ok(outcome);
            }
            if Instant::now() >= deadline {
                tracing::debug!(condition = %condition, "wait timed out");
                return Ok(WaitOutcome::TimedOut);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Poll and require a single satisfying element.
    ///
    /// For wait-then-act steps where absence is a hard failure; a timeout
    /// becomes [`ViajarError::ConditionTimeout`].
    pub async fn require(&self, condition: &WaitCondition) -> ViajarResult<ElementHandle> {
        match self.poll(condition).await? {
            WaitOutcome::Found(el) => Ok(el),
            WaitOutcome::FoundAll(mut els) if !els.is_empty() => Ok(els.remove(0)),
            _ => Err(ViajarError::ConditionTimeout {
                condition: condition.to_string(),
                ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

/// Evaluate a condition against one fresh resolution.
///
/// `None` means "not yet"; the engine keeps polling.
fn evaluate(condition: &WaitCondition, elements: Vec<ElementHandle>) -> Option<WaitOutcome> {
    match condition {
        WaitCondition::Presence(_) => elements.into_iter().next().map(WaitOutcome::Found),
        WaitCondition::Visibility(_) => elements
            .into_iter()
            .find(|el| el.visible)
            .map(WaitOutcome::Found),
        WaitCondition::Clickable(_) => elements
            .into_iter()
            .find(ElementHandle::is_clickable)
            .map(WaitOutcome::Found),
        WaitCondition::AllVisible(_) => {
            if !elements.is_empty() && elements.iter().all(|el| el.visible) {
                Some(WaitOutcome::FoundAll(elements))
            } else {
                None
            }
        }
    }
}
