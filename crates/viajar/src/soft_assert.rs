//! Deferred assertion collection.
//!
//! A scenario performs several independent checks; none of them stops
//! execution on failure. The collector records every outcome and raises
//! a single aggregate failure at scenario end, so one broken verification
//! never hides the others.

use crate::result::{ViajarError, ViajarResult};

/// One recorded check. Append-only; lives for one scenario execution.
#[derive(Debug, Clone)]
pub struct CheckRecord {
    /// What was verified
    pub description: String,
    /// Whether the check passed
    pub passed: bool,
}

/// Accumulates check outcomes without halting execution.
#[derive(Debug, Default)]
pub struct SoftAssert {
    records: Vec<CheckRecord>,
    evaluated: bool,
}

impl SoftAssert {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one check outcome. Never halts, whatever `passed` is.
    pub fn check(&mut self, description: impl Into<String>, passed: bool) {
        let description = description.into();
        if passed {
            tracing::debug!(check = %description, "check passed");
        } else {
            tracing::warn!(check = %description, "check failed");
        }
        self.records.push(CheckRecord {
            description,
            passed,
        });
    }

    /// Record a check that passes iff `result` is `Ok(true)`.
    ///
    /// A fatal error short-circuits instead of being recorded: a broken
    /// session must abort the scenario, not masquerade as a failed check.
    pub fn check_result(
        &mut self,
        description: impl Into<String>,
        result: ViajarResult<bool>,
    ) -> ViajarResult<()> {
        match result {
            Ok(passed) => {
                self.check(description, passed);
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(_) => {
                self.check(description, false);
                Ok(())
            }
        }
    }

    /// Number of recorded checks
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of passed checks
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.records.iter().filter(|r| r.passed).count()
    }

    /// The recorded checks, in recording order
    #[must_use]
    pub fn records(&self) -> &[CheckRecord] {
        &self.records
    }

    /// Whether `assert_all` has already run
    #[must_use]
    pub const fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    /// Evaluate every recorded check. Called exactly once, at scenario
    /// end, after all `check` calls.
    ///
    /// Fails iff at least one record failed; the error lists every failed
    /// description in recording order.
    pub fn assert_all(&mut self) -> ViajarResult<()> {
        if self.evaluated {
            return Err(ViajarError::InvalidState {
                message: "assert_all called more than once in a scenario".to_string(),
            });
        }
        self.evaluated = true;

        let failures: Vec<String> = self
            .records
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.description.clone())
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ViajarError::AssertionViolation { failures })
        }
    }
}
