//! Viajar: synchronized UI-interaction engine for trip-planner E2E flows.
//!
//! Viajar (Spanish: "to travel") drives a web trip planner through a
//! browser automation seam and keeps flaky-UI handling in one place:
//! bounded waits over asynchronously rendered elements, page objects that
//! hide selectors behind domain-level actions, deferred soft assertions,
//! and a scenario lifecycle that always releases its browser session.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     VIAJAR Architecture                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌───────────┐  │
//! │  │ Scenario │──►│ TripPage │──►│   Wait   │──►│  Session  │  │
//! │  │ (steps + │   │ (domain  │   │  Engine  │   │  Driver   │  │
//! │  │  checks) │   │ actions) │   │ (bounded │   │ (CDP or   │  │
//! │  │          │   │          │   │  polls)  │   │  mock)    │  │
//! │  └──────────┘   └──────────┘   └──────────┘   └───────────┘  │
//! │       │                                                      │
//! │       └──► SoftAssert: checks recorded, one aggregate verdict│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure semantics
//!
//! A wait that runs out of budget is `TimedOut`, which boolean probes
//! collapse to `false`. A broken session (crashed browser, malformed
//! selector) is an error that aborts the scenario. Failed checks are
//! collected and raised once, together, at scenario end. The session is
//! released on every exit path.

#![warn(missing_docs)]

pub mod driver;
pub mod locator;
pub mod pages;
pub mod result;
pub mod scenario;
pub mod session;
pub mod soft_assert;
pub mod wait;

pub use driver::{ElementHandle, MockDriver, MockElement, SessionDriver};
pub use locator::{xpath_literal, Selector, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
pub use pages::{Page, TripPage};
pub use result::{ViajarError, ViajarResult};
pub use scenario::{Scenario, ScenarioReport, ScenarioState};
pub use session::{BrowserConfig, Session};
pub use soft_assert::{CheckRecord, SoftAssert};
pub use wait::{WaitCondition, WaitEngine, WaitOutcome};

/// Initialise tracing with the `RUST_LOG` env filter.
///
/// Intended for scenario entry points; safe to call once per process.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .try_init();
}
