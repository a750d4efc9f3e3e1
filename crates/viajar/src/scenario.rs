//! Scenario lifecycle orchestration.
//!
//! One scenario = one exclusively-owned session. The lifecycle is fixed:
//!
//! ```text
//! Idle -> SessionAcquired -> StepsRunning -> AssertionsEvaluated -> SessionReleased
//! ```
//!
//! Release is unconditional cleanup, not a success-only step: whatever the
//! steps or the deferred assertions do, the session is closed exactly once
//! before the outcome propagates. There is no separate "failed" terminal
//! state; a scenario that fails its checks still ends in
//! `SessionReleased` and the failure reaches the caller afterwards.

use std::time::{Duration, Instant};

use futures::future::BoxFuture;

use crate::result::ViajarResult;
use crate::session::Session;
use crate::soft_assert::SoftAssert;

/// Phase of a scenario's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    /// Nothing acquired yet
    Idle,
    /// The session navigated to its base URL
    SessionAcquired,
    /// Steps are executing against page objects
    StepsRunning,
    /// Deferred checks were evaluated
    AssertionsEvaluated,
    /// The session was closed; sole terminal state
    SessionReleased,
}

impl ScenarioState {
    /// The next phase in the lifecycle; terminal state is absorbing
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Idle => Self::SessionAcquired,
            Self::SessionAcquired => Self::StepsRunning,
            Self::StepsRunning => Self::AssertionsEvaluated,
            Self::AssertionsEvaluated | Self::SessionReleased => Self::SessionReleased,
        }
    }

    /// Whether this is the terminal state
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::SessionReleased)
    }
}

/// Summary of one completed scenario
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Wall-clock duration
    pub duration: Duration,
    /// Checks recorded during the scenario
    pub checks_total: usize,
    /// Checks that passed
    pub checks_passed: usize,
    /// Final lifecycle state; always `SessionReleased`
    pub final_state: ScenarioState,
}

/// Step closure: borrows the session and the check collector for the
/// duration of the steps phase.
pub type ScenarioSteps<'s> = BoxFuture<'s, ViajarResult<()>>;

/// One end-to-end scenario with its own session lifecycle.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
}

impl Scenario {
    /// Create a named scenario
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Scenario name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the scenario: open the session, execute the steps, evaluate
    /// the collected checks, release the session.
    ///
    /// The session is closed on every exit path. Exactly one acquire and
    /// one release happen per call; a step error or an aggregate
    /// assertion failure propagates only after release.
    pub async fn run<F>(&self, mut session: Session, steps: F) -> ViajarResult<ScenarioReport>
    where
        F: for<'s> FnOnce(&'s Session, &'s mut SoftAssert) -> ScenarioSteps<'s>,
    {
        tracing::info!(scenario = %self.name, base_url = %session.base_url(), "scenario starting");
        let started = Instant::now();
        let mut checks = SoftAssert::new();

        let outcome = Self::drive(&mut session, &mut checks, steps).await;

        // Unconditional release, before any error propagates.
        let release = session.close().await;

        let report = ScenarioReport {
            name: self.name.clone(),
            duration: started.elapsed(),
            checks_total: checks.len(),
            checks_passed: checks.passed_count(),
            final_state: ScenarioState::SessionReleased,
        };

        match &outcome {
            Ok(()) => tracing::info!(
                scenario = %self.name,
                checks = report.checks_total,
                "scenario passed"
            ),
            Err(e) => tracing::error!(scenario = %self.name, error = %e, "scenario failed"),
        }

        outcome?;
        release?;
        Ok(report)
    }

    async fn drive<F>(
        session: &mut Session,
        checks: &mut SoftAssert,
        steps: F,
    ) -> ViajarResult<()>
    where
        F: for<'s> FnOnce(&'s Session, &'s mut SoftAssert) -> ScenarioSteps<'s>,
    {
        // Idle -> SessionAcquired
        session.open().await?;
        // SessionAcquired -> StepsRunning
        steps(&*session, checks).await?;
        // StepsRunning -> AssertionsEvaluated
        checks.assert_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::locator::Selector;
    use crate::result::ViajarError;

    fn session_over(driver: MockDriver) -> Session {
        Session::new(Box::new(driver), "https://transitapp.com/en/trip")
    }

    mod state_machine_tests {
        use super::*;

        #[test]
        fn test_lifecycle_order() {
            let mut state = ScenarioState::Idle;
            let expected = [
                ScenarioState::SessionAcquired,
                ScenarioState::StepsRunning,
                ScenarioState::AssertionsEvaluated,
                ScenarioState::SessionReleased,
            ];
            for next in expected {
                state = state.next();
                assert_eq!(state, next);
            }
        }

        #[test]
        fn test_terminal_state_is_absorbing() {
            let state = ScenarioState::SessionReleased;
            assert!(state.is_terminal());
            assert_eq!(state.next(), ScenarioState::SessionReleased);
        }

        #[test]
        fn test_only_released_is_terminal() {
            assert!(!ScenarioState::Idle.is_terminal());
            assert!(!ScenarioState::AssertionsEvaluated.is_terminal());
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_passing_scenario_reports_and_releases() {
            let driver = MockDriver::new();
            let observer = driver.clone();

            let report = Scenario::new("happy path")
                .run(session_over(driver), |_session, soft| {
                    Box::pin(async move {
                        soft.check("itinerary displayed", true);
                        soft.check("walking trip displayed", true);
                        Ok(())
                    })
                })
                .await
                .unwrap();

            assert_eq!(report.name, "happy path");
            assert_eq!(report.checks_total, 2);
            assert_eq!(report.checks_passed, 2);
            assert!(report.final_state.is_terminal());
            assert_eq!(observer.close_count(), 1);
        }

        #[tokio::test]
        async fn test_failed_checks_propagate_after_release() {
            let driver = MockDriver::new();
            let observer = driver.clone();

            let err = Scenario::new("failing checks")
                .run(session_over(driver), |_session, soft| {
                    Box::pin(async move {
                        soft.check("first", false);
                        soft.check("second", false);
                        Ok(())
                    })
                })
                .await
                .unwrap_err();

            match err {
                ViajarError::AssertionViolation { failures } => {
                    assert_eq!(failures.len(), 2);
                }
                other => panic!("unexpected error: {other}"),
            }
            // release happened even though the aggregate failed
            assert!(observer.is_closed());
            assert_eq!(observer.close_count(), 1);
        }

        #[tokio::test]
        async fn test_step_error_still_releases_exactly_once() {
            let driver = MockDriver::new();
            let observer = driver.clone();

            let err = Scenario::new("broken step")
                .run(session_over(driver), |_session, _soft| {
                    Box::pin(async move {
                        Err(ViajarError::SessionError {
                            message: "browser crashed".to_string(),
                        })
                    })
                })
                .await
                .unwrap_err();

            assert!(matches!(err, ViajarError::SessionError { .. }));
            assert_eq!(observer.close_count(), 1);
        }

        #[tokio::test]
        async fn test_failed_acquisition_still_releases() {
            let driver = MockDriver::new();
            driver.inject_fault("cannot navigate");
            let observer = driver.clone();

            let err = Scenario::new("dead on arrival")
                .run(session_over(driver), |_session, _soft| {
                    Box::pin(async move { Ok(()) })
                })
                .await
                .unwrap_err();

            assert!(matches!(err, ViajarError::SessionError { .. }));
            assert_eq!(observer.close_count(), 1);
        }

        #[tokio::test]
        async fn test_exactly_one_acquire_per_run() {
            let driver = MockDriver::new();
            let observer = driver.clone();

            Scenario::new("single acquire")
                .run(session_over(driver), |_session, _soft| {
                    Box::pin(async move { Ok(()) })
                })
                .await
                .unwrap();

            let navigations = observer
                .history()
                .iter()
                .filter(|c| c.starts_with("navigate:"))
                .count();
            assert_eq!(navigations, 1);
        }

        #[tokio::test]
        async fn test_steps_see_the_open_session() {
            let driver = MockDriver::new();
            driver.add_element(MockElement::new(Selector::css("main")));

            Scenario::new("steps borrow session")
                .run(session_over(driver), |session, soft| {
                    Box::pin(async move {
                        let found = session
                            .driver()
                            .find_elements(&Selector::css("main"))
                            .await?;
                        soft.check("main rendered", !found.is_empty());
                        Ok(())
                    })
                })
                .await
                .unwrap();
        }
    }

    // The three trip-planner scenarios, end to end against a scripted
    // page. The same literals drive the real browser in
    // examples/trip_scenarios.rs.
    mod trip_scenario_tests {
        use super::*;
        use crate::pages::trip::{locators, TripPage};
        use std::time::Duration;

        const ORIGIN: &str = "5333 Casgrain Avenue, Montréal";
        const ORIGIN_SUGGESTION: &str = "5333 Casgrain Avenue";
        const DESTINATION: &str = "1321 Rue Ste-Catherine O, Montréal";
        const DESTINATION_SUGGESTION: &str = "1321 Saint-Catherine Street West";
        const OUT_OF_RANGE_CITY: &str = "Toronto";
        const OUT_OF_RANGE_MESSAGE: &str = "You're going too far!";

        fn scripted_planner() -> MockDriver {
            let driver = MockDriver::new();
            driver.add_element(MockElement::new(locators::origin_input()).with_tag("input"));
            driver
                .add_element(MockElement::new(locators::destination_input()).with_tag("input"));
            driver.add_element(MockElement::new(locators::options_button()).with_tag("span"));
            driver.add_element(
                MockElement::new(locators::suggestion(ORIGIN_SUGGESTION))
                    .with_text("5333 Casgrain Avenue, Montréal, QC")
                    .requires_typed("5333 Casgrain"),
            );
            driver.add_element(
                MockElement::new(locators::suggestion(DESTINATION_SUGGESTION))
                    .with_text(DESTINATION_SUGGESTION)
                    .requires_typed("1321 Rue Ste-Catherine"),
            );
            driver.add_element(
                MockElement::new(locators::suggestion(OUT_OF_RANGE_CITY))
                    .with_text(OUT_OF_RANGE_CITY)
                    .requires_typed(OUT_OF_RANGE_CITY),
            );
            driver
        }

        async fn fast_page(session: &Session) -> TripPage<'_> {
            TripPage::attach(session)
                .await
                .unwrap()
                .with_timeout(Duration::from_millis(60))
                .with_poll_interval(Duration::from_millis(10))
        }

        async fn plan_trip(
            page: &TripPage<'_>,
            destination: &str,
            suggestion: &str,
        ) -> ViajarResult<()> {
            page.enter_origin(ORIGIN).await?;
            page.select_suggestion(ORIGIN_SUGGESTION).await?;
            page.enter_destination(destination).await?;
            page.select_suggestion(suggestion).await?;
            Ok(())
        }

        #[tokio::test]
        async fn test_trip_search_happy_path() {
            let driver = scripted_planner();
            // itineraries render once a destination suggestion was picked
            driver.add_element(
                MockElement::new(locators::itinerary())
                    .requires_typed("1321 Rue Ste-Catherine")
                    .appears_after(1),
            );
            driver.add_element(
                MockElement::new(locators::walking_itinerary())
                    .with_text("Walk 25 min")
                    .requires_typed("1321 Rue Ste-Catherine"),
            );

            let report = Scenario::new("trip search")
                .run(session_over(driver), |session, soft| {
                    Box::pin(async move {
                        let page = fast_page(session).await;
                        plan_trip(&page, DESTINATION, DESTINATION_SUGGESTION).await?;
                        page.log_final_url().await?;
                        soft.check_result(
                            "Itinerary failed to be displayed!",
                            page.is_itinerary_displayed().await,
                        )?;
                        soft.check_result(
                            "Walking only trip failed to be displayed",
                            page.is_walking_displayed().await,
                        )?;
                        Ok(())
                    })
                })
                .await
                .unwrap();

            assert_eq!(report.checks_passed, 2);
        }

        #[tokio::test]
        async fn test_arrive_by_scenario() {
            let driver = scripted_planner();
            driver.add_element(MockElement::new(locators::departure_type_button()));
            driver.add_element(MockElement::new(locators::arrive_by_option()));
            driver.add_element(MockElement::new(locators::calendar_button()));
            driver.add_element(MockElement::new(locators::next_month_button()));
            driver.add_element(MockElement::new(locators::first_day_cell()).with_text("1"));
            driver.add_element(MockElement::new(locators::time_button()));
            driver.add_element(
                MockElement::new(locators::time_option("12:00 PM")).with_text("12:00 PM"),
            );
            driver.add_element(MockElement::new(locators::save_button()).with_text("Save"));
            for _ in 0..3 {
                driver.add_element(
                    MockElement::new(locators::result_options())
                        .requires_typed("1321 Rue Ste-Catherine"),
                );
            }

            let report = Scenario::new("arrive by")
                .run(session_over(driver), |session, soft| {
                    Box::pin(async move {
                        let page = fast_page(session).await;
                        plan_trip(&page, DESTINATION, DESTINATION_SUGGESTION).await?;
                        page.click_options().await?;
                        page.select_arrive_by().await?;
                        page.select_calendar().await?;
                        page.select_time("12:00 PM").await?;
                        page.save_options().await?;
                        page.log_final_url().await?;
                        soft.check_result(
                            "Number of transit options displayed is not correct!",
                            page.are_options_displayed(3).await,
                        )?;
                        Ok(())
                    })
                })
                .await
                .unwrap();

            assert_eq!(report.checks_passed, 1);
        }

        #[tokio::test]
        async fn test_out_of_range_scenario() {
            let driver = scripted_planner();
            driver.add_element(
                MockElement::new(locators::exact_text(OUT_OF_RANGE_MESSAGE))
                    .with_text(OUT_OF_RANGE_MESSAGE)
                    .requires_typed(OUT_OF_RANGE_CITY),
            );

            let report = Scenario::new("out of range trip")
                .run(session_over(driver), |session, soft| {
                    Box::pin(async move {
                        let page = fast_page(session).await;
                        plan_trip(&page, OUT_OF_RANGE_CITY, OUT_OF_RANGE_CITY).await?;
                        page.log_final_url().await?;
                        soft.check_result(
                            "Out of range error message is incorrect!",
                            page.is_error_message_displayed(OUT_OF_RANGE_MESSAGE).await,
                        )?;
                        Ok(())
                    })
                })
                .await
                .unwrap();

            assert_eq!(report.checks_passed, 1);
        }

        #[tokio::test]
        async fn test_trip_search_aggregate_failure_names_missing_check() {
            // no walking itinerary scripted: the walking check fails but
            // the itinerary check still records before the aggregate fires
            let driver = scripted_planner();
            driver.add_element(
                MockElement::new(locators::itinerary())
                    .requires_typed("1321 Rue Ste-Catherine"),
            );
            let observer = driver.clone();

            let err = Scenario::new("trip search")
                .run(session_over(driver), |session, soft| {
                    Box::pin(async move {
                        let page = fast_page(session).await;
                        plan_trip(&page, DESTINATION, DESTINATION_SUGGESTION).await?;
                        soft.check_result(
                            "Itinerary failed to be displayed!",
                            page.is_itinerary_displayed().await,
                        )?;
                        soft.check_result(
                            "Walking only trip failed to be displayed",
                            page.is_walking_displayed().await,
                        )?;
                        Ok(())
                    })
                })
                .await
                .unwrap_err();

            match err {
                ViajarError::AssertionViolation { failures } => {
                    assert_eq!(
                        failures,
                        vec!["Walking only trip failed to be displayed".to_string()]
                    );
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(observer.is_closed());
        }
    }

}
