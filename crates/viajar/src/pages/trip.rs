//! Trip planner page object.
//!
//! Translates user-level intentions (enter an origin, pick a suggestion,
//! check the itinerary list) into bounded waits and actions against the
//! session. Boolean probes return `Ok(false)` when the condition never
//! held within budget; session faults always propagate as errors.

use std::time::Duration;

use crate::driver::ElementHandle;
use crate::locator::{Selector, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use crate::pages::Page;
use crate::result::{ViajarError, ViajarResult};
use crate::session::Session;
use crate::wait::{WaitCondition, WaitEngine, WaitOutcome};

/// Locator catalog for the trip planner screen.
///
/// Public so scenario code and scripted mocks can refer to the exact
/// selectors the page object resolves. Every locator that embeds runtime
/// text goes through [`xpath_literal`](crate::locator::xpath_literal).
pub mod locators {
    use crate::locator::{xpath_literal, Selector};

    /// Origin search input, present on page load
    #[must_use]
    pub fn origin_input() -> Selector {
        Selector::xpath("//input[@placeholder='Origin']")
    }

    /// Destination search input, present on page load
    #[must_use]
    pub fn destination_input() -> Selector {
        Selector::xpath("//input[@placeholder='Destination']")
    }

    /// Options button, present on page load
    #[must_use]
    pub fn options_button() -> Selector {
        Selector::xpath("//button//span[contains(text(),'Options')]")
    }

    /// Autocomplete list entry whose text contains `text`
    #[must_use]
    pub fn suggestion(text: &str) -> Selector {
        Selector::xpath(format!(
            "//li//*[contains(text(), {})]",
            xpath_literal(text)
        ))
    }

    /// Any proposed itinerary row
    #[must_use]
    pub fn itinerary() -> Selector {
        Selector::xpath("//div[@role='option']")
    }

    /// A walking-only itinerary row
    #[must_use]
    pub fn walking_itinerary() -> Selector {
        Selector::xpath("//div[contains(text(),'Walk')]")
    }

    /// Departure type toggle inside the options modal
    #[must_use]
    pub fn departure_type_button() -> Selector {
        Selector::xpath("//button[@aria-label='select departure type']")
    }

    /// The "arrive by" entry of the departure type menu
    #[must_use]
    pub fn arrive_by_option() -> Selector {
        Selector::xpath("//div[@data-key='arriveBy']")
    }

    /// Calendar opener inside the options modal
    #[must_use]
    pub fn calendar_button() -> Selector {
        Selector::xpath("//button[@aria-label='Calendar']")
    }

    /// Calendar "next month" control
    #[must_use]
    pub fn next_month_button() -> Selector {
        Selector::xpath("//button[@aria-label='next month']")
    }

    /// First day cell of the displayed month
    #[must_use]
    pub fn first_day_cell() -> Selector {
        Selector::xpath("(//table//*[contains(text(),'1')])[1]")
    }

    /// Time picker opener inside the options modal
    #[must_use]
    pub fn time_button() -> Selector {
        Selector::xpath("//button[@aria-label='select departure/arrival time']")
    }

    /// A time entry whose text contains `time` (e.g. "12:00 PM")
    #[must_use]
    pub fn time_option(time: &str) -> Selector {
        Selector::xpath(format!("//div[contains(text(), {})]", xpath_literal(time)))
    }

    /// The options modal save button
    #[must_use]
    pub fn save_button() -> Selector {
        Selector::xpath("//button[contains(text(), 'Save')]")
    }

    /// Transit options inside the first result section
    #[must_use]
    pub fn result_options() -> Selector {
        Selector::xpath(
            "(//section[@data-sentry-component='TripResultSection'])[1]//*[@role='option']",
        )
    }

    /// Any element whose text equals `text` exactly
    #[must_use]
    pub fn exact_text(text: &str) -> Selector {
        Selector::xpath(format!("//*[text()={}]", xpath_literal(text)))
    }
}

/// Façade over the trip planner screen.
///
/// Owns a borrowed reference to the scenario's session plus a wait budget;
/// stateless beyond that.
#[derive(Debug)]
pub struct TripPage<'a> {
    session: &'a Session,
    timeout: Duration,
    poll_interval: Duration,
    origin_input: ElementHandle,
    destination_input: ElementHandle,
    options_button: ElementHandle,
}

impl<'a> TripPage<'a> {
    /// Attach to the trip planner screen.
    ///
    /// Binds the three always-present elements (origin input, destination
    /// input, Options button) with a single no-wait resolution; a missing
    /// one is a hard error, not a timeout.
    pub async fn attach(session: &'a Session) -> ViajarResult<TripPage<'a>> {
        let origin_input = Self::bind(session, locators::origin_input()).await?;
        let destination_input = Self::bind(session, locators::destination_input()).await?;
        let options_button = Self::bind(session, locators::options_button()).await?;

        Ok(Self {
            session,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            origin_input,
            destination_input,
            options_button,
        })
    }

    async fn bind(session: &Session, selector: Selector) -> ViajarResult<ElementHandle> {
        session
            .driver()
            .find_elements(&selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ViajarError::ElementMissing {
                selector: selector.to_string(),
            })
    }

    /// Override the wait budget for this page's probes and actions
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

    fn engine(&self) -> WaitEngine<'_> {
        WaitEngine::new(self.session.driver())
            .with_timeout(self.timeout)
            .with_poll_interval(self.poll_interval)
    }

    /// Type the origin address.
    ///
    /// Must be followed by [`select_suggestion`](Self::select_suggestion)
    /// to complete the entry; the two calls are not atomic.
    pub async fn enter_origin(&self, text: &str) -> ViajarResult<()> {
        tracing::debug!(text, "entering origin");
        self.session.driver().type_text(&self.origin_input, text).await
    }

    /// Type the destination address. Same two-step protocol as
    /// [`enter_origin`](Self::enter_origin).
    pub async fn enter_destination(&self, text: &str) -> ViajarResult<()> {
        tracing::debug!(text, "entering destination");
        self.session
            .driver()
            .type_text(&self.destination_input, text)
            .await
    }

    /// Wait for an autocomplete entry containing `text` and activate it.
    ///
    /// Works for both search boxes. Returns `Ok(false)` when no matching
    /// suggestion appeared within budget, which is also what happens when
    /// no matching prefix was typed first.
    pub async fn select_suggestion(&self, text: &str) -> ViajarResult<bool> {
        let condition = WaitCondition::Visibility(locators::suggestion(text));
        match self.engine().poll(&condition).await? {
            WaitOutcome::Found(el) => {
                self.session.driver().click(&el).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Whether at least one proposed itinerary is displayed
    pub async fn is_itinerary_displayed(&self) -> ViajarResult<bool> {
        let outcome = self
            .engine()
            .poll(&WaitCondition::Visibility(locators::itinerary()))
            .await?;
        Ok(outcome.is_found())
    }

    /// Whether a walking-only itinerary is displayed
    pub async fn is_walking_displayed(&self) -> ViajarResult<bool> {
        let outcome = self
            .engine()
            .poll(&WaitCondition::Visibility(locators::walking_itinerary()))
            .await?;
        Ok(outcome.is_found())
    }

    /// Open the options modal.
    ///
    /// No wait and no fallback: the trigger was bound at attach time, so
    /// a failure here is a hard session error.
    pub async fn click_options(&self) -> ViajarResult<()> {
        self.session.driver().click(&self.options_button).await
    }

    /// Switch the planner to "arrive by"
    pub async fn select_arrive_by(&self) -> ViajarResult<()> {
        let engine = self.engine();
        let toggle = engine
            .require(&WaitCondition::Visibility(locators::departure_type_button()))
            .await?;
        self.session.driver().click(&toggle).await?;

        let arrive_by = engine
            .require(&WaitCondition::Clickable(locators::arrive_by_option()))
            .await?;
        self.session.driver().click(&arrive_by).await
    }

    /// Pick the first day of the next month in the calendar.
    ///
    /// Policy, not a calendar algorithm: "today" sometimes renders
    /// disabled, so the planner always advances one month and picks that
    /// month's first day. Keep this workaround as-is.
    pub async fn select_calendar(&self) -> ViajarResult<()> {
        let engine = self.engine();
        let calendar = engine
            .require(&WaitCondition::Visibility(locators::calendar_button()))
            .await?;
        self.session.driver().click(&calendar).await?;

        let next_month = engine
            .require(&WaitCondition::Visibility(locators::next_month_button()))
            .await?;
        self.session.driver().click(&next_month).await?;

        let first_day = engine
            .require(&WaitCondition::Visibility(locators::first_day_cell()))
            .await?;
        self.session.driver().click(&first_day).await
    }

    /// Pick a target time (e.g. "12:00 PM") in the time picker
    pub async fn select_time(&self, time: &str) -> ViajarResult<()> {
        let engine = self.engine();
        let opener = engine
            .require(&WaitCondition::Visibility(locators::time_button()))
            .await?;
        self.session.driver().click(&opener).await?;

        let entry = engine
            .require(&WaitCondition::Visibility(locators::time_option(time)))
            .await?;
        self.session.driver().click(&entry).await
    }

    /// Save the options modal
    pub async fn save_options(&self) -> ViajarResult<()> {
        let save = self
            .engine()
            .require(&WaitCondition::Visibility(locators::save_button()))
            .await?;
        self.session.driver().click(&save).await
    }

    /// Whether at least `min` transit options are visible in the first
    /// result section. Lower-bound check: extra results still pass.
    pub async fn are_options_displayed(&self, min: usize) -> ViajarResult<bool> {
        let outcome = self
            .engine()
            .poll(&WaitCondition::AllVisible(locators::result_options()))
            .await?;
        Ok(outcome.elements().len() >= min)
    }

    /// Whether an element with exactly this text is displayed
    pub async fn is_error_message_displayed(&self, text: &str) -> ViajarResult<bool> {
        let outcome = self
            .engine()
            .poll(&WaitCondition::Visibility(locators::exact_text(text)))
            .await?;
        Ok(outcome.is_found())
    }

    /// Log the current URL, before assertions run
    pub async fn log_final_url(&self) -> ViajarResult<()> {
        let url = self.session.current_url().await?;
        tracing::info!(page = self.name(), url = %url, "final URL");
        Ok(())
    }
}

impl Page for TripPage<'_> {
    fn name(&self) -> &'static str {
        "trip-planner"
    }
}
