//! The three trip-planner scenarios against the live site.
//!
//! Run with: `cargo run --example trip_scenarios --features browser`
//!
//! Each scenario acquires its own browser session, drives the planner
//! through the page object, and aggregates its checks; the process exits
//! non-zero if any scenario failed.

use viajar::pages::trip::TripPage;
use viajar::{
    BrowserConfig, Scenario, Session, ViajarError, ViajarResult, DEFAULT_TIMEOUT_MS,
};

const BASE_URL: &str = "https://transitapp.com/en/trip";
const ORIGIN: &str = "5333 Casgrain Avenue, Montréal";
const ORIGIN_SUGGESTION: &str = "5333 Casgrain Avenue";
const DESTINATION: &str = "1321 Rue Ste-Catherine O, Montréal";
const DESTINATION_SUGGESTION: &str = "1321 Saint-Catherine Street West";
const OUT_OF_RANGE_CITY: &str = "Toronto";
const OUT_OF_RANGE_MESSAGE: &str = "You're going too far!";

async fn acquire() -> ViajarResult<Session> {
    Session::launch(BrowserConfig::default(), BASE_URL).await
}

/// Type-then-select for both endpoints. A suggestion that never shows up
/// is a hard failure here, same as any other missing element.
async fn plan_trip(
    page: &TripPage<'_>,
    destination: &str,
    suggestion: &str,
) -> ViajarResult<()> {
    page.enter_origin(ORIGIN).await?;
    require_suggestion(page, ORIGIN_SUGGESTION).await?;
    page.enter_destination(destination).await?;
    require_suggestion(page, suggestion).await?;
    Ok(())
}

async fn require_suggestion(page: &TripPage<'_>, text: &str) -> ViajarResult<()> {
    if page.select_suggestion(text).await? {
        Ok(())
    } else {
        Err(ViajarError::ConditionTimeout {
            condition: format!("suggestion containing {text:?}"),
            ms: DEFAULT_TIMEOUT_MS,
        })
    }
}

async fn trip_search() -> ViajarResult<()> {
    let session = acquire().await?;
    Scenario::new("trip search")
        .run(session, |session, soft| {
            Box::pin(async move {
                let page = TripPage::attach(session).await?;
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
        .map(|_| ())
}

async fn arrive_by() -> ViajarResult<()> {
    let session = acquire().await?;
    Scenario::new("arrive by")
        .run(session, |session, soft| {
            Box::pin(async move {
                let page = TripPage::attach(session).await?;
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
        .map(|_| ())
}

async fn out_of_range_trip() -> ViajarResult<()> {
    let session = acquire().await?;
    Scenario::new("out of range trip")
        .run(session, |session, soft| {
            Box::pin(async move {
                let page = TripPage::attach(session).await?;
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
        .map(|_| ())
}

#[tokio::main]
async fn main() {
    viajar::init_tracing();

    let results = [
        ("trip search", trip_search().await),
        ("arrive by", arrive_by().await),
        ("out of range trip", out_of_range_trip().await),
    ];

    let mut failed = 0;
    for (name, result) in results {
        match result {
            Ok(()) => println!("PASS {name}"),
            Err(error) => {
                eprintln!("FAIL {name}: {error}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("{failed} scenario(s) failed");
        std::process::exit(1);
    }
    println!("all scenarios passed");
}
