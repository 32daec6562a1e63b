//! Space booking demo binary
//!
//! Runs one booking through the whole workflow: load the catalog, fill in a
//! draft, submit, pay with M-Pesa, and save the booking.
//!
//! Set `SPACEBOOK_API_URL` to run against a real booking API; otherwise an
//! in-memory API seeded with two spaces is used.

use anyhow::{bail, Context};
use chrono::Days;
use spacebook::form::reducer::BOOKING_SUCCEEDED;
use spacebook::form::{
    failed_after_payment_message, BookingEnvironment, BookingFormAction, BookingFormReducer,
    BookingFormState, Services,
};
use spacebook::navigation::TracingNavigator;
use spacebook::notifications::TracingNotifier;
use spacebook::payment::{PaymentAction, SimulatedGateway};
use spacebook::types::{EventType, FieldUpdate, Money, Space, SpaceId};
use spacebook::{Config, HttpBookingApi, InMemoryBookingApi};
use spacebook_core::environment::{Clock, SystemClock};
use spacebook_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long to wait for the catalog and booking API
const API_TIMEOUT: Duration = Duration::from_secs(10);

fn seed_spaces() -> Vec<Space> {
    vec![
        Space {
            id: SpaceId::new(1),
            name: "Board Room".into(),
            location: "Westlands, Nairobi".into(),
            capacity: 10,
            price_per_day: Money::from_cents(500_000),
        },
        Space {
            id: SpaceId::new(2),
            name: "Conference Hall".into(),
            location: "Upper Hill, Nairobi".into(),
            capacity: 120,
            price_per_day: Money::from_cents(2_500_000),
        },
    ]
}

fn build_services(config: &Config, clock: Arc<dyn Clock>) -> Services {
    let gateway = SimulatedGateway::new(clock, config.confirmation_delay()).shared();
    let notifier = TracingNotifier::shared();
    let navigator = Arc::new(TracingNavigator);

    if let Some(base_url) = &config.api.base_url {
        tracing::info!(%base_url, "Using booking API");
        let mut api = HttpBookingApi::new(base_url.as_str());
        if let Some(token) = &config.api.token {
            api = api.with_token(token.as_str());
        }
        let api = Arc::new(api);
        Services {
            catalog: api.clone(),
            bookings: api,
            gateway,
            notifier,
            navigator,
        }
    } else {
        tracing::info!("SPACEBOOK_API_URL not set, using in-memory booking API");
        let api = Arc::new(InMemoryBookingApi::new(seed_spaces()));
        Services {
            catalog: api.clone(),
            bookings: api,
            gateway,
            notifier,
            navigator,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("spacebook={0},spacebook_runtime={0}", config.runtime.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    spacebook_runtime::metrics::describe();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let services = build_services(&config, Arc::clone(&clock));
    let env = BookingEnvironment::new(Arc::clone(&clock), services, &config);
    let store = Store::new(BookingFormState::default(), BookingFormReducer::new(), env);

    println!("=== Space Booking Demo ===\n");

    // Catalog; the handle resolves once the fetched list has been reduced
    store
        .send(BookingFormAction::LoadSpaces)
        .await?
        .wait_with_timeout(API_TIMEOUT)
        .await?;
    let Some(space) = store.state(|s| s.spaces.first().cloned()).await else {
        bail!("No spaces available to book");
    };
    println!(
        "Booking {} ({}, up to {} people, {} per day)",
        space.name, space.location, space.capacity, space.price_per_day
    );

    // Draft: a full-day workshop one week from today
    let day = clock
        .today()
        .checked_add_days(Days::new(7))
        .context("date out of range")?;
    for update in [
        FieldUpdate::EventName("Quarterly Planning".into()),
        FieldUpdate::Space(Some(space.id)),
        FieldUpdate::StartDate(Some(day)),
        FieldUpdate::EndDate(Some(day)),
        FieldUpdate::FullDay(true),
        FieldUpdate::Attendees(space.capacity.min(8)),
        FieldUpdate::OrganizerName("Jane Wanjiku".into()),
        FieldUpdate::OrganizerEmail("jane@example.com".into()),
        FieldUpdate::EventType(EventType::Workshop),
    ] {
        store.send(BookingFormAction::UpdateField(update)).await?;
    }

    store.send(BookingFormAction::Submit).await?;
    let (errors, summary) = store
        .state(|s| (s.errors.clone(), s.payment().map(|p| p.summary.clone())))
        .await;
    let Some(summary) = summary else {
        for (field, message) in errors.iter() {
            println!("  {field}: {message}");
        }
        bail!("Draft was rejected");
    };
    println!("Total due: {} for {}", summary.total_amount, summary.duration);

    // Payment
    store.send(BookingFormAction::Payment(PaymentAction::Continue)).await?;
    store
        .send(BookingFormAction::Payment(PaymentAction::PhoneChanged("254712345678".into())))
        .await?;

    println!("Paying via M-Pesa...");
    let outcome = store
        .send_and_wait_for(
            BookingFormAction::Payment(PaymentAction::Pay),
            |a| {
                matches!(
                    a,
                    BookingFormAction::BookingCreated(_)
                        | BookingFormAction::BookingFailed { .. }
                        | BookingFormAction::Payment(
                            PaymentAction::Declined { .. } | PaymentAction::TimedOut
                        )
                )
            },
            config.confirmation_delay() + config.success_delay() + API_TIMEOUT,
        )
        .await?;

    match outcome {
        BookingFormAction::BookingCreated(booking) => {
            println!("Booking #{} saved. {BOOKING_SUCCEEDED}", booking.id);
        },
        BookingFormAction::BookingFailed {
            error,
            transaction_id,
        } => {
            println!("{}", failed_after_payment_message(error.detail(), &transaction_id));
        },
        BookingFormAction::Payment(PaymentAction::Declined { reason }) => {
            println!("Payment declined: {reason}");
        },
        BookingFormAction::Payment(PaymentAction::TimedOut) => {
            println!("Payment timed out");
        },
        other => bail!("Unexpected outcome: {other:?}"),
    }

    // Lets the redirect fire
    store.shutdown(config.shutdown_timeout()).await?;
    println!("\n=== Demo complete ===");
    Ok(())
}
