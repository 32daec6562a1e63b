//! Unit tests for `BookingFormReducer`.
//!
//! These cover the whole booking workflow at the reducer level:
//! - Catalog loading and deep-link prefill
//! - Field edits and validation on submit
//! - Staging a booking for payment
//! - Payment completion, cancellation, and persistence outcomes
//! - Redirects after success

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use super::*;
use crate::api::{ApiResult, InMemoryBookingApi, SpaceCatalog};
use crate::config::Config;
use crate::error::ApiError;
use crate::navigation::{RecordingNavigator, Route};
use crate::notifications::{NotificationLevel, RecordingNotifier};
use crate::payment::{PaymentAction, PaymentDelegate, PaymentStep, SimulatedGateway};
use crate::types::{
    Booking, BookingDraft, DraftField, EventType, FieldUpdate, Money, PaymentContact,
    PaymentMethod, PaymentResult, Space, SpaceId,
};
use chrono::NaiveDate;
use futures::future::BoxFuture;
use spacebook_core::effect::Effect;
use spacebook_testing::{assertions, drive, test_clock, ReducerTest};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Fixtures
// ============================================================================

fn board_room() -> Space {
    Space {
        id: SpaceId::new(1),
        name: "Board Room".into(),
        location: "Nairobi".into(),
        capacity: 10,
        price_per_day: Money::from_cents(500_000),
    }
}

fn hall() -> Space {
    Space {
        id: SpaceId::new(2),
        name: "Main Hall".into(),
        location: "Nairobi".into(),
        capacity: 200,
        price_per_day: Money::from_cents(2_000_000),
    }
}

fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
}

/// The "Board Sync" draft: full day on 2025-06-10 for five people
fn board_sync() -> BookingDraft {
    BookingDraft {
        event_name: "Board Sync".into(),
        space_id: Some(SpaceId::new(1)),
        start_date: Some(june(10)),
        end_date: Some(june(10)),
        is_full_day: true,
        attendees: 5,
        organizer_name: "Jane".into(),
        organizer_email: "jane@x.com".into(),
        event_type: EventType::Meeting,
        ..BookingDraft::default()
    }
}

fn editing(draft: BookingDraft) -> BookingFormState {
    BookingFormState {
        draft,
        spaces: vec![board_room(), hall()],
        ..BookingFormState::default()
    }
}

struct Harness {
    env: BookingEnvironment,
    api: InMemoryBookingApi,
    notifier: RecordingNotifier,
    navigator: RecordingNavigator,
}

fn harness_with(api: InMemoryBookingApi) -> Harness {
    let notifier = RecordingNotifier::new();
    let navigator = RecordingNavigator::new();
    let clock = Arc::new(test_clock());
    let services = Services {
        catalog: Arc::new(api.clone()),
        bookings: Arc::new(api.clone()),
        gateway: SimulatedGateway::new(clock.clone(), Duration::ZERO).shared(),
        notifier: Arc::new(notifier.clone()),
        navigator: Arc::new(navigator.clone()),
    };
    Harness {
        env: BookingEnvironment::new(clock, services, &Config::default()),
        api,
        notifier,
        navigator,
    }
}

fn harness() -> Harness {
    harness_with(InMemoryBookingApi::new(vec![board_room(), hall()]))
}

fn pay(action: PaymentAction) -> BookingFormAction {
    BookingFormAction::Payment(action)
}

/// Submit the draft and walk the payment dialog through an M-Pesa payment
async fn submit_and_pay(
    state: &mut BookingFormState,
    env: &BookingEnvironment,
) -> Vec<BookingFormAction> {
    let reducer = BookingFormReducer::new();
    for action in [
        BookingFormAction::Submit,
        pay(PaymentAction::Continue),
        pay(PaymentAction::PhoneChanged("254712345678".into())),
    ] {
        drive(&reducer, state, action, env, 4).await;
    }
    drive(&reducer, state, pay(PaymentAction::Pay), env, 16).await
}

/// Catalog that always fails
struct BrokenCatalog(ApiError);

impl SpaceCatalog for BrokenCatalog {
    fn list_spaces(&self) -> BoxFuture<'static, ApiResult<Vec<Space>>> {
        let error = self.0.clone();
        Box::pin(async move { Err(error) })
    }
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn load_spaces_fills_the_catalog() {
    let h = harness();
    let mut state = BookingFormState::default();

    let actions = drive(&BookingFormReducer, &mut state, BookingFormAction::LoadSpaces, &h.env, 4).await;

    assert_eq!(actions, vec![BookingFormAction::SpacesLoaded(vec![board_room(), hall()])]);
    assert!(!state.spaces_loading);
    assert_eq!(state.spaces.len(), 2);
}

#[tokio::test]
async fn load_failure_notifies_with_the_api_detail() {
    let mut h = harness();
    h.env.catalog = Arc::new(BrokenCatalog(ApiError::rejected(503, "Catalog offline")));
    let mut state = BookingFormState::default();

    drive(&BookingFormReducer, &mut state, BookingFormAction::LoadSpaces, &h.env, 4).await;

    let sent = h.notifier.notifications();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].level, NotificationLevel::Error);
    assert_eq!(sent[0].message, "Catalog offline");
    assert!(state.spaces.is_empty());
    assert!(!state.spaces_loading);
}

#[tokio::test]
async fn load_failure_without_detail_uses_fallback_text() {
    let mut h = harness();
    h.env.catalog = Arc::new(BrokenCatalog(ApiError::Status {
        status: 500,
        detail: None,
    }));
    let mut state = BookingFormState::default();

    drive(&BookingFormReducer, &mut state, BookingFormAction::LoadSpaces, &h.env, 4).await;

    assert_eq!(h.notifier.notifications()[0].message, "Failed to fetch spaces");
}

#[tokio::test]
async fn empty_catalog_tells_the_user() {
    let mut h = harness();
    h.env.catalog = Arc::new(InMemoryBookingApi::new(Vec::new()));
    let mut state = BookingFormState::default();

    drive(&BookingFormReducer, &mut state, BookingFormAction::LoadSpaces, &h.env, 4).await;

    let sent = h.notifier.notifications();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].level, NotificationLevel::Info);
    assert_eq!(sent[0].message, NO_SPACES_AVAILABLE);
    assert!(!state.spaces_loading);
}

#[test]
fn prefill_waits_for_the_catalog() {
    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(BookingFormState::default())
        .given_actions([BookingFormAction::PrefillSpace(SpaceId::new(2))])
        .when_action(BookingFormAction::SpacesLoaded(vec![board_room(), hall()]))
        .then_state(|state| {
            assert_eq!(state.draft.space_id, Some(SpaceId::new(2)));
            assert_eq!(state.prefill, None);
        })
        .run();
}

#[test]
fn prefill_applies_immediately_when_catalog_is_loaded() {
    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(editing(BookingDraft::default()))
        .when_action(BookingFormAction::PrefillSpace(SpaceId::new(1)))
        .then_state(|state| assert_eq!(state.draft.space_id, Some(SpaceId::new(1))))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn prefill_is_held_while_catalog_is_empty() {
    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(BookingFormState::default())
        .when_action(BookingFormAction::PrefillSpace(SpaceId::new(1)))
        .then_state(|state| {
            assert_eq!(state.draft.space_id, None);
            assert_eq!(state.prefill, Some(SpaceId::new(1)));
        })
        .run();
}

// ============================================================================
// Editing and validation
// ============================================================================

#[test]
fn update_field_clears_only_that_fields_error() {
    let mut state = editing(BookingDraft::default());
    state.errors.insert(DraftField::EventName, "Event name is required");
    state.errors.insert(DraftField::OrganizerName, "Organizer name is required");

    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(state)
        .when_action(BookingFormAction::UpdateField(FieldUpdate::EventName("Offsite".into())))
        .then_state(|state| {
            assert_eq!(state.draft.event_name, "Offsite");
            assert_eq!(state.errors.get(DraftField::EventName), None);
            assert!(state.errors.get(DraftField::OrganizerName).is_some());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn submit_with_invalid_draft_reports_every_field() {
    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(editing(BookingDraft::default()))
        .when_action(BookingFormAction::Submit)
        .then_state(|state| {
            assert_eq!(state.stage, FormStage::Editing);
            assert_eq!(state.errors.get(DraftField::EventName), Some("Event name is required"));
            assert_eq!(state.errors.get(DraftField::SpaceId), Some("Space selection is required"));
            assert_eq!(state.errors.get(DraftField::StartTime), Some("Start time is required"));
            assert_eq!(
                state.errors.get(DraftField::OrganizerEmail),
                Some("Organizer email is required")
            );
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn end_date_before_start_date_is_rejected() {
    let draft = BookingDraft {
        start_date: Some(june(12)),
        end_date: Some(june(10)),
        ..board_sync()
    };

    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(editing(draft))
        .when_action(BookingFormAction::Submit)
        .then_state(|state| {
            assert_eq!(state.stage, FormStage::Editing);
            assert_eq!(
                state.errors.get(DraftField::EndDate),
                Some("End date cannot be before start date")
            );
        })
        .run();
}

#[test]
fn past_start_date_is_rejected_against_the_clock() {
    let draft = BookingDraft {
        start_date: NaiveDate::from_ymd_opt(2024, 12, 31),
        end_date: NaiveDate::from_ymd_opt(2024, 12, 31),
        ..board_sync()
    };

    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(editing(draft))
        .when_action(BookingFormAction::Submit)
        .then_state(|state| {
            assert_eq!(
                state.errors.get(DraftField::StartDate),
                Some("Start date cannot be in the past")
            );
        })
        .run();
}

// ============================================================================
// Staging
// ============================================================================

#[test]
fn valid_submit_opens_payment_with_the_total() {
    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(editing(board_sync()))
        .when_action(BookingFormAction::Submit)
        .then_state(|state| {
            assert!(state.errors.is_empty());
            let FormStage::Payment { pending, payment } = &state.stage else {
                panic!("expected payment stage, got {:?}", state.stage);
            };
            assert_eq!(pending.total_amount, Money::from_cents(500_000));
            assert_eq!(pending.duration_days, 1);
            assert_eq!(pending.space_name, "Board Room");
            assert_eq!(payment.step, PaymentStep::SelectingMethod);
            assert_eq!(payment.summary.organizer_name, "Jane");
            assert!(state.submit_disabled());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn over_capacity_blocks_submit() {
    let state = editing(BookingDraft {
        attendees: 15,
        ..board_sync()
    });
    assert!(state.capacity_exceeded());
    assert!(state.submit_disabled());
    assert_eq!(
        state.capacity_hint().as_deref(),
        Some("Exceeds space capacity of 10 people")
    );

    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(state)
        .when_action(BookingFormAction::Submit)
        .then_state(|state| {
            assert_eq!(state.stage, FormStage::Editing);
            assert!(state.payment().is_none());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[test]
fn vanished_space_asks_for_reselection() {
    let mut state = editing(BookingDraft {
        space_id: Some(SpaceId::new(9)),
        ..board_sync()
    });
    state.spaces = vec![hall()];

    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(state)
        .when_action(BookingFormAction::Submit)
        .then_state(|state| {
            assert_eq!(state.stage, FormStage::Editing);
            assert_eq!(
                state.banner.as_deref(),
                Some("The selected space is no longer available. Please reselect a space.")
            );
            assert_eq!(state.errors.get(DraftField::SpaceId), Some("Please reselect a space"));
        })
        .run();
}

#[test]
fn edits_are_ignored_while_paying() {
    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(editing(board_sync()))
        .given_actions([BookingFormAction::Submit])
        .when_action(BookingFormAction::UpdateField(FieldUpdate::Attendees(8)))
        .then_state(|state| {
            assert_eq!(state.draft.attendees, 5);
            assert!(matches!(state.stage, FormStage::Payment { .. }));
        })
        .run();
}

#[test]
fn payment_actions_outside_payment_are_ignored() {
    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(editing(board_sync()))
        .when_action(pay(PaymentAction::Continue))
        .then_state(|state| assert_eq!(state.stage, FormStage::Editing))
        .then_effects(assertions::assert_no_effects)
        .run();
}

#[tokio::test]
async fn cancelling_payment_returns_to_the_untouched_draft() {
    let h = harness();
    let mut state = editing(board_sync());

    drive(&BookingFormReducer, &mut state, BookingFormAction::Submit, &h.env, 4).await;
    let actions = drive(&BookingFormReducer, &mut state, pay(PaymentAction::Close), &h.env, 4).await;

    assert_eq!(actions, vec![pay(PaymentAction::Delegate(PaymentDelegate::Cancelled))]);
    assert_eq!(state.stage, FormStage::Editing);
    assert_eq!(state.draft, board_sync());
    assert!(!state.submit_disabled());
    assert!(h.api.bookings().is_empty());
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn paid_booking_is_saved_and_redirects() {
    let h = harness();
    let mut state = editing(board_sync());

    let actions = submit_and_pay(&mut state, &h.env).await;

    assert!(matches!(actions.last(), Some(BookingFormAction::RedirectElapsed)));
    assert_eq!(
        state.stage,
        FormStage::Succeeded {
            message: "Booking and payment completed successfully! You will receive a confirmation email."
                .into()
        }
    );
    assert_eq!(state.draft, BookingDraft::default());
    assert!(!state.in_flight);

    let saved = h.api.bookings();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].transaction_id, "TXN1735689600000");
    assert_eq!(saved[0].amount_paid, Money::from_cents(500_000));
    assert_eq!(saved[0].payment_method, PaymentMethod::Mpesa);
    assert_eq!(saved[0].booking.attendance, 5);

    let sent = h.notifier.notifications();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].level, NotificationLevel::Success);
    assert_eq!(h.navigator.routes(), vec![Route::Bookings]);
}

#[tokio::test]
async fn rejected_booking_names_the_transaction() {
    let h = harness_with(
        InMemoryBookingApi::new(vec![board_room(), hall()]).rejecting("duplicate booking"),
    );
    let mut state = editing(board_sync());

    submit_and_pay(&mut state, &h.env).await;

    let banner = state.banner.clone().unwrap();
    assert_eq!(
        banner,
        "duplicate booking. Booking failed after payment. Please contact support with your transaction ID: TXN1735689600000"
    );
    assert_eq!(state.stage, FormStage::Editing);
    assert_eq!(state.draft, BookingDraft::default());
    assert!(!state.in_flight);
    assert!(h.navigator.routes().is_empty());

    let sent = h.notifier.notifications();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].level, NotificationLevel::Error);
    assert_eq!(sent[0].message, banner);
}

#[test]
fn failure_message_without_detail_is_not_doubled() {
    assert_eq!(
        failed_after_payment_message(None, "TXN42"),
        "Booking failed after payment. Please contact support with your transaction ID: TXN42"
    );
}

#[test]
fn completion_marks_the_booking_in_flight() {
    let result = PaymentResult {
        method: PaymentMethod::Mpesa,
        transaction_id: "TXN7".into(),
        amount: Money::from_cents(500_000),
        contact: PaymentContact::Phone("254712345678".into()),
    };

    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(editing(board_sync()))
        .given_actions([BookingFormAction::Submit])
        .when_action(pay(PaymentAction::Delegate(PaymentDelegate::Completed(result))))
        .then_state(|state| {
            assert!(state.in_flight);
            assert!(state.submit_disabled());
            let FormStage::Submitting { confirmed } = &state.stage else {
                panic!("expected submitting, got {:?}", state.stage);
            };
            assert_eq!(confirmed.transaction_id, "TXN7");
        })
        .then_effects(assertions::assert_has_future_effect)
        .run();
}

#[test]
fn saved_booking_schedules_the_redirect() {
    let state = BookingFormState {
        stage: FormStage::Submitting {
            confirmed: crate::types::PendingBooking::build(&board_sync(), &board_room())
                .unwrap()
                .confirm(&PaymentResult {
                    method: PaymentMethod::Paypal,
                    transaction_id: "TXN9".into(),
                    amount: Money::from_cents(500_000),
                    contact: PaymentContact::Email("payer@example.com".into()),
                }),
        },
        in_flight: true,
        ..editing(board_sync())
    };
    let booking = Booking {
        id: 3,
        event_name: "Board Sync".into(),
        space: SpaceId::new(1),
        status: Some("confirmed".into()),
        transaction_id: Some("TXN9".into()),
    };

    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(state)
        .when_action(BookingFormAction::BookingCreated(booking))
        .then_effects(|effects| {
            assert_eq!(effects.len(), 2);
            assert!(matches!(effects[0], Effect::Future(_)));
            let action = assertions::assert_delay(effects, Duration::from_secs(2));
            assert_eq!(action, &BookingFormAction::RedirectElapsed);
        })
        .run();
}

#[test]
fn stray_booking_results_are_ignored() {
    ReducerTest::new(BookingFormReducer)
        .with_env(harness().env)
        .given_state(editing(board_sync()))
        .when_action(BookingFormAction::BookingFailed {
            error: ApiError::rejected(400, "late"),
            transaction_id: "TXN1".into(),
        })
        .then_state(|state| {
            assert_eq!(state.banner, None);
            assert_eq!(state.draft, board_sync());
        })
        .then_effects(assertions::assert_no_effects)
        .run();
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn dashboard_button_navigates_after_success() {
    let h = harness();
    let mut state = BookingFormState {
        stage: FormStage::Succeeded {
            message: "done".into(),
        },
        ..BookingFormState::default()
    };

    drive(&BookingFormReducer, &mut state, BookingFormAction::OpenDashboard, &h.env, 2).await;

    assert_eq!(h.navigator.routes(), vec![Route::Dashboard]);
}

#[tokio::test]
async fn redirect_is_ignored_before_success() {
    let h = harness();
    let mut state = editing(board_sync());

    drive(&BookingFormReducer, &mut state, BookingFormAction::RedirectElapsed, &h.env, 2).await;

    assert!(h.navigator.routes().is_empty());
}
