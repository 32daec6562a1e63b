//! Reducer for the booking form.

use spacebook_core::{async_effect, delay, effect::Effect, reducer::Reducer, smallvec, SmallVec};
use std::sync::Arc;

use super::{BookingEnvironment, BookingFormAction, BookingFormState, FormStage};
use crate::error::{ApiError, BookingError};
use crate::navigation::Route;
use crate::notifications::Notification;
use crate::payment::{PaymentAction, PaymentDelegate, PaymentReducer, PaymentState};
use crate::types::{Booking, BookingDraft, DraftField, PaymentResult, PendingBooking, Space};
use crate::validation::ValidationErrors;

/// Shown when the catalog fetch fails without a usable detail
pub const SPACES_FETCH_FAILED: &str = "Failed to fetch spaces";

/// Shown when the catalog loads but has nothing in it
pub const NO_SPACES_AVAILABLE: &str = "No spaces are available to book right now";

/// Shown on the success panel
pub const BOOKING_SUCCEEDED: &str =
    "Booking and payment completed successfully! You will receive a confirmation email.";

/// Banner shown when the selected space vanished from the catalog
pub const SPACE_UNAVAILABLE: &str =
    "The selected space is no longer available. Please reselect a space.";

/// User-facing text for a booking that failed to save after payment
///
/// Always carries the transaction id so the payment can be reconciled.
#[must_use]
pub fn failed_after_payment_message(detail: Option<&str>, transaction_id: &str) -> String {
    let tail = format!(
        "Booking failed after payment. Please contact support with your transaction ID: {transaction_id}"
    );
    match detail {
        Some(detail) => format!("{detail}. {tail}"),
        None => tail,
    }
}

/// Reducer for the booking form.
///
/// Owns the draft, stages it for payment, embeds the [`PaymentReducer`]
/// while the dialog is open, and saves the paid booking exactly once.
#[derive(Clone, Copy, Debug, Default)]
pub struct BookingFormReducer;

impl BookingFormReducer {
    /// Create a new booking form reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn submit(
        state: &mut BookingFormState,
        env: &BookingEnvironment,
    ) -> SmallVec<[Effect<BookingFormAction>; 4]> {
        if state.submit_disabled() {
            tracing::warn!(
                in_flight = state.in_flight,
                capacity_exceeded = state.capacity_exceeded(),
                "Submit is disabled"
            );
            metrics::counter!("booking.submissions.rejected", "reason" => "disabled").increment(1);
            return smallvec![Effect::None];
        }
        metrics::counter!("booking.submissions.total").increment(1);

        state.banner = None;
        state.errors = state.validate(env.clock.today());
        if !state.errors.is_empty() {
            tracing::debug!(errors = state.errors.len(), "Draft is invalid");
            metrics::counter!("booking.submissions.rejected", "reason" => "invalid").increment(1);
            return smallvec![Effect::None];
        }

        match stage_booking(&state.draft, &state.spaces) {
            Ok(pending) => {
                tracing::info!(
                    space = %pending.space,
                    days = pending.duration_days,
                    total = %pending.total_amount,
                    "Booking staged for payment"
                );
                let payment = PaymentState::new(&pending);
                state.stage = FormStage::Payment { pending, payment };
            },
            Err(BookingError::SpaceNotFound(id)) => {
                tracing::warn!(space = %id, "Selected space is no longer in the catalog");
                metrics::counter!("booking.submissions.rejected", "reason" => "space_not_found")
                    .increment(1);
                state.banner = Some(SPACE_UNAVAILABLE.to_string());
                state
                    .errors
                    .insert(DraftField::SpaceId, "Please reselect a space");
            },
            Err(error) => {
                tracing::error!(%error, "Could not stage booking");
                state.banner = Some(error.to_string());
            },
        }
        smallvec![Effect::None]
    }

    fn payment(
        state: &mut BookingFormState,
        action: PaymentAction,
        env: &BookingEnvironment,
    ) -> SmallVec<[Effect<BookingFormAction>; 4]> {
        if !matches!(state.stage, FormStage::Payment { .. }) {
            tracing::warn!(?action, "Ignoring payment action outside the payment stage");
            return smallvec![Effect::None];
        }

        match action {
            PaymentAction::Delegate(PaymentDelegate::Completed(result)) => {
                let FormStage::Payment { pending, .. } = std::mem::take(&mut state.stage) else {
                    return smallvec![Effect::None];
                };
                Self::payment_completed(state, pending, &result, env)
            },
            PaymentAction::Delegate(PaymentDelegate::Cancelled) => {
                tracing::info!("Payment cancelled");
                state.stage = FormStage::Editing;
                smallvec![Effect::None]
            },
            action => {
                let FormStage::Payment { payment, .. } = &mut state.stage else {
                    return smallvec![Effect::None];
                };
                PaymentReducer
                    .reduce(payment, action, &env.payment)
                    .into_iter()
                    .map(|effect| effect.map(BookingFormAction::Payment))
                    .collect()
            },
        }
    }

    fn payment_completed(
        state: &mut BookingFormState,
        pending: PendingBooking,
        result: &PaymentResult,
        env: &BookingEnvironment,
    ) -> SmallVec<[Effect<BookingFormAction>; 4]> {
        let confirmed = pending.confirm(result);
        let transaction_id = confirmed.transaction_id.clone();
        tracing::info!(%transaction_id, "Payment completed, saving booking");

        state.stage = FormStage::Submitting {
            confirmed: confirmed.clone(),
        };
        state.in_flight = true;

        let bookings = Arc::clone(&env.bookings);
        smallvec![async_effect! {
            match bookings.create_booking(confirmed).await {
                Ok(booking) => Some(BookingFormAction::BookingCreated(booking)),
                Err(error) => Some(BookingFormAction::BookingFailed {
                    error,
                    transaction_id,
                }),
            }
        }]
    }

    fn booking_created(
        state: &mut BookingFormState,
        booking: &Booking,
        env: &BookingEnvironment,
    ) -> SmallVec<[Effect<BookingFormAction>; 4]> {
        if !matches!(state.stage, FormStage::Submitting { .. }) {
            tracing::warn!(booking_id = booking.id, "Ignoring booking result with nothing in flight");
            return smallvec![Effect::None];
        }
        metrics::counter!("booking.created.total").increment(1);
        tracing::info!(booking_id = booking.id, "Booking saved");

        state.in_flight = false;
        state.draft = BookingDraft::default();
        state.errors = ValidationErrors::new();
        state.banner = None;
        state.stage = FormStage::Succeeded {
            message: BOOKING_SUCCEEDED.to_string(),
        };

        let notifier = Arc::clone(&env.notifier);
        smallvec![
            async_effect! {
                notifier.notify(Notification::success(BOOKING_SUCCEEDED));
                None
            },
            delay! {
                duration: env.redirect_delay,
                action: BookingFormAction::RedirectElapsed
            },
        ]
    }

    fn booking_failed(
        state: &mut BookingFormState,
        error: &ApiError,
        transaction_id: &str,
        env: &BookingEnvironment,
    ) -> SmallVec<[Effect<BookingFormAction>; 4]> {
        if !matches!(state.stage, FormStage::Submitting { .. }) {
            tracing::warn!(%transaction_id, "Ignoring booking failure with nothing in flight");
            return smallvec![Effect::None];
        }
        metrics::counter!("booking.failed_after_payment.total").increment(1);
        tracing::error!(%error, %transaction_id, "Booking failed after payment");

        let message = failed_after_payment_message(error.detail(), transaction_id);

        // The paid booking is not retried; the user starts over.
        state.in_flight = false;
        state.draft = BookingDraft::default();
        state.errors = ValidationErrors::new();
        state.stage = FormStage::Editing;
        state.banner = Some(message.clone());

        let notifier = Arc::clone(&env.notifier);
        smallvec![async_effect! {
            notifier.notify(Notification::error(message));
            None
        }]
    }

    fn navigate(
        state: &BookingFormState,
        route: Route,
        env: &BookingEnvironment,
    ) -> SmallVec<[Effect<BookingFormAction>; 4]> {
        if !matches!(state.stage, FormStage::Succeeded { .. }) {
            tracing::warn!(%route, "Ignoring navigation before success");
            return smallvec![Effect::None];
        }
        let navigator = Arc::clone(&env.navigator);
        smallvec![async_effect! {
            navigator.navigate(route);
            None
        }]
    }
}

/// Resolve the selected space and snapshot the draft against it
fn stage_booking(draft: &BookingDraft, spaces: &[Space]) -> Result<PendingBooking, BookingError> {
    let id = draft
        .space_id
        .ok_or_else(|| BookingError::InvalidDraft("no space selected".into()))?;
    let space = spaces
        .iter()
        .find(|space| space.id == id)
        .ok_or(BookingError::SpaceNotFound(id))?;
    PendingBooking::build(draft, space)
}

/// Select the deep-linked space once the catalog has something in it
fn apply_prefill(state: &mut BookingFormState) {
    if state.spaces.is_empty() || state.stage != FormStage::Editing {
        return;
    }
    if let Some(id) = state.prefill.take() {
        tracing::debug!(space = %id, "Prefilling space");
        state.draft.space_id = Some(id);
        state.errors.remove(DraftField::SpaceId);
    }
}

impl Reducer for BookingFormReducer {
    type State = BookingFormState;
    type Action = BookingFormAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            BookingFormAction::LoadSpaces => {
                state.spaces_loading = true;
                let catalog = Arc::clone(&env.catalog);
                smallvec![async_effect! {
                    match catalog.list_spaces().await {
                        Ok(spaces) => Some(BookingFormAction::SpacesLoaded(spaces)),
                        Err(error) => {
                            tracing::warn!(%error, "Fetching spaces failed");
                            Some(BookingFormAction::SpacesLoadFailed {
                                detail: error.detail().unwrap_or(SPACES_FETCH_FAILED).to_string(),
                            })
                        },
                    }
                }]
            },

            BookingFormAction::SpacesLoaded(spaces) => {
                tracing::debug!(count = spaces.len(), "Spaces loaded");
                state.spaces_loading = false;
                state.spaces = spaces;
                apply_prefill(state);
                if !state.spaces.is_empty() {
                    return smallvec![Effect::None];
                }
                let notifier = Arc::clone(&env.notifier);
                smallvec![async_effect! {
                    notifier.notify(Notification::info(NO_SPACES_AVAILABLE));
                    None
                }]
            },

            BookingFormAction::SpacesLoadFailed { detail } => {
                state.spaces_loading = false;
                let notifier = Arc::clone(&env.notifier);
                smallvec![async_effect! {
                    notifier.notify(Notification::error(detail));
                    None
                }]
            },

            BookingFormAction::PrefillSpace(id) => {
                state.prefill = Some(id);
                apply_prefill(state);
                smallvec![Effect::None]
            },

            BookingFormAction::UpdateField(update) => {
                if state.stage != FormStage::Editing {
                    tracing::warn!(field = %update.field(), "Ignoring edit outside editing");
                    return smallvec![Effect::None];
                }
                state.errors.remove(update.field());
                update.apply(&mut state.draft);
                smallvec![Effect::None]
            },

            BookingFormAction::Submit => Self::submit(state, env),

            BookingFormAction::Payment(action) => Self::payment(state, action, env),

            BookingFormAction::BookingCreated(booking) => {
                Self::booking_created(state, &booking, env)
            },

            BookingFormAction::BookingFailed {
                error,
                transaction_id,
            } => Self::booking_failed(state, &error, &transaction_id, env),

            BookingFormAction::RedirectElapsed => Self::navigate(state, Route::Bookings, env),

            BookingFormAction::OpenDashboard => Self::navigate(state, Route::Dashboard, env),
        }
    }
}
