//! Payment dialog reducer.
//!
//! Drives the [`PaymentStep`] machine over a fixed amount. The booking form
//! embeds this reducer and listens for [`PaymentDelegate`] actions, which
//! report completion or cancellation back to it.

use spacebook_core::{async_effect, delay, effect::Effect, reducer::Reducer, smallvec, SmallVec};
use std::sync::Arc;
use std::time::Duration;

use super::gateway::{PaymentGateway, PaymentGatewayError, PaymentRequest};
use super::step::{PaymentEvent, PaymentStep};
use crate::notifications::{Notification, Notifier};
use crate::pricing::duration_label;
use crate::types::{Money, PaymentContact, PaymentMethod, PaymentResult, PendingBooking};
use crate::validation::is_email;

// ============================================================================
// State
// ============================================================================

/// Booking summary shown at the top of the dialog
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentSummary {
    /// Amount to pay
    pub total_amount: Money,
    /// Duration in words
    pub duration: String,
    /// Booked space
    pub space_name: String,
    /// Who is paying
    pub organizer_name: String,
}

/// Payment dialog state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentState {
    /// Read-only booking summary
    pub summary: PaymentSummary,
    /// Chosen method
    pub method: PaymentMethod,
    /// M-Pesa phone number as typed
    pub phone: String,
    /// `PayPal` email as typed
    pub email: String,
    /// Current step
    pub step: PaymentStep,
    /// Gateway confirmation, once received
    pub result: Option<PaymentResult>,
}

impl PaymentState {
    /// Open the dialog for a pending booking
    #[must_use]
    pub fn new(booking: &PendingBooking) -> Self {
        Self {
            summary: PaymentSummary {
                total_amount: booking.total_amount,
                duration: duration_label(booking.duration_days),
                space_name: booking.space_name.clone(),
                organizer_name: booking.organizer_name.clone(),
            },
            method: PaymentMethod::default(),
            phone: String::new(),
            email: String::new(),
            step: PaymentStep::default(),
            result: None,
        }
    }

    /// Contact for the chosen method
    #[must_use]
    pub fn contact(&self) -> PaymentContact {
        match self.method {
            PaymentMethod::Mpesa => PaymentContact::Phone(self.phone.trim().to_string()),
            PaymentMethod::Paypal => PaymentContact::Email(self.email.trim().to_string()),
        }
    }

    /// Whether the pay button is enabled
    #[must_use]
    pub fn can_pay(&self) -> bool {
        self.step == PaymentStep::EnteringDetails
            && match self.method {
                PaymentMethod::Mpesa => !self.phone.trim().is_empty(),
                PaymentMethod::Paypal => is_email(self.email.trim()),
            }
    }

    /// Whether the close button is disabled
    #[must_use]
    pub const fn close_disabled(&self) -> bool {
        self.step.blocks_close()
    }

    fn reset(&mut self) {
        self.method = PaymentMethod::default();
        self.phone.clear();
        self.email.clear();
        self.step = PaymentStep::default();
        self.result = None;
    }

    /// Apply a step event, logging and ignoring illegal ones
    fn advance(&mut self, event: PaymentEvent) -> bool {
        match self.step.transition(event) {
            Ok(next) => {
                tracing::debug!(from = %self.step, to = %next, "Payment step");
                self.step = next;
                true
            },
            Err(error) => {
                tracing::warn!(%error, "Ignoring payment action");
                false
            },
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Outcomes reported to the embedding reducer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentDelegate {
    /// Payment confirmed and the post-success pause is over
    Completed(PaymentResult),
    /// Dialog closed before any money moved
    Cancelled,
}

/// Payment dialog actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentAction {
    /// Choose a method (method selection only)
    SelectMethod(PaymentMethod),
    /// Go to detail entry
    Continue,
    /// Back to method selection
    Back,
    /// M-Pesa phone edited
    PhoneChanged(String),
    /// `PayPal` email edited
    EmailChanged(String),
    /// Start the charge
    Pay,
    /// Gateway confirmed
    Confirmed(PaymentResult),
    /// Gateway refused
    Declined {
        /// Why
        reason: String,
    },
    /// Gateway did not answer within the charge timeout
    TimedOut,
    /// Try again after a decline
    Retry,
    /// Post-success pause elapsed
    Finish,
    /// Close the dialog
    Close,
    /// Reported to the embedding reducer; no effect here
    Delegate(PaymentDelegate),
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the payment dialog
#[derive(Clone)]
pub struct PaymentEnvironment {
    /// Charges payments
    pub gateway: Arc<dyn PaymentGateway>,
    /// Shows decline messages
    pub notifier: Arc<dyn Notifier>,
    /// Pause between confirmation and reporting completion
    pub success_delay: Duration,
    /// Longest a charge may take
    pub charge_timeout: Duration,
}

// ============================================================================
// Reducer
// ============================================================================

/// Payment dialog reducer
#[derive(Clone, Copy, Debug, Default)]
pub struct PaymentReducer;

impl Reducer for PaymentReducer {
    type State = PaymentState;
    type Action = PaymentAction;
    type Environment = PaymentEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per dialog action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            PaymentAction::SelectMethod(method) => {
                if state.step == PaymentStep::SelectingMethod {
                    state.method = method;
                } else {
                    tracing::warn!(step = %state.step, "Ignoring method change outside method selection");
                }
                smallvec![Effect::None]
            },

            PaymentAction::Continue => {
                state.advance(PaymentEvent::Continue);
                smallvec![Effect::None]
            },

            PaymentAction::Back => {
                state.advance(PaymentEvent::Back);
                smallvec![Effect::None]
            },

            PaymentAction::Retry => {
                state.advance(PaymentEvent::Retry);
                smallvec![Effect::None]
            },

            PaymentAction::PhoneChanged(phone) => {
                if state.step.accepts_contact() {
                    state.phone = phone;
                }
                smallvec![Effect::None]
            },

            PaymentAction::EmailChanged(email) => {
                if state.step.accepts_contact() {
                    state.email = email;
                }
                smallvec![Effect::None]
            },

            PaymentAction::Pay => {
                if !state.can_pay() {
                    tracing::warn!(step = %state.step, method = %state.method, "Pay is disabled");
                    return smallvec![Effect::None];
                }
                state.advance(PaymentEvent::Pay);

                metrics::counter!("payment.attempts.total", "method" => state.method.to_string())
                    .increment(1);
                tracing::info!(
                    method = %state.method,
                    amount = state.summary.total_amount.cents(),
                    "Processing payment"
                );

                let gateway = Arc::clone(&env.gateway);
                let timeout = env.charge_timeout;
                let request = PaymentRequest {
                    method: state.method,
                    amount: state.summary.total_amount,
                    contact: state.contact(),
                };

                smallvec![async_effect! {
                    let charged = tokio::time::timeout(timeout, gateway.charge(request))
                        .await
                        .unwrap_or(Err(PaymentGatewayError::Timeout));
                    match charged {
                        Ok(result) => Some(PaymentAction::Confirmed(result)),
                        Err(PaymentGatewayError::Timeout) => Some(PaymentAction::TimedOut),
                        Err(error) => Some(PaymentAction::Declined {
                            reason: error.to_string(),
                        }),
                    }
                }]
            },

            PaymentAction::Confirmed(result) => {
                if !state.advance(PaymentEvent::Confirmed) {
                    return smallvec![Effect::None];
                }
                metrics::counter!("payment.confirmed.total").increment(1);
                tracing::info!(transaction_id = %result.transaction_id, "Payment confirmed");
                state.result = Some(result);

                smallvec![delay! {
                    duration: env.success_delay,
                    action: PaymentAction::Finish
                }]
            },

            PaymentAction::Declined { reason } => {
                if !state.advance(PaymentEvent::Declined {
                    reason: reason.clone(),
                }) {
                    return smallvec![Effect::None];
                }
                metrics::counter!("payment.declined.total").increment(1);
                tracing::warn!(%reason, "Payment declined");

                let notifier = Arc::clone(&env.notifier);
                smallvec![async_effect! {
                    notifier.notify(Notification::error(reason));
                    None
                }]
            },

            PaymentAction::TimedOut => {
                let reason = PaymentGatewayError::Timeout.to_string();
                if !state.advance(PaymentEvent::Declined { reason }) {
                    return smallvec![Effect::None];
                }
                metrics::counter!("payment.timeouts.total").increment(1);
                tracing::warn!(timeout = ?env.charge_timeout, "Payment timed out");

                // The charge may still land on the gateway side
                let notifier = Arc::clone(&env.notifier);
                smallvec![async_effect! {
                    notifier.notify(
                        Notification::warning(
                            "Payment timed out. If you were charged, contact support before paying again.",
                        )
                        .with_duration(Duration::from_secs(8)),
                    );
                    None
                }]
            },

            PaymentAction::Finish => {
                if !state.advance(PaymentEvent::Finish) {
                    return smallvec![Effect::None];
                }
                match state.result.clone() {
                    Some(result) => smallvec![async_effect! {
                        Some(PaymentAction::Delegate(PaymentDelegate::Completed(result)))
                    }],
                    None => {
                        tracing::error!("Payment finished without a confirmation");
                        smallvec![Effect::None]
                    },
                }
            },

            PaymentAction::Close => {
                if state.close_disabled() {
                    tracing::warn!(step = %state.step, "Close is disabled");
                    return smallvec![Effect::None];
                }
                state.reset();
                smallvec![async_effect! {
                    Some(PaymentAction::Delegate(PaymentDelegate::Cancelled))
                }]
            },

            PaymentAction::Delegate(_) => smallvec![Effect::None],
        }
    }
}
