//! Payment dialog steps and the transitions between them.
//!
//! | From | Event | To |
//! |---|---|---|
//! | selecting-method | continue | entering-details |
//! | entering-details | back | selecting-method |
//! | entering-details | pay | processing |
//! | processing | confirmed | succeeded |
//! | processing | declined | declined |
//! | declined | retry | entering-details |
//! | declined | back | selecting-method |
//! | succeeded | finish | finished |

use std::fmt;
use thiserror::Error;

/// Where the user is in the payment dialog
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PaymentStep {
    /// Choosing M-Pesa or `PayPal`
    #[default]
    SelectingMethod,
    /// Entering the phone number or email for the chosen method
    EnteringDetails,
    /// Waiting for the gateway; the dialog cannot be closed
    Processing,
    /// Gateway confirmed the payment; completion is reported after a pause
    Succeeded,
    /// Gateway refused the payment
    Declined {
        /// Why the gateway refused
        reason: String,
    },
    /// Completion has been handed back to the booking form
    Finished,
}

impl PaymentStep {
    /// Short name used in logs and errors
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SelectingMethod => "selecting-method",
            Self::EnteringDetails => "entering-details",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Declined { .. } => "declined",
            Self::Finished => "finished",
        }
    }

    /// Apply an event, rejecting anything the state table does not allow
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::Illegal`] for transitions not in the table.
    pub fn transition(&self, event: PaymentEvent) -> Result<Self, TransitionError> {
        match (self, event) {
            (Self::SelectingMethod, PaymentEvent::Continue)
            | (Self::Declined { .. }, PaymentEvent::Retry) => Ok(Self::EnteringDetails),
            (Self::EnteringDetails | Self::Declined { .. }, PaymentEvent::Back) => {
                Ok(Self::SelectingMethod)
            },
            (Self::EnteringDetails, PaymentEvent::Pay) => Ok(Self::Processing),
            (Self::Processing, PaymentEvent::Confirmed) => Ok(Self::Succeeded),
            (Self::Processing, PaymentEvent::Declined { reason }) => Ok(Self::Declined { reason }),
            (Self::Succeeded, PaymentEvent::Finish) => Ok(Self::Finished),
            (from, event) => Err(TransitionError::Illegal {
                from: from.name(),
                event: event.name(),
            }),
        }
    }

    /// Closing would abandon a payment that may already be committed
    #[must_use]
    pub const fn blocks_close(&self) -> bool {
        matches!(self, Self::Processing | Self::Succeeded | Self::Finished)
    }

    /// Contact details can be edited
    #[must_use]
    pub const fn accepts_contact(&self) -> bool {
        matches!(self, Self::EnteringDetails | Self::Declined { .. })
    }
}

impl fmt::Display for PaymentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs to the step machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentEvent {
    /// Method chosen, go to detail entry
    Continue,
    /// Back to method selection
    Back,
    /// Start the charge
    Pay,
    /// Gateway accepted
    Confirmed,
    /// Gateway refused
    Declined {
        /// Why
        reason: String,
    },
    /// Try again after a decline
    Retry,
    /// Post-success pause is over
    Finish,
}

impl PaymentEvent {
    /// Short name used in logs and errors
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Back => "back",
            Self::Pay => "pay",
            Self::Confirmed => "confirmed",
            Self::Declined { .. } => "declined",
            Self::Retry => "retry",
            Self::Finish => "finish",
        }
    }
}

/// A transition the state table does not allow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The event is not valid in the current step
    #[error("Cannot {event} while {from}")]
    Illegal {
        /// Current step
        from: &'static str,
        /// Rejected event
        event: &'static str,
    },
}
