//! Booking form: draft editing, validation, staging, and persistence.
//!
//! The form owns the [`BookingDraft`](crate::types::BookingDraft) until it
//! validates, then stages a [`PendingBooking`](crate::types::PendingBooking)
//! and opens the payment dialog by embedding the
//! [`PaymentReducer`](crate::payment::PaymentReducer).
//!
//! ```text
//! Editing ──Submit (valid)──▶ Payment ──Completed──▶ Submitting ──created──▶ Succeeded
//!    ▲                          │                        │                      │
//!    └────────Cancelled─────────┘                        │               redirect delay
//!    ▲                                                   │                      ▼
//!    └──────── failed after payment (banner + txn id) ───┘                /bookings
//! ```
//!
//! The paid booking is saved exactly once. If the API rejects it, the error
//! names the transaction id and the user starts over.

pub mod actions;
pub mod environment;
pub mod reducer;
pub mod state;
#[cfg(test)]
mod tests;

pub use actions::BookingFormAction;
pub use environment::{BookingEnvironment, Services};
pub use reducer::{failed_after_payment_message, BookingFormReducer, NO_SPACES_AVAILABLE};
pub use state::{BookingFormState, FormStage};
