//! Space booking - booking and payment workflow
//!
//! A user fills in a booking draft for a space from an external catalog, the
//! draft is validated and priced, a payment dialog takes the money, and the
//! paid booking is saved to the booking API exactly once.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐   PendingBooking    ┌────────────────────┐
//! │   Booking Form     │ ──────────────────▶ │   Payment Dialog   │
//! │     Reducer        │ ◀────────────────── │      Reducer       │
//! └────────────────────┘   PaymentResult     └────────────────────┘
//!          │                                          │
//!          │ ConfirmedBooking                         │ PaymentRequest
//!          ▼                                          ▼
//! ┌────────────────────┐                     ┌────────────────────┐
//! │    BookingApi      │                     │   PaymentGateway   │
//! │ (HTTP / in-memory) │                     │    (simulated)     │
//! └────────────────────┘                     └────────────────────┘
//! ```
//!
//! Both reducers are pure. Catalog fetches, charges, booking saves, toasts and
//! navigation are effects run by the [`Store`](spacebook_runtime::Store)
//! against services injected through [`BookingEnvironment`].
//!
//! # Key rules
//!
//! - Submit is disabled while the attendee count exceeds the selected space's
//!   capacity, even before validation runs.
//! - Duration rounds up to whole days with a floor of one day; the total is
//!   `price_per_day × days`.
//! - The payment dialog cannot be closed once a charge is in flight.
//! - A booking that fails to save after payment is never retried; the error
//!   carries the transaction id for reconciliation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod navigation;
pub mod notifications;
pub mod payment;
pub mod pricing;
pub mod types;
pub mod validation;

pub use api::{BookingApi, HttpBookingApi, InMemoryBookingApi, SpaceCatalog};
pub use config::Config;
pub use error::{ApiError, BookingError};
pub use form::{
    BookingEnvironment, BookingFormAction, BookingFormReducer, BookingFormState, FormStage,
    Services,
};
pub use navigation::{Navigator, Route};
pub use notifications::{Notification, NotificationLevel, Notifier};
pub use payment::{PaymentAction, PaymentGateway, PaymentReducer, PaymentStep, SimulatedGateway};
pub use types::*;
pub use validation::ValidationErrors;
