//! Booking form actions

use crate::error::ApiError;
use crate::payment::PaymentAction;
use crate::types::{Booking, FieldUpdate, Space, SpaceId};

/// Booking form actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingFormAction {
    // Catalog
    /// Fetch the space catalog
    LoadSpaces,
    /// Catalog fetched
    SpacesLoaded(Vec<Space>),
    /// Catalog fetch failed
    SpacesLoadFailed {
        /// User-facing reason
        detail: String,
    },
    /// Pre-select a space from a deep link (`?space=<id>`)
    PrefillSpace(SpaceId),

    // Editing
    /// Change one draft field
    UpdateField(FieldUpdate),
    /// Validate and continue to payment
    Submit,

    // Payment
    /// Routed to the payment dialog
    Payment(PaymentAction),

    // Persistence
    /// The booking API saved the booking
    BookingCreated(Booking),
    /// The booking API rejected a paid booking
    BookingFailed {
        /// What the API reported
        error: ApiError,
        /// Transaction to reconcile
        transaction_id: String,
    },

    // Navigation
    /// Redirect delay after success elapsed
    RedirectElapsed,
    /// "View My Bookings" on the success panel
    OpenDashboard,
}
