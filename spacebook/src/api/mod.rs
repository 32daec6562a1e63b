//! External collaborators: the space catalog and booking persistence.
//!
//! Both are consumed through traits so the form reducer can run against the
//! HTTP API, the in-memory implementation, or a test double.

use futures::future::BoxFuture;

use crate::error::ApiError;
use crate::types::{Booking, ConfirmedBooking, Space};

mod http;
mod memory;

pub use http::HttpBookingApi;
pub use memory::InMemoryBookingApi;

/// API result
pub type ApiResult<T> = Result<T, ApiError>;

/// Source of bookable spaces
pub trait SpaceCatalog: Send + Sync {
    /// List every space
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the catalog cannot be fetched.
    fn list_spaces(&self) -> BoxFuture<'static, ApiResult<Vec<Space>>>;
}

/// Booking persistence
pub trait BookingApi: Send + Sync {
    /// Save a paid booking
    ///
    /// Called exactly once per confirmed booking; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the booking is rejected or the request fails.
    fn create_booking(&self, booking: ConfirmedBooking) -> BoxFuture<'static, ApiResult<Booking>>;
}
