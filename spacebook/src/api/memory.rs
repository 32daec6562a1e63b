//! In-memory catalog and booking store for the demo binary and tests

use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, PoisonError};

use super::{ApiResult, BookingApi, SpaceCatalog};
use crate::error::ApiError;
use crate::types::{Booking, ConfirmedBooking, Space};

#[derive(Debug, Default)]
struct Inner {
    spaces: Vec<Space>,
    bookings: Vec<ConfirmedBooking>,
    reject_with: Option<String>,
}

/// Booking API backed by process memory
///
/// Clones share the same store.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBookingApi {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryBookingApi {
    /// Creates a store serving the given catalog
    #[must_use]
    pub fn new(spaces: Vec<Space>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                spaces,
                ..Inner::default()
            })),
        }
    }

    /// Reject every booking with this detail, as the API would (status 400)
    #[must_use]
    pub fn rejecting(self, detail: impl Into<String>) -> Self {
        self.lock().reject_with = Some(detail.into());
        self
    }

    /// Replace the catalog, e.g. to simulate a space being removed
    pub fn set_spaces(&self, spaces: Vec<Space>) {
        self.lock().spaces = spaces;
    }

    /// Bookings saved so far
    #[must_use]
    pub fn bookings(&self) -> Vec<ConfirmedBooking> {
        self.lock().bookings.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SpaceCatalog for InMemoryBookingApi {
    fn list_spaces(&self) -> BoxFuture<'static, ApiResult<Vec<Space>>> {
        let spaces = self.lock().spaces.clone();
        Box::pin(async move { Ok(spaces) })
    }
}

impl BookingApi for InMemoryBookingApi {
    fn create_booking(&self, booking: ConfirmedBooking) -> BoxFuture<'static, ApiResult<Booking>> {
        let result = {
            let mut inner = self.lock();
            match inner.reject_with.clone() {
                Some(detail) => Err(ApiError::rejected(400, detail)),
                None => {
                    let created = Booking {
                        id: inner.bookings.len() as u64 + 1,
                        event_name: booking.booking.event_name.clone(),
                        space: booking.booking.space,
                        status: Some("confirmed".into()),
                        transaction_id: Some(booking.transaction_id.clone()),
                    };
                    inner.bookings.push(booking);
                    Ok(created)
                },
            }
        };
        Box::pin(async move { result })
    }
}
