//! Environment dependencies for the booking form reducer.

use spacebook_core::environment::Clock;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{BookingApi, SpaceCatalog};
use crate::config::Config;
use crate::navigation::Navigator;
use crate::notifications::Notifier;
use crate::payment::{PaymentEnvironment, PaymentGateway};

/// Environment dependencies for the booking form reducer.
///
/// Production wires the HTTP API and `SystemClock`; tests use the in-memory
/// API, recording services and `FixedClock`.
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Source of "today" for the past-date rule
    pub clock: Arc<dyn Clock>,
    /// Space catalog
    pub catalog: Arc<dyn SpaceCatalog>,
    /// Booking persistence
    pub bookings: Arc<dyn BookingApi>,
    /// Toasts
    pub notifier: Arc<dyn Notifier>,
    /// Screen changes
    pub navigator: Arc<dyn Navigator>,
    /// Dependencies of the embedded payment dialog
    pub payment: PaymentEnvironment,
    /// Delay between a saved booking and the redirect
    pub redirect_delay: Duration,
}

/// External services the booking form talks to.
#[derive(Clone)]
pub struct Services {
    /// Space catalog
    pub catalog: Arc<dyn SpaceCatalog>,
    /// Booking persistence
    pub bookings: Arc<dyn BookingApi>,
    /// Payment gateway
    pub gateway: Arc<dyn PaymentGateway>,
    /// Toasts
    pub notifier: Arc<dyn Notifier>,
    /// Screen changes
    pub navigator: Arc<dyn Navigator>,
}

impl BookingEnvironment {
    /// Assemble an environment, taking delays from `config`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, services: Services, config: &Config) -> Self {
        Self {
            clock,
            payment: PaymentEnvironment {
                gateway: services.gateway,
                notifier: Arc::clone(&services.notifier),
                success_delay: config.success_delay(),
                charge_timeout: config.charge_timeout(),
            },
            catalog: services.catalog,
            bookings: services.bookings,
            notifier: services.notifier,
            navigator: services.navigator,
            redirect_delay: config.redirect_delay(),
        }
    }
}
