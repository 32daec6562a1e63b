//! Configuration management for the booking workflow.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Booking API configuration
    pub api: ApiConfig,
    /// Payment timing
    pub payment: PaymentConfig,
    /// Booking form timing
    pub booking: BookingConfig,
    /// Runtime configuration
    pub runtime: RuntimeConfig,
}

/// Booking API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8000/api`. Unset runs against the in-memory API.
    pub base_url: Option<String>,
    /// Bearer token sent with every request
    pub token: Option<String>,
}

/// Payment timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Simulated gateway confirmation delay in milliseconds (default: 3000)
    pub confirmation_delay_ms: u64,
    /// Pause between confirmation and handing the result back, in milliseconds (default: 2000)
    pub success_delay_ms: u64,
    /// How long a charge may run before it is treated as timed out, in milliseconds (default: 30000)
    pub charge_timeout_ms: u64,
}

/// Booking form timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Delay before redirecting to the bookings list after success, in milliseconds (default: 2000)
    pub redirect_delay_ms: u64,
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Graceful shutdown timeout in seconds (default: 5)
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Falls back to defaults for unset or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };
        let text = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        Self {
            api: ApiConfig {
                base_url: text("SPACEBOOK_API_URL"),
                token: text("SPACEBOOK_API_TOKEN"),
            },
            payment: PaymentConfig {
                confirmation_delay_ms: number("PAYMENT_CONFIRMATION_DELAY_MS", 3000),
                success_delay_ms: number("PAYMENT_SUCCESS_DELAY_MS", 2000),
                charge_timeout_ms: number("PAYMENT_TIMEOUT_MS", 30_000),
            },
            booking: BookingConfig {
                redirect_delay_ms: number("BOOKING_REDIRECT_DELAY_MS", 2000),
            },
            runtime: RuntimeConfig {
                log_level: text("SPACEBOOK_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                shutdown_timeout_secs: number("STORE_SHUTDOWN_TIMEOUT_SECS", 5),
            },
        }
    }

    /// Simulated gateway confirmation delay
    #[must_use]
    pub const fn confirmation_delay(&self) -> Duration {
        Duration::from_millis(self.payment.confirmation_delay_ms)
    }

    /// Post-success pause in the payment dialog
    #[must_use]
    pub const fn success_delay(&self) -> Duration {
        Duration::from_millis(self.payment.success_delay_ms)
    }

    /// Upper bound on a single gateway charge
    #[must_use]
    pub const fn charge_timeout(&self) -> Duration {
        Duration::from_millis(self.payment.charge_timeout_ms)
    }

    /// Redirect delay after a saved booking
    #[must_use]
    pub const fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.booking.redirect_delay_ms)
    }

    /// Store shutdown timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.runtime.shutdown_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
