//! Payment gateway abstraction and the simulated gateway.
//!
//! The payment reducer only sees [`PaymentGateway::charge`], an async
//! operation that either confirms or fails. The [`SimulatedGateway`] stands
//! in for M-Pesa and `PayPal` by waiting a fixed confirmation delay; a real
//! integration can replace it without touching the step machine.

use spacebook_core::environment::Clock;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::types::{Money, PaymentContact, PaymentMethod, PaymentResult};
use crate::validation::is_email;

/// Payment gateway result
pub type GatewayResult<T> = Result<T, PaymentGatewayError>;

/// Payment gateway error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentGatewayError {
    /// The provider refused the payment
    #[error("Payment declined: {reason}")]
    Declined {
        /// Decline reason
        reason: String,
    },
    /// The provider did not answer in time
    #[error("Payment timed out")]
    Timeout,
    /// The phone number or email cannot be charged
    #[error("Invalid payment details: {reason}")]
    InvalidContact {
        /// What is wrong with the contact
        reason: String,
    },
    /// Any other failure
    #[error("Payment error: {message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// What to charge and whom
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Method chosen in the dialog
    pub method: PaymentMethod,
    /// Amount to charge
    pub amount: Money,
    /// Phone (M-Pesa) or email (`PayPal`)
    pub contact: PaymentContact,
}

/// Payment gateway trait
///
/// Abstraction over M-Pesa, `PayPal` and any later provider.
pub trait PaymentGateway: Send + Sync {
    /// Charge the request, resolving once the provider confirms or refuses
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentGatewayError`] when the payment does not go through.
    fn charge(
        &self,
        request: PaymentRequest,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<PaymentResult>> + Send>>;
}

/// Generates `TXN<unix-millis>` transaction ids
///
/// Ids are strictly increasing even when two charges land in the same
/// millisecond or the clock steps backwards.
#[derive(Debug, Default)]
pub struct TransactionIds {
    last: AtomicU64,
}

impl TransactionIds {
    /// Creates a generator with no history
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Next id for the given wall-clock millisecond
    pub fn next(&self, now_millis: u64) -> String {
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let candidate = now_millis.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange(last, candidate, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return format!("TXN{candidate}"),
                Err(current) => last = current,
            }
        }
    }
}

/// Simulated gateway
///
/// Waits the confirmation delay, then confirms the charge. A gateway built
/// with [`SimulatedGateway::declining`] refuses every charge instead.
#[derive(Clone)]
pub struct SimulatedGateway {
    clock: Arc<dyn Clock>,
    ids: Arc<TransactionIds>,
    confirmation_delay: Duration,
    decline: Option<String>,
}

impl SimulatedGateway {
    /// Creates a gateway that confirms after `confirmation_delay`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, confirmation_delay: Duration) -> Self {
        Self {
            clock,
            ids: Arc::new(TransactionIds::new()),
            confirmation_delay,
            decline: None,
        }
    }

    /// Refuse every charge with the given reason
    #[must_use]
    pub fn declining(mut self, reason: impl Into<String>) -> Self {
        self.decline = Some(reason.into());
        self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(self) -> Arc<dyn PaymentGateway> {
        Arc::new(self)
    }

    fn check_contact(request: &PaymentRequest) -> GatewayResult<()> {
        match (&request.method, &request.contact) {
            (PaymentMethod::Mpesa, PaymentContact::Phone(phone)) if !phone.trim().is_empty() => {
                Ok(())
            },
            (PaymentMethod::Paypal, PaymentContact::Email(email)) if is_email(email.trim()) => {
                Ok(())
            },
            (method, _) => Err(PaymentGatewayError::InvalidContact {
                reason: format!("missing or malformed contact for {method}"),
            }),
        }
    }
}

impl PaymentGateway for SimulatedGateway {
    fn charge(
        &self,
        request: PaymentRequest,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<PaymentResult>> + Send>> {
        let clock = Arc::clone(&self.clock);
        let ids = Arc::clone(&self.ids);
        let delay = self.confirmation_delay;
        let decline = self.decline.clone();

        Box::pin(async move {
            Self::check_contact(&request)?;

            // Simulate the provider round trip (STK push or checkout redirect)
            tokio::time::sleep(delay).await;

            if let Some(reason) = decline {
                tracing::warn!(method = %request.method, %reason, "Simulated payment declined");
                return Err(PaymentGatewayError::Declined { reason });
            }

            let millis = u64::try_from(clock.now().timestamp_millis()).unwrap_or_default();
            let transaction_id = ids.next(millis);

            tracing::info!(
                method = %request.method,
                amount = request.amount.cents(),
                transaction_id = %transaction_id,
                "Simulated payment confirmed"
            );

            Ok(PaymentResult {
                method: request.method,
                transaction_id,
                amount: request.amount,
                contact: request.contact,
            })
        })
    }
}
