//! Payment flow: method selection, detail entry, processing, and outcome.
//!
//! - [`step`]: the explicit step machine and its transition table
//! - [`gateway`]: the async charge operation and the simulated gateway
//! - [`reducer`]: the dialog reducer embedded by the booking form

pub mod gateway;
pub mod reducer;
pub mod step;

pub use gateway::{
    GatewayResult, PaymentGateway, PaymentGatewayError, PaymentRequest, SimulatedGateway,
    TransactionIds,
};
pub use reducer::{
    PaymentAction, PaymentDelegate, PaymentEnvironment, PaymentReducer, PaymentState,
    PaymentSummary,
};
pub use step::{PaymentEvent, PaymentStep, TransitionError};
