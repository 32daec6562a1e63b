//! Counter names emitted through the `metrics` facade
//!
//! Nothing is exported until the host process installs a recorder. [`describe`]
//! attaches help text so a recorder installed later can render it.
//!
//! ```
//! spacebook_runtime::metrics::describe();
//! ```

use metrics::describe_counter;

/// Actions accepted by a store
pub const ACTIONS: &str = "store.actions.total";
/// Actions refused after shutdown began
pub const REJECTED: &str = "store.actions.rejected";
/// Effects started, labelled by `kind`
pub const EFFECTS: &str = "store.effects.started";
/// Shutdowns requested
pub const SHUTDOWNS: &str = "store.shutdowns.total";
/// Shutdowns that hit their deadline
pub const SHUTDOWN_TIMEOUTS: &str = "store.shutdowns.timed_out";

/// Register descriptions for every counter the workspace emits
pub fn describe() {
    describe_counter!(ACTIONS, "Actions reduced by a store");
    describe_counter!(REJECTED, "Actions refused because the store was shutting down");
    describe_counter!(EFFECTS, "Effects started by a store, labelled by kind");
    describe_counter!(SHUTDOWNS, "Store shutdowns requested");
    describe_counter!(SHUTDOWN_TIMEOUTS, "Shutdowns that gave up with effects still running");

    describe_counter!("booking.submissions.total", "Booking form submissions attempted");
    describe_counter!(
        "booking.submissions.rejected",
        "Submissions that did not reach payment, labelled by reason"
    );
    describe_counter!("booking.created.total", "Bookings saved after a confirmed payment");
    describe_counter!(
        "booking.failed_after_payment.total",
        "Bookings the API refused after the payment was confirmed"
    );

    describe_counter!("payment.attempts.total", "Payment attempts, labelled by method");
    describe_counter!("payment.confirmed.total", "Payments the gateway confirmed");
    describe_counter!("payment.declined.total", "Payments the gateway declined");
    describe_counter!("payment.timeouts.total", "Charges abandoned after the gateway did not answer");
}
