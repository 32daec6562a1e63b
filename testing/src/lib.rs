//! # Spacebook Testing
//!
//! Testing utilities and helpers for the space-booking workflow.
//!
//! This crate provides:
//! - Deterministic implementations of Environment traits
//! - A Given-When-Then builder for reducers
//! - Effect drivers that resolve futures and delays without a Store
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use spacebook_testing::{drive, test_clock};
//!
//! #[tokio::test]
//! async fn payment_confirms() {
//!     let env = test_environment();
//!     let mut state = BookingFormState::default();
//!
//!     let actions = drive(&BookingFormReducer, &mut state, BookingFormAction::Submit, &env, 32).await;
//!     assert!(matches!(state.stage, FormStage::Payment { .. }));
//! }
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use spacebook_core::environment::Clock;


pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, NaiveDate, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use spacebook_testing::mocks::FixedClock;
    /// use spacebook_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Clock pinned to midday of the given calendar day
        ///
        /// Returns `None` for dates chrono cannot represent at noon.
        #[must_use]
        pub fn on(date: NaiveDate) -> Option<Self> {
            date.and_hms_opt(12, 0, 0)
                .map(|naive| Self::new(naive.and_utc()))
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Effect drivers for async reducer tests.
///
/// These run effect descriptions in-process: futures are awaited and delays
/// fire immediately, so multi-step flows can be tested without a Store or
/// real timers.
pub mod helpers {
    use spacebook_core::{effect::Effect, reducer::Reducer};
    use std::collections::VecDeque;

    /// Resolve effects into the actions they would feed back
    ///
    /// Composite effects are flattened in declaration order. Delays are
    /// resolved immediately; their durations are ignored.
    pub async fn collect_actions<A, I>(effects: I) -> Vec<A>
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut queue: VecDeque<Effect<A>> = effects.into_iter().collect();
        let mut actions = Vec::new();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::None => {},
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    for effect in effects.into_iter().rev() {
                        queue.push_front(effect);
                    }
                },
                Effect::Delay { action, .. } => actions.push(*action),
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        actions.push(action);
                    }
                },
            }
        }

        actions
    }

    /// Send an action and keep feeding effect output back until quiescent
    ///
    /// Returns every fed-back action in the order it was reduced (the initial
    /// action is not included).
    ///
    /// # Panics
    ///
    /// Panics if more than `max_steps` feedback actions are produced, which
    /// usually means the reducer loops.
    #[allow(clippy::panic)] // Test helper
    pub async fn drive<R>(
        reducer: &R,
        state: &mut R::State,
        action: R::Action,
        env: &R::Environment,
        max_steps: usize,
    ) -> Vec<R::Action>
    where
        R: Reducer,
        R::Action: Clone,
    {
        let mut pending: VecDeque<R::Action> = VecDeque::from([action]);
        let mut seen = Vec::new();
        let mut first = true;

        while let Some(action) = pending.pop_front() {
            if !first {
                assert!(
                    seen.len() < max_steps,
                    "Reducer produced more than {max_steps} feedback actions"
                );
                seen.push(action.clone());
            }
            first = false;

            let effects = reducer.reduce(state, action, env);
            pending.extend(collect_actions(effects).await);
        }

        seen
    }
}

// Re-export commonly used items
pub use helpers::{collect_actions, drive};
pub use mocks::{test_clock, FixedClock};
