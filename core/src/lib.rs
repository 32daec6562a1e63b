//! # Spacebook Core
//!
//! The pieces every booking workflow is written against.
//!
//! A [`reducer::Reducer`] takes the current state, one action and the injected
//! environment. It mutates the state and hands back [`effect::Effect`] values
//! describing the async work to do next: an API call, a pause before a
//! redirect. Nothing runs until `spacebook-runtime` picks those values up, so
//! reducers stay synchronous and deterministic under test.
//!
//! ```
//! use spacebook_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//! use std::time::Duration;
//!
//! #[derive(Debug, Default)]
//! struct Hold {
//!     seats: u32,
//!     expired: bool,
//! }
//!
//! #[derive(Debug)]
//! enum HoldAction {
//!     Reserve(u32),
//!     Expire,
//! }
//!
//! struct HoldReducer;
//!
//! impl Reducer for HoldReducer {
//!     type State = Hold;
//!     type Action = HoldAction;
//!     type Environment = Duration;
//!
//!     fn reduce(
//!         &self,
//!         hold: &mut Hold,
//!         action: HoldAction,
//!         ttl: &Duration,
//!     ) -> SmallVec<[Effect<HoldAction>; 4]> {
//!         match action {
//!             HoldAction::Reserve(seats) => {
//!                 hold.seats = seats;
//!                 smallvec![Effect::Delay { duration: *ttl, action: Box::new(HoldAction::Expire) }]
//!             },
//!             HoldAction::Expire => {
//!                 hold.expired = true;
//!                 SmallVec::new()
//!             },
//!         }
//!     }
//! }
//!
//! let mut hold = Hold::default();
//! let effects = HoldReducer.reduce(&mut hold, HoldAction::Reserve(4), &Duration::from_secs(60));
//! assert_eq!(hold.seats, 4);
//! assert!(matches!(effects[0], Effect::Delay { .. }));
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Declarative macros for effect construction
pub mod effect_macros;

/// The reducer trait
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Business logic for one feature
    ///
    /// Implementations must not block or perform I/O; anything asynchronous
    /// is returned as an [`Effect`] for the runtime to execute.
    pub trait Reducer {
        /// State owned by the feature
        type State;

        /// Everything the feature reacts to, including async results
        type Action;

        /// Injected services (clock, API clients, gateways)
        type Environment;

        /// Apply `action` to `state` and describe the follow-up work
        ///
        /// The inline capacity of four covers every reduction in practice, so
        /// the common path does not allocate.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Descriptions of async work
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Work a reducer asks the runtime to perform
    ///
    /// Any action an effect yields is reduced next, which is how a fetch
    /// result or an elapsed timer gets back into state.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Start all at once
        Parallel(Vec<Effect<Action>>),

        /// Start each once the previous one, and its fed-back action, are done
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (redirects, post-success pauses)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Async work that may yield one action
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Whether this effect does nothing
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }

    impl<Action: Send + 'static> Effect<Action> {
        /// Lift an effect into a parent action type
        ///
        /// Used when a parent reducer embeds a child reducer: the child's
        /// effects are mapped so their feedback actions are wrapped in the
        /// parent's action enum.
        ///
        /// ```
        /// use spacebook_core::effect::Effect;
        /// use std::time::Duration;
        ///
        /// #[derive(Debug, PartialEq)]
        /// enum Child { Tick }
        /// #[derive(Debug, PartialEq)]
        /// enum Parent { Child(Child) }
        ///
        /// let effect = Effect::Delay { duration: Duration::ZERO, action: Box::new(Child::Tick) };
        /// match effect.map(Parent::Child) {
        ///     Effect::Delay { action, .. } => assert_eq!(*action, Parent::Child(Child::Tick)),
        ///     other => panic!("unexpected {other:?}"),
        /// }
        /// ```
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            F: Fn(Action) -> B + Clone + Send + Sync + 'static,
            B: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => Effect::Parallel(
                    effects.into_iter().map(|e| e.map(f.clone())).collect(),
                ),
                Effect::Sequential(effects) => Effect::Sequential(
                    effects.into_iter().map(|e| e.map(f.clone())).collect(),
                ),
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Effect::Future(fut) => {
                    Effect::Future(Box::pin(async move { fut.await.map(f) }))
                },
            }
        }
    }
}

/// Services shared by every environment
pub mod environment {
    use chrono::{DateTime, NaiveDate, Utc};

    /// Source of "now", swapped for a fixed clock in tests
    ///
    /// ```
    /// use spacebook_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let today = clock.today();
    /// assert_eq!(today, clock.now().date_naive());
    /// ```
    pub trait Clock: Send + Sync {
        /// Current instant in UTC
        fn now(&self) -> DateTime<Utc>;

        /// Current calendar day, used for day-precision date checks
        fn today(&self) -> NaiveDate {
            self.now().date_naive()
        }
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
