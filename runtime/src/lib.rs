//! # Spacebook Runtime
//!
//! Drives reducers on tokio. A [`Store`] holds the state, spawns the effects a
//! reducer returns, and feeds their actions back in until the workflow goes
//! quiet. [`EffectHandle`] lets a caller wait for that to happen.
//!
//! ```ignore
//! use spacebook_runtime::Store;
//!
//! let store = Store::new(BookingFormState::default(), BookingFormReducer, env);
//!
//! store
//!     .send(BookingFormAction::LoadSpaces)
//!     .await?
//!     .wait_with_timeout(Duration::from_secs(5))
//!     .await?;
//! let disabled = store.state(BookingFormState::submit_disabled).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Metric names and descriptions for the runtime
pub mod metrics;

pub use error::StoreError;
pub use store::Store;

/// Store failures
pub mod error {
    use thiserror::Error;

    /// Why a store call did not complete
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// `send()` was called after `shutdown()`
        #[error("store is shutting down")]
        ShutdownInProgress,

        /// Effects were still running when the shutdown deadline passed
        #[error("shutdown gave up with {0} effects still running")]
        ShutdownTimeout(usize),

        /// No matching action, or no quiet handle, before the deadline
        #[error("timed out waiting for the store")]
        Timeout,

        /// Every sender of the action broadcast is gone
        #[error("action broadcast closed")]
        ChannelClosed,
    }
}

/// Running-task count shared by every task started on behalf of one caller
///
/// The store keeps one of these for itself (used by shutdown) and creates a
/// fresh one for each [`Store::send`].
#[derive(Clone)]
struct Inflight {
    running: Arc<AtomicUsize>,
    idle: Arc<watch::Sender<()>>,
}

impl Inflight {
    fn new() -> Self {
        let (idle, _) = watch::channel(());
        Self {
            running: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(idle),
        }
    }

    fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    fn handle(&self) -> EffectHandle {
        EffectHandle {
            running: Arc::clone(&self.running),
            idle: self.idle.subscribe(),
        }
    }

    /// Count one task until the returned guard drops
    fn enter(&self) -> InflightGuard {
        self.running.fetch_add(1, Ordering::SeqCst);
        InflightGuard(self.clone())
    }
}

/// Dropped when its task ends, even by panic
struct InflightGuard(Inflight);

impl Drop for InflightGuard {
    fn drop(&mut self) {
        if self.0.running.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.send_replace(());
        }
    }
}

/// Waits for the effects started by one [`Store::send()`]
///
/// The handle covers the effect tasks and the reduction of the actions they
/// feed back. Effects returned by those fed-back actions are not covered.
///
/// ```ignore
/// let mut handle = store.send(BookingFormAction::LoadSpaces).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // SpacesLoaded or SpacesFailed has been reduced
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    running: Arc<AtomicUsize>,
    idle: watch::Receiver<()>,
}

impl EffectHandle {
    /// A handle with nothing to wait for
    #[must_use]
    pub fn completed() -> Self {
        let (_, idle) = watch::channel(());
        Self {
            running: Arc::new(AtomicUsize::new(0)),
            idle,
        }
    }

    /// Number of tracked effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Resolve once every tracked effect has finished
    pub async fn wait(&mut self) {
        while self.pending() > 0 {
            if self.idle.changed().await.is_err() {
                return;
            }
        }
    }

    /// [`wait`](Self::wait) with a deadline
    ///
    /// # Errors
    ///
    /// [`StoreError::Timeout`] when effects are still running at the deadline.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

/// The [`Store`] type
pub mod store {
    use super::{EffectHandle, Inflight, StoreError};
    use crate::metrics::{ACTIONS, EFFECTS, REJECTED, SHUTDOWNS, SHUTDOWN_TIMEOUTS};
    use spacebook_core::{effect::Effect, reducer::Reducer};
    use std::future::Future;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::{RwLock, broadcast};

    /// Owns a workflow's state and runs its reducer
    ///
    /// Actions are reduced one at a time under a write lock. The effects the
    /// reducer returns run on tokio tasks, and any action they yield is
    /// broadcast to observers and then sent back through the reducer.
    ///
    /// A booking form, for example, is a
    /// `Store<BookingFormState, BookingFormAction, BookingEnvironment, BookingFormReducer>`.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        env: E,
        closed: Arc<AtomicBool>,
        all_effects: Inflight,
        /// Actions yielded by effects, for `send_and_wait_for` and UI bindings
        observers: broadcast::Sender<A>,
    }

    fn kind<A>(effect: &Effect<A>) -> &'static str {
        match effect {
            Effect::None => "none",
            Effect::Parallel(_) => "parallel",
            Effect::Sequential(_) => "sequential",
            Effect::Delay { .. } => "delay",
            Effect::Future(_) => "future",
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// A store whose action broadcast buffers 16 actions
        #[must_use]
        pub fn new(initial_state: S, reducer: R, env: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, env, 16)
        }

        /// A store for observers that may fall further behind
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            env: E,
            capacity: usize,
        ) -> Self {
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                env,
                closed: Arc::new(AtomicBool::new(false)),
                all_effects: Inflight::new(),
                observers: broadcast::channel(capacity).0,
            }
        }

        /// Stop accepting actions and wait for running effects to drain
        ///
        /// Only callers are refused. Actions fed back by the effects being
        /// drained are still reduced, and any effects they start are waited
        /// for too, so a pending redirect or gateway result is not lost.
        ///
        /// # Errors
        ///
        /// [`StoreError::ShutdownTimeout`] with the number of effects still
        /// running when `timeout` elapsed.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            self.closed.store(true, Ordering::Release);
            metrics::counter!(SHUTDOWNS).increment(1);
            tracing::info!(?timeout, running = self.all_effects.running(), "Draining store");

            if self.all_effects.handle().wait_with_timeout(timeout).await.is_ok() {
                tracing::info!("Store drained");
                return Ok(());
            }

            let running = self.all_effects.running();
            if running == 0 {
                return Ok(());
            }
            metrics::counter!(SHUTDOWN_TIMEOUTS).increment(1);
            tracing::error!(running, "Store shutdown timed out");
            Err(StoreError::ShutdownTimeout(running))
        }

        /// Reduce an action and start its effects
        ///
        /// Returns as soon as the effects are spawned. The handle resolves when
        /// they finish, including the reduction of whatever action they yield.
        ///
        /// # Errors
        ///
        /// [`StoreError::ShutdownInProgress`] once [`shutdown`](Self::shutdown)
        /// has been called.
        ///
        /// # Panics
        ///
        /// A panicking reducer poisons nothing but propagates to the caller.
        #[tracing::instrument(skip_all, name = "store.send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.closed.load(Ordering::Acquire) {
                metrics::counter!(REJECTED).increment(1);
                tracing::warn!("Action refused, store is closed");
                return Err(StoreError::ShutdownInProgress);
            }
            Ok(self.dispatch(action).await)
        }

        async fn dispatch(&self, action: A) -> EffectHandle {
            metrics::counter!(ACTIONS).increment(1);

            let effects = {
                let mut state = self.state.write().await;
                self.reducer.reduce(&mut *state, action, &self.env)
            };
            tracing::trace!(effects = effects.len(), "Reduced");

            let inflight = Inflight::new();
            let handle = inflight.handle();
            for effect in effects {
                self.run_effect(effect, &inflight);
            }
            handle
        }

        /// Send `action`, then return the first fed-back action matching
        /// `predicate`
        ///
        /// The subscription is taken before sending, so a fast effect cannot
        /// slip past it.
        ///
        /// # Errors
        ///
        /// [`StoreError::Timeout`] when nothing matches in time,
        /// [`StoreError::ChannelClosed`] if the broadcast closes, and
        /// [`StoreError::ShutdownInProgress`] from the send itself.
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut observed = self.observers.subscribe();
            self.send(action).await?;

            let matching = async {
                loop {
                    match observed.recv().await {
                        Ok(action) if predicate(&action) => break Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "Observer fell behind the store");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            break Err(StoreError::ChannelClosed);
                        },
                    }
                }
            };
            tokio::time::timeout(timeout, matching)
                .await
                .unwrap_or(Err(StoreError::Timeout))
        }

        /// Every action fed back from now on
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.observers.subscribe()
        }

        /// Project the current state
        ///
        /// ```ignore
        /// let banner = store.state(|s| s.banner.clone()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            f(&*self.state.read().await)
        }

        fn spawn_tracked<F>(&self, inflight: &Inflight, work: F)
        where
            F: Future<Output = ()> + Send + 'static,
        {
            let guards = (inflight.enter(), self.all_effects.enter());
            tokio::spawn(async move {
                let _guards = guards;
                work.await;
            });
        }

        /// Fed-back actions bypass the shutdown check; see [`shutdown`](Self::shutdown)
        async fn feed_back(&self, action: A) {
            let _ = self.observers.send(action.clone());
            let _ = self.dispatch(action).await;
        }

        /// A panicking effect only ends its own task; its guards still release
        fn run_effect(&self, effect: Effect<A>, inflight: &Inflight) {
            metrics::counter!(EFFECTS, "kind" => kind(&effect)).increment(1);

            match effect {
                Effect::None => {},
                Effect::Future(work) => {
                    let store = self.clone();
                    self.spawn_tracked(inflight, async move {
                        if let Some(action) = work.await {
                            store.feed_back(action).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!(?duration, "Delay scheduled");
                    let store = self.clone();
                    self.spawn_tracked(inflight, async move {
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action).await;
                    });
                },
                Effect::Parallel(effects) => {
                    for effect in effects {
                        self.run_effect(effect, inflight);
                    }
                },
                Effect::Sequential(steps) => {
                    let store = self.clone();
                    self.spawn_tracked(inflight, async move {
                        for step in steps {
                            let current = Inflight::new();
                            let mut done = current.handle();
                            store.run_effect(step, &current);
                            done.wait().await;
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                env: self.env.clone(),
                closed: Arc::clone(&self.closed),
                all_effects: self.all_effects.clone(),
                observers: self.observers.clone(),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)] // Tests are allowed to panic on failures
mod tests {
    use super::*;
    use spacebook_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};

    /// Seats held for a booking; each variant exercises one effect shape
    #[derive(Debug, Clone, Default)]
    struct Holds {
        seats: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum HoldAction {
        Hold,
        Release,
        Ignore,
        HoldWhenCharged,
        HoldAfterPause,
        HoldThreeAtOnce,
        HoldHoldRelease,
        GatewayCrash,
    }

    #[derive(Debug, Clone)]
    struct HoldReducer {
        pause: Duration,
    }

    fn charged(action: HoldAction) -> Effect<HoldAction> {
        Effect::Future(Box::pin(async move { Some(action) }))
    }

    impl Reducer for HoldReducer {
        type State = Holds;
        type Action = HoldAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                HoldAction::Hold => state.seats += 1,
                HoldAction::Release => state.seats -= 1,
                HoldAction::Ignore => {},
                HoldAction::HoldWhenCharged => return smallvec![charged(HoldAction::Hold)],
                HoldAction::HoldAfterPause => {
                    return smallvec![Effect::Delay {
                        duration: self.pause,
                        action: Box::new(HoldAction::Hold),
                    }];
                },
                HoldAction::HoldThreeAtOnce => {
                    return smallvec![Effect::merge(vec![
                        charged(HoldAction::Hold),
                        charged(HoldAction::Hold),
                        charged(HoldAction::Hold),
                    ])];
                },
                HoldAction::HoldHoldRelease => {
                    return smallvec![Effect::chain(vec![
                        charged(HoldAction::Hold),
                        charged(HoldAction::Hold),
                        charged(HoldAction::Release),
                    ])];
                },
                HoldAction::GatewayCrash => {
                    return smallvec![Effect::Future(Box::pin(async {
                        panic!("gateway crashed mid-charge");
                    }))];
                },
            }
            smallvec![Effect::None]
        }
    }

    type HoldStore = Store<Holds, HoldAction, (), HoldReducer>;

    fn store() -> HoldStore {
        Store::new(
            Holds::default(),
            HoldReducer {
                pause: Duration::from_millis(10),
            },
            (),
        )
    }

    async fn seats(store: &HoldStore) -> i32 {
        store.state(|s| s.seats).await
    }

    const WAIT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_actions_reduce_in_order() {
        let store = store();

        for action in [HoldAction::Hold, HoldAction::Hold, HoldAction::Release] {
            let _ = store.send(action).await;
        }

        assert_eq!(seats(&store).await, 1);
    }

    #[tokio::test]
    async fn test_no_effect_leaves_nothing_pending() {
        let store = store();

        let handle = store.send(HoldAction::Ignore).await.unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(handle.pending(), 0);
        assert_eq!(seats(&store).await, 0);
    }

    #[tokio::test]
    async fn test_future_result_is_reduced_before_handle_completes() -> Result<(), StoreError> {
        let store = store();

        store.send(HoldAction::HoldWhenCharged).await?.wait_with_timeout(WAIT).await?;

        assert_eq!(seats(&store).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delay_fires_later() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(HoldAction::HoldAfterPause).await?;
        assert_eq!(seats(&store).await, 0);
        assert_eq!(handle.pending(), 1);

        handle.wait_with_timeout(WAIT).await?;
        assert_eq!(seats(&store).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_parallel_effects_all_feed_back() -> Result<(), StoreError> {
        let store = store();

        store.send(HoldAction::HoldThreeAtOnce).await?.wait_with_timeout(WAIT).await?;

        assert_eq!(seats(&store).await, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_sequential_effects_run_one_after_another() -> Result<(), StoreError> {
        let store = store();
        let mut observed = store.subscribe_actions();

        store.send(HoldAction::HoldHoldRelease).await?.wait_with_timeout(WAIT).await?;

        assert_eq!(seats(&store).await, 1);
        let mut order = Vec::new();
        while let Ok(action) = observed.try_recv() {
            order.push(action);
        }
        assert_eq!(order, vec![HoldAction::Hold, HoldAction::Hold, HoldAction::Release]);
        Ok(())
    }

    #[tokio::test]
    async fn test_send_and_wait_for_returns_the_matching_action() -> Result<(), StoreError> {
        let store = store();

        let action = store
            .send_and_wait_for(HoldAction::HoldAfterPause, |a| *a == HoldAction::Hold, WAIT)
            .await?;

        assert_eq!(action, HoldAction::Hold);
        Ok(())
    }

    #[tokio::test]
    async fn test_send_and_wait_for_times_out() {
        let store = store();

        let result = store
            .send_and_wait_for(
                HoldAction::HoldAfterPause,
                |a| *a == HoldAction::Release,
                Duration::from_millis(50),
            )
            .await;

        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[tokio::test]
    async fn test_panicking_effect_does_not_poison_the_store() -> Result<(), StoreError> {
        let store = store();

        store.send(HoldAction::GatewayCrash).await?.wait_with_timeout(WAIT).await?;

        let _ = store.send(HoldAction::Hold).await?;
        assert_eq!(seats(&store).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_refuses_new_actions() -> Result<(), StoreError> {
        let store = store();

        store.shutdown(WAIT).await?;

        let result = store.send(HoldAction::Hold).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_still_reduces_what_running_effects_yield() -> Result<(), StoreError> {
        let store = store();

        let _ = store.send(HoldAction::HoldAfterPause).await?;
        store.shutdown(WAIT).await?;

        assert_eq!(seats(&store).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_reports_effects_still_running() -> Result<(), StoreError> {
        let store = store();

        let _ = store.send(HoldAction::HoldAfterPause).await?;
        let result = store.shutdown(Duration::ZERO).await;

        assert!(matches!(result, Err(StoreError::ShutdownTimeout(1))));
        Ok(())
    }
}
