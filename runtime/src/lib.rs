//! # Staybook Runtime
//!
//! The Store runtime that coordinates reducer execution and effect handling
//! for Staybook controllers.
//!
//! ## Core Components
//!
//! - **Store**: single writer of a controller's state; runs the reducer and executes effects
//! - **Effect Executor**: spawns effect futures and feeds produced actions back to the reducer
//! - **Action broadcast**: every action produced by an effect is published to observers,
//!   which is how controllers turn a command into a request/response call
//!
//! ## Example
//!
//! ```ignore
//! use staybook_runtime::Store;
//!
//! let store = Store::new(BookingState::default(), BookingReducer::new(), environment);
//!
//! let outcome = store
//!     .send_and_wait_for(BookingAction::LoadBookings { request_id }, |a| a.is_event() && a.request_id() == Some(request_id))
//!     .await?;
//!
//! let count = store.state(|s| s.bookings.len()).await;
//! ```

use staybook_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// Returned when `send()` is called after shutdown was initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,

        /// The waiter fell behind the action broadcast and its outcome may be lost
        ///
        /// The action itself was reduced; only the observation was missed.
        #[error("Action observer lagged behind by {0} actions")]
        Lagged(u64),
    }
}

pub use error::StoreError;

/// Store configuration
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default().with_broadcast_capacity(256);
/// let store = Store::with_config(state, reducer, env, config);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the action broadcast channel
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
            default_shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] so the caller can wait until every effect
/// spawned for that action has finished and its feedback action has been
/// reduced.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::LoadHotels { request_id }).await?;
/// handle.wait().await;
/// // LoadHotels' outcome is now reflected in state
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new handle plus the tracking context used during effect execution
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// Number of effects still running for this handle
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    ///
    /// Returns once the effect counter reaches zero.
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracker is gone, so no effect can still be running
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), ()> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| ())
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements the effect counter on drop
///
/// Keeps the counter accurate even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreConfig, StoreError,
    };
    use tokio::sync::{broadcast, watch};

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`, written only by the reducer)
    /// 2. Reducer (controller logic)
    /// 3. Environment (gateway, clock)
    /// 4. Effect execution (with feedback loop)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast here before it is reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with the default configuration
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new store with a custom configuration
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Access the injected environment
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Stop accepting actions and wait for running effects to finish
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
        /// after the configured shutdown timeout.
        pub async fn shutdown(&self) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            let timeout = self.config.default_shutdown_timeout;
            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(20);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);
                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }
                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Spawns the returned effects
        ///
        /// `send()` returns once effects are started, not completed. Use the
        /// returned [`EffectHandle`] to wait for them.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect_internal(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Send an action and return the first resulting action matching `predicate`
        ///
        /// Subscribes to the action broadcast before sending and scans it while
        /// the effects of `action` run. A match is returned only once every
        /// effect has completed, so its feedback action has already been reduced.
        ///
        /// Returns `Ok(None)` when the reducer produced no matching action, e.g.
        /// because it ignored the command.
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`]: store is shutting down
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed while scanning
        /// - [`StoreError::Lagged`]: actions were dropped before this waiter saw
        ///   them and none of the remaining ones matched
        pub async fn send_and_wait_for<F>(&self, action: A, predicate: F) -> Result<Option<A>, StoreError>
        where
            R: Clone,
            E: Clone,
            F: Fn(&A) -> bool,
        {
            // Subscribe BEFORE sending so nothing produced by this action is missed
            let mut rx = self.action_broadcast.subscribe();
            let mut handle = self.send(action).await?;

            let mut found = None;
            let mut skipped_total = 0u64;

            let completion = handle.wait();
            tokio::pin!(completion);

            let mut completed = false;
            while !completed && found.is_none() {
                tokio::select! {
                    () = &mut completion => completed = true,
                    received = rx.recv() => match received {
                        Ok(action) if predicate(&action) => found = Some(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                            skipped_total += skipped;
                        },
                        Err(broadcast::error::RecvError::Closed) => return Err(StoreError::ChannelClosed),
                    },
                }
            }

            if !completed {
                completion.await;
            }

            while found.is_none() {
                match rx.try_recv() {
                    Ok(action) if predicate(&action) => found = Some(action),
                    Ok(_) => {},
                    Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Action observer lagged");
                        skipped_total += skipped;
                    },
                    Err(broadcast::error::TryRecvError::Empty) => break,
                    Err(broadcast::error::TryRecvError::Closed) => return Err(StoreError::ChannelClosed),
                }
            }

            match found {
                Some(action) => Ok(Some(action)),
                None if skipped_total > 0 => Err(StoreError::Lagged(skipped_total)),
                None => Ok(None),
            }
        }

        /// Subscribe to all actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.bookings.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Execute an effect with tracking
        ///
        /// Effect failures are expressed as actions by the reducer's own effect
        /// futures; a panicking effect is contained in its task and only the
        /// [`DecrementGuard`] observes it.
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into spawned tasks
        fn execute_effect_internal(&self, effect: Effect<A>, tracking: EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let tracking_clone = tracking.clone();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking_clone);
                        let _pending_guard = pending_guard;

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            let _ = store.action_broadcast.send(action.clone());
                            if let Err(error) = store.send(action).await {
                                tracing::warn!(%error, "Feedback action dropped");
                            }
                        }
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect_internal(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let tracking_clone = tracking.clone();
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guard = DecrementGuard(tracking_clone);
                        let _pending_guard = pending_guard;

                        for effect in effects {
                            let (sub_tx, mut sub_rx) = watch::channel(());
                            let sub_tracking = EffectTracking {
                                counter: Arc::new(AtomicUsize::new(0)),
                                notifier: sub_tx,
                            };

                            store.execute_effect_internal(effect, sub_tracking.clone());

                            while sub_tracking.counter.load(Ordering::SeqCst) > 0 {
                                if sub_rx.changed().await.is_err() {
                                    break;
                                }
                            }
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
                environment: self.environment.clone(),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use staybook_core::{SmallVec, smallvec};

    #[derive(Debug, Clone, Default)]
    struct TestState {
        value: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Increment,
        Decrement,
        NoOp,
        ProduceEffect,
        ProduceParallelEffects,
        ProduceSequentialEffects,
        ProducePanickingEffect,
        Request(u32),
        Answered(u32),
        Burst(u32),
        Linger,
    }

    #[derive(Debug, Clone)]
    struct TestEnv;

    #[derive(Debug, Clone)]
    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.value += 1;
                    smallvec![Effect::None]
                },
                TestAction::Decrement => {
                    state.value -= 1;
                    smallvec![Effect::None]
                },
                TestAction::NoOp | TestAction::Answered(_) => SmallVec::new(),
                TestAction::ProduceEffect => {
                    smallvec![Effect::Future(Box::pin(async { Some(TestAction::Increment) }))]
                },
                TestAction::ProduceParallelEffects => smallvec![Effect::Parallel(vec![
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                ])],
                TestAction::ProduceSequentialEffects => smallvec![Effect::Sequential(vec![
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    Effect::Future(Box::pin(async { Some(TestAction::Decrement) })),
                ])],
                #[allow(clippy::panic)] // Intentional panic for testing guard behaviour
                TestAction::ProducePanickingEffect => smallvec![Effect::Future(Box::pin(async {
                    panic!("effect panicked");
                }))],
                TestAction::Request(n) => {
                    smallvec![Effect::Future(Box::pin(async move { Some(TestAction::Answered(n * 2)) }))]
                },
                TestAction::Burst(n) => {
                    let answer = Effect::Future(Box::pin(async move { Some(TestAction::Answered(n)) }));
                    let noise = (0..n).map(|_| Effect::Future(Box::pin(async { Some(TestAction::NoOp) })));
                    smallvec![Effect::Parallel(std::iter::once(answer).chain(noise).collect())]
                },
                TestAction::Linger => smallvec![Effect::Future(Box::pin(async {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    None
                }))],
            }
        }
    }

    fn store() -> Store<TestState, TestAction, TestEnv, TestReducer> {
        Store::new(TestState::default(), TestReducer, TestEnv)
    }

    #[tokio::test]
    async fn send_runs_reducer_synchronously() {
        let store = store();
        let _ = store.send(TestAction::Increment).await;
        let _ = store.send(TestAction::Increment).await;
        let _ = store.send(TestAction::Decrement).await;
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn future_effect_feeds_action_back() {
        let store = store();
        let Ok(mut handle) = store.send(TestAction::ProduceEffect).await else {
            unreachable!("store is running");
        };
        handle.wait().await;
        assert_eq!(store.state(|s| s.value).await, 1);
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test]
    async fn parallel_and_sequential_effects_complete() {
        let store = store();
        if let Ok(mut handle) = store.send(TestAction::ProduceParallelEffects).await {
            handle.wait().await;
        }
        assert_eq!(store.state(|s| s.value).await, 3);

        if let Ok(mut handle) = store.send(TestAction::ProduceSequentialEffects).await {
            handle.wait().await;
        }
        assert_eq!(store.state(|s| s.value).await, 4);
    }

    #[tokio::test]
    async fn panicking_effect_still_completes_handle() {
        let store = store();
        if let Ok(mut handle) = store.send(TestAction::ProducePanickingEffect).await {
            assert!(handle.wait_with_timeout(Duration::from_secs(2)).await.is_ok());
        }
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_matching_action() {
        let store = store();
        let result = store
            .send_and_wait_for(TestAction::Request(21), |a| matches!(a, TestAction::Answered(_)))
            .await;
        assert_eq!(result, Ok(Some(TestAction::Answered(42))));
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_none_without_effects() {
        let store = store();
        let result = store
            .send_and_wait_for(TestAction::NoOp, |a| matches!(a, TestAction::Answered(_)))
            .await;
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn concurrent_waiters_see_their_own_outcome() {
        let store = store();
        let a = store.send_and_wait_for(TestAction::Request(1), |a| *a == TestAction::Answered(2));
        let b = store.send_and_wait_for(TestAction::Request(5), |a| *a == TestAction::Answered(10));
        let (a, b) = tokio::join!(a, b);
        assert_eq!(a, Ok(Some(TestAction::Answered(2))));
        assert_eq!(b, Ok(Some(TestAction::Answered(10))));
    }

    #[tokio::test]
    async fn subscribers_observe_feedback_actions() {
        let store = store();
        let mut rx = store.subscribe_actions();
        if let Ok(mut handle) = store.send(TestAction::Request(3)).await {
            handle.wait().await;
        }
        assert_eq!(rx.try_recv().ok(), Some(TestAction::Answered(6)));
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = store();
        assert_eq!(store.shutdown().await, Ok(()));
        let result = store.send(TestAction::Increment).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
    }

    #[tokio::test]
    async fn shutdown_times_out_while_effects_run() {
        let config = StoreConfig {
            default_shutdown_timeout: Duration::from_millis(40),
            ..StoreConfig::default()
        };
        let store = Store::with_config(TestState::default(), TestReducer, TestEnv, config);
        let _ = store.send(TestAction::Linger).await;

        assert_eq!(store.shutdown().await, Err(StoreError::ShutdownTimeout(1)));
    }

    #[tokio::test]
    async fn lagging_waiter_reports_lost_outcome_instead_of_none() {
        let config = StoreConfig::default().with_broadcast_capacity(2);
        let store = Store::with_config(TestState::default(), TestReducer, TestEnv, config);

        let result = store
            .send_and_wait_for(TestAction::Burst(32), |a| *a == TestAction::Answered(32))
            .await;

        assert_ne!(result, Ok(None));
        assert!(matches!(
            result,
            Ok(Some(TestAction::Answered(32))) | Err(StoreError::Lagged(_))
        ));
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn waiter_keeps_up_with_a_roomy_broadcast() {
        let config = StoreConfig::default().with_broadcast_capacity(64);
        let store = Store::with_config(TestState::default(), TestReducer, TestEnv, config);

        let result = store
            .send_and_wait_for(TestAction::Burst(16), |a| *a == TestAction::Answered(16))
            .await;

        assert_eq!(result, Ok(Some(TestAction::Answered(16))));
    }
}
