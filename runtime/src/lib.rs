//! # Session Sync Runtime
//!
//! The Store runtime that coordinates reducer execution and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: owns the state, runs the reducer, executes effects
//! - **Effect Executor**: runs effect descriptions and feeds resulting actions back
//! - **Action broadcast**: lets callers observe actions produced by effects
//!
//! ## Guarantees
//!
//! - The reducer runs under the state's write lock, so actions are applied
//!   one at a time and readers never see a half-applied transition.
//! - `Store::state` takes the read lock: every read is a consistent snapshot.
//! - Effects run in spawned tasks after the lock is released. Two effects
//!   started by different actions may complete in any order; ordering
//!   between them is the reducer's job.
//!
//! ## Example
//!
//! ```ignore
//! use session_sync_runtime::Store;
//!
//! let store = Store::new(SyncState::bootstrapping(), SessionReducer::new(), env);
//!
//! store.send(SessionAction::ProviderChanged { signal }).await?;
//! let authenticated = store.state(|s| s.session.authenticated).await;
//! ```

use futures::future::{BoxFuture, join_all};
use session_sync_core::{effect::Effect, environment::Clock, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast, watch};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for an action or for effects to drain
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Wall clock backed by [`chrono::Utc::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }
}

/// Configuration for Store instances
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the action broadcast channel
    pub broadcast_capacity: usize,
    /// Poll interval used while waiting for effects to drain
    pub idle_poll_interval: Duration,
}

impl StoreConfig {
    /// Set the broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the idle poll interval
    #[must_use]
    pub const fn with_idle_poll_interval(mut self, interval: Duration) -> Self {
        self.idle_poll_interval = interval;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
            idle_poll_interval: Duration::from_millis(10),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`]. Waiting on it waits for the effects the
/// action produced directly; effects of feedback actions are not tracked
/// (use [`Store::wait_idle`] for that).
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (handle, _tracking) = Self::new();
        handle
    }

    /// Number of effects from this action still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all tracked effects with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the effects are still running when
    /// the timeout expires.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Internal: per-action effect counter shared with spawned effect tasks
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that releases both the per-action and the global
/// effect counters, even if the effect panics
struct EffectGuard {
    tracking: EffectTracking,
    pending: Arc<AtomicUsize>,
}

impl Drop for EffectGuard {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        self.tracking.decrement();
    }
}

/// Store module - the runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicUsize, BoxFuture, Duration, Effect, EffectGuard, EffectHandle,
        EffectTracking, Ordering, Reducer, RwLock, StoreConfig, StoreError, broadcast, join_all,
    };

    /// The Store - runtime coordinator for a reducer
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
        /// Actions produced by effects, after the reducer has applied them
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Clone + Send + Sync + std::fmt::Debug + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with default configuration
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
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

        /// Borrow the injected environment
        #[must_use]
        pub const fn environment(&self) -> &E {
            &self.environment
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::SeqCst)
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Releases the lock and starts the returned effects
        ///
        /// Returns once effects are started, not finished.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);
            tracing::trace!(?action, "Processing action");

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;
                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();
                self.reducer.reduce(&mut state, action, &self.environment)
            };

            tracing::trace!("Reducer returned {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Send an action and wait for a matching action produced by an effect
        ///
        /// Subscribes before sending, so a fast effect cannot be missed. The
        /// returned action has already been applied by the reducer.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action before the timeout
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to actions produced by effects
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let snapshot = store.state(|s| s.session.clone()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Wait until no effect is running anywhere in the store
        ///
        /// Includes effects started by feedback actions and pending delays.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::Timeout`] if effects are still running when
        /// the timeout expires.
        pub async fn wait_idle(&self, timeout: Duration) -> Result<(), StoreError> {
            let start = tokio::time::Instant::now();
            loop {
                if self.pending_effects() == 0 {
                    return Ok(());
                }
                if start.elapsed() >= timeout {
                    return Err(StoreError::Timeout);
                }
                tokio::time::sleep(self.config.idle_poll_interval).await;
            }
        }

        /// Initiate graceful shutdown of the store
        ///
        /// Rejects new actions, then waits for running effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still
        /// running when the timeout expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            match self.wait_idle(timeout).await {
                Ok(()) => {
                    tracing::info!("All effects completed, shutdown successful");
                    Ok(())
                },
                Err(_) => {
                    let pending = self.pending_effects();
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    Err(StoreError::ShutdownTimeout(pending))
                },
            }
        }

        /// Start one top-level effect in its own task
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
            if effect.is_none() {
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                return;
            }

            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let guard = EffectGuard {
                tracking,
                pending: Arc::clone(&self.pending_effects),
            };

            let store = self.clone();
            tokio::spawn(async move {
                let _guard = guard;
                store.run_effect(effect).await;
            });
        }

        /// Run an effect to completion, feeding produced actions back
        fn run_effect(&self, effect: Effect<A>) -> BoxFuture<'static, ()> {
            let store = self.clone();
            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => {
                        metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                        if let Some(action) = fut.await {
                            store.feedback(action).await;
                        }
                    },
                    Effect::Delay { duration, action } => {
                        metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                        tokio::time::sleep(duration).await;
                        store.feedback(*action).await;
                    },
                    Effect::Parallel(effects) => {
                        metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                        join_all(effects.into_iter().map(|e| store.run_effect(e))).await;
                    },
                    Effect::Sequential(effects) => {
                        metrics::counter!("store.effects.executed", "type" => "sequential")
                            .increment(1);
                        for effect in effects {
                            store.run_effect(effect).await;
                        }
                    },
                }
            })
        }

        /// Apply an effect-produced action, then broadcast it to observers
        async fn feedback(&self, action: A) {
            match self.send(action.clone()).await {
                Ok(_) => {
                    let _ = self.action_broadcast.send(action);
                },
                Err(error) => {
                    tracing::warn!(%error, ?action, "Dropped effect result");
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
