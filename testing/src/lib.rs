//! # Session Sync Testing
//!
//! Testing utilities for reducers and stores of the session sync engine.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then harness for pure reducer tests
//! - [`assertions`]: effect shape checks
//! - [`effects`]: drains effect trees into the actions they would produce
//! - [`mocks`]: deterministic clocks
//!
//! ## Example
//!
//! ```ignore
//! use session_sync_testing::{ReducerTest, assertions};
//!
//! ReducerTest::new(SyncReducer::new())
//!     .with_env(test_environment())
//!     .given_state(SyncState::bootstrapping())
//!     .when_action(SessionAction::SignOut)
//!     .then_state(|s| assert!(!s.session.authenticated))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use session_sync_core::environment::Clock;


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of core environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use session_sync_testing::mocks::FixedClock;
    /// use session_sync_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
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
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default())
    }
}

/// Helpers for inspecting effects without a runtime
pub mod effects {
    use futures::future::BoxFuture;
    use session_sync_core::effect::Effect;

    /// Resolve an effect tree into the actions it would feed back
    ///
    /// Futures are awaited in order, delays are skipped and yield their
    /// action immediately. Parallel children are drained left to right.
    pub fn drain<A: Send + 'static>(effect: Effect<A>) -> BoxFuture<'static, Vec<A>> {
        Box::pin(async move {
            match effect {
                Effect::None => Vec::new(),
                Effect::Future(fut) => fut.await.into_iter().collect(),
                Effect::Delay { action, .. } => vec![*action],
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    let mut actions = Vec::new();
                    for effect in effects {
                        actions.extend(drain(effect).await);
                    }
                    actions
                },
            }
        })
    }

    /// [`drain`] every effect a reducer returned
    pub async fn drain_all<A, I>(effects: I) -> Vec<A>
    where
        A: Send + 'static,
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut actions = Vec::new();
        for effect in effects {
            actions.extend(drain(effect).await);
        }
        actions
    }
}

/// Test helpers
pub mod helpers {
    /// Install a `tracing` subscriber that writes through the test harness
    ///
    /// Honors `RUST_LOG`. Safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use session_sync_core::effect::Effect;
    use std::time::Duration;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_drain_flattens_effect_tree() {
        let effect: Effect<u8> = Effect::Parallel(vec![
            Effect::None,
            Effect::Future(Box::pin(async { Some(1) })),
            Effect::Sequential(vec![
                Effect::Delay {
                    duration: Duration::from_secs(60),
                    action: Box::new(2),
                },
                Effect::Future(Box::pin(async { None })),
            ]),
        ]);

        let actions = tokio_test::block_on(effects::drain(effect));
        assert_eq!(actions, vec![1, 2]);
    }

    #[test]
    fn test_init_test_tracing_is_idempotent() {
        helpers::init_test_tracing();
        helpers::init_test_tracing();
    }
}
