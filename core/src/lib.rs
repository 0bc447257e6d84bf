//! # Session Sync Core
//!
//! Core traits and types for the session synchronization engine.
//!
//! The engine is written as a state machine in the Reducer style:
//!
//! - **State**: the session record plus the controller's bookkeeping
//! - **Action**: every input (provider signals, user requests, effect results)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a description of I/O to perform, executed by the runtime
//! - **Environment**: collaborators injected behind traits
//!
//! Reducers never await. Anything that suspends (token fetches, profile
//! lookups, navigation, timers) is returned as an [`effect::Effect`] and its
//! result comes back as another action.
//!
//! ## Example
//!
//! ```ignore
//! use session_sync_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! impl Reducer for SyncReducer {
//!     type State = SyncState;
//!     type Action = SessionAction;
//!     type Environment = SessionEnvironment<N, M>;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut SyncState,
//!         action: SessionAction,
//!         env: &Self::Environment,
//!     ) -> SmallVec<[Effect<SessionAction>; 4]> {
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Declarative helpers for building effects
pub mod effect_macros;

/// Reducer module - the core trait for state transitions
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - all state transitions go through here
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer owns
    /// - `Action`: The inputs it reacts to
    /// - `Environment`: The injected collaborators it may describe work for
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Implementations update `state` in place and return the effects
        /// the runtime should execute. Most reducers return one or two
        /// effects, hence the inline capacity of four.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values. The runtime decides when and where they run.
pub mod effect {
    use futures::future::BoxFuture;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Run effects one after another, each fully settled before the next
        Sequential(Vec<Effect<Action>>),

        /// Dispatch an action after a delay (settle windows, retry backoff)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// If the future yields `Some(action)`, that action is fed back into
        /// the reducer.
        Future(BoxFuture<'static, Option<Action>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::None => write!(f, "Effect::None"),
                Self::Parallel(effects) => f.debug_tuple("Effect::Parallel").field(effects).finish(),
                Self::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Self::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Self::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Self>) -> Self {
            Self::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Self>) -> Self {
            Self::Sequential(effects)
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Self::None)
        }
    }
}

/// Environment module - dependency injection traits shared by every feature
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// struct FixedClock { time: DateTime<Utc> }
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> DateTime<Utc> {
    ///         self.time
    ///     }
    /// }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use std::time::Duration;

    #[test]
    fn test_effect_debug_hides_future_body() {
        let effect: Effect<u8> = Effect::Future(Box::pin(async { Some(1) }));
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
    }

    #[test]
    fn test_merge_and_chain_wrap_effects() {
        let merged: Effect<u8> = Effect::merge(vec![Effect::None, Effect::None]);
        assert!(matches!(merged, Effect::Parallel(ref effects) if effects.len() == 2));

        let chained: Effect<u8> = Effect::chain(vec![Effect::Delay {
            duration: Duration::from_millis(5),
            action: Box::new(7),
        }]);
        assert!(matches!(chained, Effect::Sequential(ref effects) if effects.len() == 1));
    }

    #[test]
    fn test_is_none() {
        assert!(Effect::<u8>::None.is_none());
        assert!(!Effect::<u8>::Parallel(vec![]).is_none());
    }

    #[test]
    fn test_future_effect_yields_action() {
        let effect: Effect<u8> = Effect::Future(Box::pin(async { Some(42) }));
        let Effect::Future(fut) = effect else {
            unreachable!("constructed as a future");
        };
        assert_eq!(tokio_test::block_on(fut), Some(42));
    }
}
