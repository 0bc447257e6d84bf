//! Session reducers.
//!
//! Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
//!
//! - [`SyncReducer`]: the synchronization controller
//! - [`NavigationGuard`]: redirect policy with a settle window
//! - [`SessionReducer`]: both, with the guard looking at every state the
//!   controller produces

pub mod navigation;
pub mod sync;

use crate::actions::SessionAction;
use crate::environment::SessionEnvironment;
use crate::providers::{Navigator, RouteMemory};
use crate::state::SyncState;
use session_sync_core::{SmallVec, effect::Effect, reducer::Reducer};

// Re-export
pub use navigation::{NavigationGuard, Redirect, decide};
pub use sync::SyncReducer;

/// Unified session reducer.
///
/// Router actions go to the guard. Everything else goes to the controller
/// first, then the guard re-evaluates the resulting state.
pub struct SessionReducer<N, M> {
    sync: SyncReducer<N, M>,
    guard: NavigationGuard<N, M>,
}

impl<N, M> SessionReducer<N, M>
where
    N: Navigator + Clone + 'static,
    M: RouteMemory + Clone + 'static,
{
    /// Create a new unified session reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sync: SyncReducer::new(),
            guard: NavigationGuard::new(),
        }
    }
}

impl<N, M> Default for SessionReducer<N, M>
where
    N: Navigator + Clone + 'static,
    M: RouteMemory + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, M> Clone for SessionReducer<N, M> {
    fn clone(&self) -> Self {
        Self {
            sync: self.sync.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<N, M> std::fmt::Debug for SessionReducer<N, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionReducer")
            .field("sync", &self.sync)
            .field("guard", &self.guard)
            .finish()
    }
}

impl<N, M> Reducer for SessionReducer<N, M>
where
    N: Navigator + Clone + 'static,
    M: RouteMemory + Clone + 'static,
{
    type State = SyncState;
    type Action = SessionAction;
    type Environment = SessionEnvironment<N, M>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SessionAction::RouteChanged { .. } | SessionAction::NavigationSettled => {
                self.guard.reduce(state, action, env)
            },
            action => {
                let mut effects = self.sync.reduce(state, action, env);
                effects.extend(self.guard.evaluate(state, env));
                effects.retain(|effect| !effect.is_none());
                effects
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockNavigator, test_environment};
    use crate::providers::InMemoryRouteMemory;
    use crate::state::{ProviderSignal, ResolutionKind, Route, UserProfile};
    use session_sync_testing::{ReducerTest, assertions};

    type Combined = SessionReducer<MockNavigator, InMemoryRouteMemory>;

    #[test]
    fn test_resolution_success_moves_off_sign_in() {
        let mut state = SyncState::bootstrapping();
        state.navigation.current = Some(Route::new("/sign-in"));

        ReducerTest::new(Combined::new())
            .with_env(test_environment())
            .given_state(state)
            .when_actions([
                SessionAction::provider(ProviderSignal::authenticated()),
                SessionAction::ResolutionCompleted {
                    epoch: 0,
                    kind: ResolutionKind::Automatic,
                    result: Ok(UserProfile::new("u1", "Ada")),
                },
            ])
            .then_state(|s| {
                assert!(s.session.authenticated);
                assert_eq!(s.navigation.current, Some(Route::new("/home")));
                assert!(s.navigation.in_flight);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_has_delay_effect(effects, |a| {
                    *a == SessionAction::NavigationSettled
                });
            })
            .run();
    }

    #[test]
    fn test_no_redirect_while_resolving() {
        let mut state = SyncState::bootstrapping();
        state.navigation.current = Some(Route::new("/events/7"));

        ReducerTest::new(Combined::new())
            .with_env(test_environment())
            .given_state(state)
            .when_action(SessionAction::provider(ProviderSignal::authenticated()))
            .then_state(|s| {
                assert!(s.session.loading);
                assert!(!s.navigation.in_flight);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }
}
