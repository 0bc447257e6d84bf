//! Navigation guard.
//!
//! Maps session state and the current route to at most one redirect at a
//! time. After each redirect the guard stays quiet until the settle window
//! closes (`NavigationSettled`), then looks again.

use crate::actions::SessionAction;
use crate::config::RoutePolicy;
use crate::environment::SessionEnvironment;
use crate::providers::{Navigator, RouteMemory};
use crate::state::{Route, SessionState, SyncState};
use session_sync_core::{SmallVec, async_effect, delay, effect::Effect, reducer::Reducer, smallvec};
use std::marker::PhantomData;

type Effects = SmallVec<[Effect<SessionAction>; 4]>;

/// Where the policy table says to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// Unauthenticated user off the auth flow.
    SignIn,
    /// Identity without an application account.
    SignUp,
    /// Authenticated user still on sign-in or callback: intended route or home.
    AfterSignIn,
}

/// The guard's policy table.
///
/// | Condition | Redirect |
/// |---|---|
/// | `loading` | none |
/// | no account for the identity | sign-up |
/// | unauthenticated, route outside the auth flow | sign-in |
/// | authenticated, route is sign-in or callback | intended route or home |
#[must_use]
pub fn decide(
    session: &SessionState,
    profile_missing: bool,
    current: &Route,
    routes: &RoutePolicy,
) -> Option<Redirect> {
    if session.loading {
        None
    } else if profile_missing {
        (*current != routes.sign_up).then_some(Redirect::SignUp)
    } else if !session.authenticated {
        (!routes.is_auth_route(current)).then_some(Redirect::SignIn)
    } else if routes.is_sign_in_flow(current) {
        Some(Redirect::AfterSignIn)
    } else {
        None
    }
}

/// Navigation guard reducer.
pub struct NavigationGuard<N, M> {
    _marker: PhantomData<fn() -> (N, M)>,
}

impl<N, M> NavigationGuard<N, M>
where
    N: Navigator + Clone + 'static,
    M: RouteMemory + Clone + 'static,
{
    /// Create a new navigation guard.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Re-run the policy against the current state.
    pub fn evaluate(&self, state: &mut SyncState, env: &SessionEnvironment<N, M>) -> Effects {
        let routes = &env.config.routes;
        let nav = &state.navigation;

        if nav.in_flight {
            let wants_redirect = nav.requested.is_some()
                || nav.current.as_ref().is_some_and(|current| {
                    decide(&state.session, state.profile_missing, current, routes).is_some()
                });
            if wants_redirect {
                tracing::trace!("Redirect suppressed, previous one still settling");
                metrics::counter!("session.navigation.suppressed").increment(1);
            }
            return smallvec![Effect::None];
        }

        let mut persist = None;
        let target = if let Some(requested) = state.navigation.requested.take() {
            requested
        } else {
            let Some(current) = state.navigation.current.clone() else {
                return smallvec![Effect::None];
            };
            match decide(&state.session, state.profile_missing, &current, routes) {
                None => return smallvec![Effect::None],
                Some(Redirect::SignIn) => {
                    state.navigation.intended = Some(current.clone());
                    persist = Some(Self::remember(env, current));
                    routes.sign_in.clone()
                },
                Some(Redirect::SignUp) => routes.sign_up.clone(),
                Some(Redirect::AfterSignIn) => {
                    let intended = state.navigation.intended.take();
                    if intended.is_some() {
                        persist = Some(Self::forget(env));
                    }
                    intended
                        .filter(|intended| !routes.is_auth_route(intended))
                        .unwrap_or_else(|| routes.home.clone())
                },
            }
        };

        if state.navigation.current.as_ref() == Some(&target) {
            return persist.map_or_else(|| smallvec![Effect::None], |effect| smallvec![effect]);
        }

        let mut effects = Self::issue(state, env, target);
        effects.extend(persist);
        effects
    }

    fn remember(env: &SessionEnvironment<N, M>, route: Route) -> Effect<SessionAction> {
        let memory = env.route_memory.clone();
        async_effect! {
            memory.remember(route);
            None
        }
    }

    fn forget(env: &SessionEnvironment<N, M>) -> Effect<SessionAction> {
        let memory = env.route_memory.clone();
        async_effect! {
            memory.forget();
            None
        }
    }

    fn issue(state: &mut SyncState, env: &SessionEnvironment<N, M>, target: Route) -> Effects {
        tracing::info!(
            from = ?state.navigation.current.as_ref().map(Route::as_str),
            to = %target,
            "Redirecting"
        );
        metrics::counter!("session.navigation.redirects").increment(1);

        state.navigation.in_flight = true;
        state.navigation.current = Some(target.clone());

        let navigator = env.navigator.clone();
        smallvec![
            async_effect! {
                navigator.navigate(&target).await;
                None
            },
            delay! {
                duration: env.config.settle_delay,
                action: SessionAction::NavigationSettled
            },
        ]
    }
}

impl<N, M> Default for NavigationGuard<N, M>
where
    N: Navigator + Clone + 'static,
    M: RouteMemory + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, M> Clone for NavigationGuard<N, M> {
    fn clone(&self) -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<N, M> std::fmt::Debug for NavigationGuard<N, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NavigationGuard")
    }
}

impl<N, M> Reducer for NavigationGuard<N, M>
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
            SessionAction::RouteChanged { route } => {
                tracing::trace!(%route, "Route changed");
                state.navigation.current = Some(route);
                self.evaluate(state, env)
            },
            SessionAction::NavigationSettled => {
                state.navigation.in_flight = false;
                self.evaluate(state, env)
            },
            _ => self.evaluate(state, env),
        }
    }
}
