//! Synchronization controller.
//!
//! Reacts to the identity provider's signal triple and to user requests,
//! drives profile resolution and applies the retry policy.
//!
//! # Guarantees
//!
//! - At most one resolution is in flight: `attempt.in_progress` is set when
//!   one starts and cleared on every completion of the current epoch.
//! - A result is committed only if it belongs to the current epoch and the
//!   provider still reports authenticated. Unauthenticated signals and
//!   sign-out open a new epoch.
//! - Automatic failures count against `max_retries`; manual refreshes and
//!   "no account" answers do not.

use crate::actions::SessionAction;
use crate::environment::SessionEnvironment;
use crate::error::SessionError;
use crate::pipeline::{SignInPlan, SignOutPlan};
use crate::providers::{Navigator, RouteMemory};
use crate::state::{ProviderSignal, ResolutionKind, SessionPatch, SyncState, UserProfile};
use futures::FutureExt;
use session_sync_core::{SmallVec, delay, effect::Effect, reducer::Reducer, smallvec};
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;

type Effects = SmallVec<[Effect<SessionAction>; 4]>;

/// Synchronization controller reducer.
pub struct SyncReducer<N, M> {
    _marker: PhantomData<fn() -> (N, M)>,
}

impl<N, M> SyncReducer<N, M>
where
    N: Navigator + Clone + 'static,
    M: RouteMemory + Clone + 'static,
{
    /// Create a new sync reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn on_provider_changed(
        state: &mut SyncState,
        signal: ProviderSignal,
        env: &SessionEnvironment<N, M>,
    ) -> Effects {
        if env.pipeline.is_bypass() {
            tracing::debug!(?signal, "Bypass pipeline active, ignoring provider signal");
            return smallvec![Effect::None];
        }

        let provider_error = signal
            .error
            .clone()
            .map(|message| SessionError::Provider(message).to_string());
        if let Some(message) = &provider_error {
            tracing::warn!(error = %message, "Identity provider reported an error");
            metrics::counter!("session.provider.errors").increment(1);
            state.session.apply(SessionPatch::error(message.clone()));
        }

        state.provider = signal;

        if state.provider.loading {
            state.sync_loading();
            return smallvec![Effect::None];
        }

        if !state.provider.authenticated {
            tracing::debug!(epoch = state.attempt.epoch, "Provider unauthenticated, clearing session");
            state.attempt.reset();
            state.profile_missing = false;
            state.session.apply(SessionPatch {
                error: Some(provider_error),
                ..SessionPatch::cleared()
            });
            state.sync_loading();
            return smallvec![Effect::None];
        }

        Self::trigger_automatic(state, env)
    }

    /// Start an automatic resolution unless something rules it out.
    fn trigger_automatic(state: &mut SyncState, env: &SessionEnvironment<N, M>) -> Effects {
        if let Some(reason) = Self::automatic_blocked(state, env) {
            if state.attempt.in_progress {
                metrics::counter!("session.resolution.suppressed").increment(1);
            }
            tracing::trace!(reason, "Not starting resolution");
            state.sync_loading();
            return smallvec![Effect::None];
        }

        Self::start_resolution(state, env, ResolutionKind::Automatic)
    }

    fn automatic_blocked(
        state: &SyncState,
        env: &SessionEnvironment<N, M>,
    ) -> Option<&'static str> {
        let attempt = &state.attempt;
        if !state.provider.authenticated || state.provider.loading {
            Some("provider not ready")
        } else if attempt.in_progress {
            Some("resolution already in flight")
        } else if attempt.awaiting_sign_out {
            Some("sign-out pending")
        } else if state.session.authenticated {
            Some("already resolved")
        } else if state.profile_missing {
            Some("identity has no account")
        } else if attempt.exhausted || attempt.retry_count >= env.config.retry.ceiling() {
            Some("retry ceiling reached")
        } else {
            None
        }
    }

    fn start_resolution(
        state: &mut SyncState,
        env: &SessionEnvironment<N, M>,
        kind: ResolutionKind,
    ) -> Effects {
        let epoch = state.attempt.epoch;
        state.attempt.in_progress = true;
        state.sync_loading();

        metrics::counter!("session.resolution.started", "kind" => kind_label(kind)).increment(1);
        tracing::debug!(epoch, ?kind, retry_count = state.attempt.retry_count, "Starting profile resolution");

        let resolution = env.pipeline.resolve_profile();
        smallvec![Effect::Future(Box::pin(async move {
            let result = AssertUnwindSafe(resolution)
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(SessionError::ResolutionTransport(
                        "profile resolution panicked".to_string(),
                    ))
                });
            Some(SessionAction::ResolutionCompleted {
                epoch,
                kind,
                result,
            })
        }))]
    }

    fn on_resolution_completed(
        state: &mut SyncState,
        epoch: u64,
        kind: ResolutionKind,
        result: Result<UserProfile, SessionError>,
        env: &SessionEnvironment<N, M>,
    ) -> Effects {
        if epoch != state.attempt.epoch {
            tracing::info!(epoch, current = state.attempt.epoch, "Discarding stale resolution result");
            metrics::counter!("session.resolution.outcome", "outcome" => "stale").increment(1);
            return smallvec![Effect::None];
        }

        state.attempt.in_progress = false;

        if !Self::identity_present(state, env) {
            tracing::info!(epoch, "Provider no longer authenticated, discarding resolution result");
            metrics::counter!("session.resolution.outcome", "outcome" => "stale").increment(1);
            state.sync_loading();
            return smallvec![Effect::None];
        }

        let outcome = match &result {
            Ok(_) => "found",
            Err(error) => error.kind(),
        };
        metrics::counter!("session.resolution.outcome", "outcome" => outcome).increment(1);

        let effects = match result {
            Ok(profile) => {
                tracing::info!(user_id = %profile.id, ?kind, "Profile resolved");
                state.attempt.retry_count = 0;
                state.attempt.exhausted = false;
                state.profile_missing = false;
                state
                    .session
                    .apply(SessionPatch::resolved(profile, env.clock.now()));
                smallvec![Effect::None]
            },
            Err(error) if error.is_not_found() => {
                tracing::info!(?kind, "Identity has no application account");
                state.profile_missing = true;
                state.session.apply(SessionPatch::cleared());
                smallvec![Effect::None]
            },
            Err(error) => match kind {
                ResolutionKind::Manual { .. } => {
                    tracing::warn!(%error, "Manual profile refresh failed");
                    state
                        .session
                        .apply(SessionPatch::error(format!("We couldn't refresh your profile: {error}")));
                    smallvec![Effect::None]
                },
                ResolutionKind::Automatic => Self::on_automatic_failure(state, error, env),
            },
        };

        state.sync_loading();
        effects
    }

    fn on_automatic_failure(
        state: &mut SyncState,
        error: SessionError,
        env: &SessionEnvironment<N, M>,
    ) -> Effects {
        let policy = &env.config.retry;

        if !policy.is_retryable(&error) {
            tracing::error!(%error, "Profile resolution failed with a non-retryable error");
            state.attempt.exhausted = true;
            state.session.apply(SessionPatch::error(error.to_string()));
            return smallvec![Effect::None];
        }

        state.attempt.retry_count += 1;
        let attempts = state.attempt.retry_count;

        if attempts >= policy.ceiling() {
            tracing::error!(attempts, %error, "Giving up on automatic profile resolution");
            metrics::counter!("session.resolution.exhausted").increment(1);
            state.attempt.exhausted = true;
            state.session.apply(SessionPatch::error(
                SessionError::MaxRetriesExceeded { attempts }.to_string(),
            ));
            return smallvec![Effect::None];
        }

        tracing::warn!(attempts, max = policy.ceiling(), %error, "Profile resolution failed");
        state.session.apply(SessionPatch::error(format!(
            "We couldn't load your profile (attempt {attempts} of {}): {error}",
            policy.ceiling()
        )));

        match policy.retry_delay {
            Some(duration) => smallvec![delay! {
                duration: duration,
                action: SessionAction::RetryResolution
            }],
            None => smallvec![Effect::None],
        }
    }

    fn on_sign_in(state: &mut SyncState, env: &SessionEnvironment<N, M>) -> Effects {
        state.attempt.awaiting_sign_out = false;

        match env.pipeline.sign_in(env.config.callback_url()) {
            SignInPlan::Redirect(begin) => {
                tracing::info!("Delegating sign-in to identity provider");
                smallvec![Effect::Future(Box::pin(async move {
                    begin
                        .await
                        .err()
                        .map(|error| SessionAction::ProviderFailed { error })
                }))]
            },
            SignInPlan::Session(profile) => {
                tracing::info!(user_id = %profile.id, "Installing bypass session");
                state.attempt.retry_count = 0;
                state.attempt.exhausted = false;
                state.profile_missing = false;
                state
                    .session
                    .apply(SessionPatch::resolved(profile, env.clock.now()));
                state.sync_loading();
                state.navigation.requested = Some(env.config.routes.home.clone());
                smallvec![Effect::None]
            },
        }
    }

    fn on_sign_out(state: &mut SyncState, env: &SessionEnvironment<N, M>) -> Effects {
        tracing::info!(epoch = state.attempt.epoch, "Signing out");
        metrics::counter!("session.sign_out").increment(1);

        state.attempt.reset();
        state.profile_missing = false;
        state.session.apply(SessionPatch::cleared());

        let effects = match env.pipeline.sign_out(env.config.sign_out_url()) {
            SignOutPlan::Redirect(end) => {
                state.attempt.awaiting_sign_out = true;
                smallvec![Effect::Future(Box::pin(async move {
                    end.await
                        .err()
                        .map(|error| SessionAction::ProviderFailed { error })
                }))]
            },
            SignOutPlan::Local => {
                state.navigation.requested = Some(env.config.routes.sign_in.clone());
                smallvec![Effect::None]
            },
        };

        state.sync_loading();
        effects
    }

    fn on_refresh(
        state: &mut SyncState,
        request: u64,
        env: &SessionEnvironment<N, M>,
    ) -> Effects {
        let skip = if !Self::identity_present(state, env) {
            Some("not signed in")
        } else if state.attempt.in_progress {
            Some("resolution already in flight")
        } else {
            None
        };

        if let Some(reason) = skip {
            tracing::debug!(request, reason, "Skipping profile refresh");
            return smallvec![Effect::Future(Box::pin(async move {
                Some(SessionAction::RefreshSkipped { request })
            }))];
        }

        // An account may exist by now (sign-up finished).
        state.profile_missing = false;
        Self::start_resolution(state, env, ResolutionKind::Manual { request })
    }

    /// The identity a resolution would belong to is still signed in.
    ///
    /// Live: the provider says so and no sign-out is pending. Bypass: the
    /// sandbox session is installed.
    fn identity_present(state: &SyncState, env: &SessionEnvironment<N, M>) -> bool {
        if env.pipeline.is_bypass() {
            state.session.authenticated
        } else {
            state.provider.authenticated && !state.attempt.awaiting_sign_out
        }
    }
}

const fn kind_label(kind: ResolutionKind) -> &'static str {
    match kind {
        ResolutionKind::Automatic => "automatic",
        ResolutionKind::Manual { .. } => "manual",
    }
}

impl<N, M> Default for SyncReducer<N, M>
where
    N: Navigator + Clone + 'static,
    M: RouteMemory + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, M> Clone for SyncReducer<N, M> {
    fn clone(&self) -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<N, M> std::fmt::Debug for SyncReducer<N, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SyncReducer")
    }
}

impl<N, M> Reducer for SyncReducer<N, M>
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
            // ═══════════════════════════════════════════════════════════════
            // Provider signals
            // ═══════════════════════════════════════════════════════════════
            SessionAction::ProviderChanged { signal } => {
                Self::on_provider_changed(state, signal, env)
            },

            SessionAction::ProviderFailed { error } => {
                tracing::warn!(%error, "Identity provider operation failed");
                metrics::counter!("session.provider.errors").increment(1);
                state.session.apply(SessionPatch::error(error.to_string()));
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // User requests
            // ═══════════════════════════════════════════════════════════════
            SessionAction::SignIn => Self::on_sign_in(state, env),

            SessionAction::SignOut => Self::on_sign_out(state, env),

            SessionAction::RefreshUser { request } => Self::on_refresh(state, request, env),

            // ═══════════════════════════════════════════════════════════════
            // Resolution
            // ═══════════════════════════════════════════════════════════════
            SessionAction::RetryResolution => Self::trigger_automatic(state, env),

            SessionAction::ResolutionCompleted {
                epoch,
                kind,
                result,
            } => Self::on_resolution_completed(state, epoch, kind, result, env),

            SessionAction::RefreshSkipped { .. }
            | SessionAction::RouteChanged { .. }
            | SessionAction::NavigationSettled => smallvec![Effect::None],
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::mocks::{test_environment, MockNavigator};
    use crate::pipeline::BypassPipeline;
    use crate::providers::InMemoryRouteMemory;
    use crate::state::SyncPhase;
    use session_sync_core::environment::Clock;
    use session_sync_testing::effects::drain_all;
    use session_sync_testing::{ReducerTest, assertions, test_clock};
    use std::sync::Arc;
    use std::time::Duration;

    type Controller = SyncReducer<MockNavigator, InMemoryRouteMemory>;

    fn resolving() -> SyncState {
        let mut state = SyncState::bootstrapping();
        state.provider = ProviderSignal::authenticated();
        state.attempt.in_progress = true;
        state.sync_loading();
        state
    }

    fn completed(epoch: u64, result: Result<UserProfile, SessionError>) -> SessionAction {
        SessionAction::ResolutionCompleted {
            epoch,
            kind: ResolutionKind::Automatic,
            result,
        }
    }

    #[test]
    fn test_bootstrapping_takes_no_action() {
        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(SyncState::bootstrapping())
            .when_action(SessionAction::provider(ProviderSignal::bootstrapping()))
            .then_state(|s| {
                assert!(s.session.loading);
                assert!(!s.attempt.in_progress);
                assert_eq!(s.phase(), SyncPhase::Bootstrapping);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_authenticated_signal_starts_resolution() {
        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(SyncState::bootstrapping())
            .when_action(SessionAction::provider(ProviderSignal::authenticated()))
            .then_state(|s| {
                assert!(s.attempt.in_progress);
                assert!(s.session.loading);
                assert_eq!(s.phase(), SyncPhase::Resolving);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_repeated_signal_while_in_flight_is_ignored() {
        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(resolving())
            .when_action(SessionAction::provider(ProviderSignal::authenticated()))
            .then_state(|s| assert!(s.attempt.in_progress))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_success_commits_profile() {
        let env = test_environment().with_clock(Arc::new(test_clock()));

        ReducerTest::new(Controller::new())
            .with_env(env)
            .given_state(resolving())
            .when_action(completed(0, Ok(UserProfile::new("u1", "Ada"))))
            .then_state(|s| {
                assert!(s.session.authenticated);
                assert!(!s.session.loading);
                assert_eq!(s.session.error, None);
                assert_eq!(s.session.user.as_ref().unwrap().name, "Ada");
                assert_eq!(s.session.synced_at, Some(test_clock().now()));
                assert_eq!(s.attempt.retry_count, 0);
                assert!(!s.attempt.in_progress);
            })
            .run();
    }

    #[test]
    fn test_transport_failure_counts_attempt() {
        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(resolving())
            .when_action(completed(
                0,
                Err(SessionError::ResolutionTransport("503".into())),
            ))
            .then_state(|s| {
                assert_eq!(s.attempt.retry_count, 1);
                assert!(!s.attempt.in_progress);
                assert!(!s.session.authenticated);
                let error = s.session.error.as_deref().unwrap();
                assert!(error.contains("attempt 1 of 3"), "{error}");
                assert_eq!(s.phase(), SyncPhase::ResolutionFailed);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_third_failure_is_terminal() {
        let mut state = resolving();
        state.attempt.retry_count = 2;

        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(state)
            .when_action(completed(0, Err(SessionError::TokenUnavailable)))
            .then_state(|s| {
                assert_eq!(s.attempt.retry_count, 3);
                assert!(s.attempt.exhausted);
                assert_eq!(
                    s.session.error.as_deref(),
                    Some(SessionError::MaxRetriesExceeded { attempts: 3 }.to_string().as_str())
                );
                assert_eq!(s.phase(), SyncPhase::RetriesExhausted);
            })
            .run();
    }

    #[test]
    fn test_zero_ceiling_still_attempts_once() {
        let mut env = test_environment();
        let mut config = (*env.config).clone();
        config.retry.max_retries = 0;
        env.config = Arc::new(config);

        ReducerTest::new(Controller::new())
            .with_env(env)
            .given_state(SyncState::bootstrapping())
            .when_actions([
                SessionAction::provider(ProviderSignal::authenticated()),
                completed(0, Err(SessionError::TokenUnavailable)),
            ])
            .then_state(|s| {
                assert_eq!(s.attempt.retry_count, 1);
                assert!(s.attempt.exhausted);
                assert_eq!(s.phase(), SyncPhase::RetriesExhausted);
            })
            .run();
    }

    #[test]
    fn test_exhausted_blocks_further_signals() {
        let mut state = SyncState::bootstrapping();
        state.provider = ProviderSignal::authenticated();
        state.attempt.retry_count = 3;
        state.attempt.exhausted = true;

        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(state)
            .when_action(SessionAction::provider(ProviderSignal::authenticated()))
            .then_state(|s| assert!(!s.attempt.in_progress))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_not_found_skips_retry_counter() {
        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(resolving())
            .when_action(completed(0, Err(SessionError::ProfileNotFound)))
            .then_state(|s| {
                assert_eq!(s.attempt.retry_count, 0);
                assert!(s.profile_missing);
                assert!(!s.session.authenticated);
                assert_eq!(s.session.error, None);
                assert_eq!(s.phase(), SyncPhase::ProfileNotFound);
            })
            .run();
    }

    #[test]
    fn test_unauthenticated_signal_resets_attempt_and_discards_late_success() {
        let mut state = resolving();
        state.attempt.retry_count = 2;

        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(state)
            .when_actions([
                SessionAction::provider(ProviderSignal::unauthenticated()),
                completed(0, Ok(UserProfile::new("u1", "Ada"))),
            ])
            .then_state(|s| {
                assert!(!s.session.authenticated);
                assert_eq!(s.session.user, None);
                assert_eq!(s.attempt.retry_count, 0);
                assert_eq!(s.attempt.epoch, 1);
                assert!(!s.attempt.in_progress);
            })
            .run();
    }

    #[test]
    fn test_provider_error_keeps_authenticated() {
        let mut state = SyncState::bootstrapping();
        state.provider = ProviderSignal::authenticated();
        state.session.apply(SessionPatch::resolved(
            UserProfile::new("u1", "Ada"),
            chrono::Utc::now(),
        ));

        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(state)
            .when_action(SessionAction::provider(
                ProviderSignal::authenticated().with_error("network unreachable"),
            ))
            .then_state(|s| {
                assert!(s.session.authenticated);
                assert!(s.session.user.is_some());
                assert!(s.session.error.as_deref().unwrap().contains("network unreachable"));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_retry_delay_schedules_retry() {
        let mut env = test_environment();
        let config = (*env.config)
            .clone()
            .with_retry(crate::config::RetryPolicy::default().with_retry_delay(Duration::from_millis(5)));
        env.config = Arc::new(config);

        ReducerTest::new(Controller::new())
            .with_env(env)
            .given_state(resolving())
            .when_action(completed(0, Err(SessionError::TokenUnavailable)))
            .then_effects(|effects| {
                assertions::assert_has_delay_effect(effects, |a| {
                    *a == SessionAction::RetryResolution
                });
            })
            .run();
    }

    #[test]
    fn test_manual_failure_leaves_counter_alone() {
        let mut state = resolving();
        state.session.authenticated = true;
        state.session.user = Some(UserProfile::new("u1", "Ada"));

        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(state)
            .when_action(SessionAction::ResolutionCompleted {
                epoch: 0,
                kind: ResolutionKind::Manual { request: 0 },
                result: Err(SessionError::ResolutionTransport("timeout".into())),
            })
            .then_state(|s| {
                assert_eq!(s.attempt.retry_count, 0);
                assert!(s.session.authenticated);
                assert!(s.session.error.as_deref().unwrap().contains("refresh"));
            })
            .run();
    }

    #[test]
    fn test_refresh_when_signed_out_is_skipped() {
        let env = test_environment();
        let mut state = SyncState::signed_out();

        let effects =
            Controller::new().reduce(&mut state, SessionAction::RefreshUser { request: 7 }, &env);

        assert!(!state.attempt.in_progress);
        let fed_back = tokio_test::block_on(drain_all(effects));
        assert_eq!(fed_back, vec![SessionAction::RefreshSkipped { request: 7 }]);
    }

    #[test]
    fn test_refresh_after_missing_account_starts_manual_resolution() {
        let mut state = SyncState::bootstrapping();
        state.provider = ProviderSignal::authenticated();
        state.profile_missing = true;
        state.session.loading = false;

        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(state)
            .when_action(SessionAction::RefreshUser { request: 3 })
            .then_state(|s| {
                assert!(s.attempt.in_progress);
                assert!(!s.profile_missing);
                assert_eq!(s.phase(), SyncPhase::Resolving);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_manual_success_after_missing_account_authenticates() {
        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(resolving())
            .when_action(SessionAction::ResolutionCompleted {
                epoch: 0,
                kind: ResolutionKind::Manual { request: 3 },
                result: Ok(UserProfile::new("u1", "Ada")),
            })
            .then_state(|s| {
                assert!(s.session.authenticated);
                assert_eq!(s.phase(), SyncPhase::Resolved);
            })
            .run();
    }

    #[test]
    fn test_sign_out_opens_new_epoch_and_waits_for_provider() {
        let mut state = resolving();
        state.session.authenticated = true;

        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(state)
            .when_action(SessionAction::SignOut)
            .then_state(|s| {
                assert!(!s.session.authenticated);
                assert_eq!(s.attempt.epoch, 1);
                assert!(s.attempt.awaiting_sign_out);
                assert!(!s.attempt.in_progress);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn test_authenticated_signal_after_sign_out_does_not_resurrect() {
        let mut state = SyncState::bootstrapping();
        state.provider = ProviderSignal::authenticated();
        state.attempt.awaiting_sign_out = true;

        ReducerTest::new(Controller::new())
            .with_env(test_environment())
            .given_state(state)
            .when_action(SessionAction::provider(ProviderSignal::authenticated()))
            .then_state(|s| assert!(!s.attempt.in_progress))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_bypass_sign_in_is_synchronous() {
        let mut env = test_environment();
        env.pipeline = Arc::new(BypassPipeline::default());

        ReducerTest::new(Controller::new())
            .with_env(env)
            .given_state(SyncState::signed_out())
            .when_action(SessionAction::SignIn)
            .then_state(|s| {
                assert!(s.session.authenticated);
                assert!(!s.session.loading);
                assert_eq!(
                    s.session.user.as_ref().unwrap().id,
                    crate::constants::bypass::USER_ID
                );
                assert_eq!(s.navigation.requested.as_ref().unwrap().as_str(), "/home");
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_bypass_ignores_provider_signals() {
        let mut env = test_environment();
        env.pipeline = Arc::new(BypassPipeline::default());

        ReducerTest::new(Controller::new())
            .with_env(env)
            .given_state(SyncState::signed_out())
            .when_action(SessionAction::provider(ProviderSignal::authenticated()))
            .then_state(|s| {
                assert!(!s.session.authenticated);
                assert!(!s.attempt.in_progress);
                assert!(!s.session.loading);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
