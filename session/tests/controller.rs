//! Integration tests for the synchronization controller
//!
//! Drives the full store (reducers, effects, feedback) against mock
//! collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use proptest::prelude::*;
use session_sync::mocks::{
    MockIdentityProvider, MockNavigator, MockProfileResolver, live_environment, test_config,
};
use session_sync::{
    InMemoryRouteMemory, ProfileResolver, ProfileResult, ProviderSignal, RetryPolicy, Route,
    SessionClient, SessionEnvironment, SessionError, SyncConfig, SyncPhase, Token, UserProfile,
};
use session_sync_testing::helpers::init_test_tracing;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Fixtures
// ============================================================================

type Client = SessionClient<MockNavigator, InMemoryRouteMemory>;

const IDLE: Duration = Duration::from_secs(2);

fn client_with(
    identity: MockIdentityProvider,
    resolver: MockProfileResolver,
    config: SyncConfig,
) -> (Client, MockNavigator) {
    let env = live_environment(identity, resolver, config);
    let navigator = env.navigator.clone();
    (SessionClient::new(env), navigator)
}

fn client(resolver: MockProfileResolver) -> (Client, MockNavigator) {
    client_with(MockIdentityProvider::new(), resolver, test_config())
}

async fn signal(client: &Client, signal: ProviderSignal) {
    client.provider_changed(signal).await;
    client.wait_idle(IDLE).await.unwrap();
}

fn transport_error() -> ProfileResult {
    ProfileResult::TransportError("503 Service Unavailable".into())
}

// ============================================================================
// Scenario
// ============================================================================

#[tokio::test]
async fn resolved_profile_redirects_from_sign_in_to_home() {
    init_test_tracing();
    let identity = MockIdentityProvider::new().with_identity_token(Some(Token::new("tok-1")));
    let resolver = MockProfileResolver::always(ProfileResult::Found(UserProfile::new("u1", "Ada")));
    let (client, navigator) = client_with(identity, resolver.clone(), test_config());

    client.route_changed(Route::new("/sign-in")).await;
    signal(&client, ProviderSignal::authenticated()).await;

    let session = client.get_session().await;
    assert!(session.authenticated);
    assert!(!session.loading);
    assert_eq!(session.error, None);
    let user = session.user.unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.name, "Ada");

    assert_eq!(resolver.tokens(), vec!["tok-1"]);
    assert_eq!(navigator.redirects(), vec![Route::new("/home")]);
    assert_eq!(client.phase().await, SyncPhase::Resolved);
}

// ============================================================================
// No duplicate resolution
// ============================================================================

#[tokio::test]
async fn repeated_signals_while_in_flight_resolve_once() {
    let (resolver, gate) = MockProfileResolver::new().gated();
    let (client, _) = client(resolver.clone());

    for _ in 0..10 {
        client.provider_changed(ProviderSignal::authenticated()).await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(resolver.calls(), 1);
    assert_eq!(client.phase().await, SyncPhase::Resolving);
    assert!(client.get_session().await.loading);

    gate.open();
    client.wait_idle(IDLE).await.unwrap();

    assert_eq!(resolver.calls(), 1);
    assert!(client.get_session().await.authenticated);
}

fn non_resetting_signal() -> impl Strategy<Value = ProviderSignal> {
    prop_oneof![
        Just(ProviderSignal::authenticated()),
        Just(ProviderSignal {
            authenticated: true,
            loading: true,
            error: None,
        }),
        Just(ProviderSignal::authenticated().with_error("flaky network")),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_signal_bursts_never_duplicate_resolution(
        burst in proptest::collection::vec(non_resetting_signal(), 1..16),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (calls_in_flight, calls_total, authenticated) = runtime.block_on(async {
            let (resolver, gate) = MockProfileResolver::new().gated();
            let (client, _) = client(resolver.clone());

            client.provider_changed(ProviderSignal::authenticated()).await;
            for signal in burst {
                client.provider_changed(signal).await;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            let in_flight = resolver.calls();

            gate.open();
            client.provider_changed(ProviderSignal::authenticated()).await;
            client.wait_idle(IDLE).await.unwrap();

            (in_flight, resolver.calls(), client.get_session().await.authenticated)
        });

        prop_assert_eq!(calls_in_flight, 1);
        prop_assert_eq!(calls_total, 1);
        prop_assert!(authenticated);
    }
}

// ============================================================================
// Retry ceiling
// ============================================================================

#[tokio::test]
async fn retry_ceiling_stops_after_three_attempts_and_resets_on_fresh_sign_in() {
    let identity = MockIdentityProvider::new();
    let resolver = MockProfileResolver::always(transport_error());
    let (client, _) = client_with(identity.clone(), resolver.clone(), test_config());

    for _ in 0..6 {
        signal(&client, ProviderSignal::authenticated()).await;
    }

    assert_eq!(resolver.calls(), 3);
    let session = client.get_session().await;
    assert!(!session.authenticated);
    assert_eq!(
        session.error.as_deref(),
        Some(SessionError::MaxRetriesExceeded { attempts: 3 }.to_string().as_str())
    );
    assert_eq!(client.phase().await, SyncPhase::RetriesExhausted);

    signal(&client, ProviderSignal::unauthenticated()).await;
    assert_eq!(client.snapshot().await.attempt.retry_count, 0);
    assert_eq!(client.get_session().await.error, None);

    for _ in 0..6 {
        signal(&client, ProviderSignal::authenticated()).await;
    }
    assert_eq!(resolver.calls(), 6);
    assert_eq!(identity.identity_token_fetches(), 6);
}

#[tokio::test]
async fn failure_below_ceiling_shows_attempt_message() {
    let resolver = MockProfileResolver::new().then([transport_error()]);
    let (client, _) = client(resolver.clone());

    signal(&client, ProviderSignal::authenticated()).await;
    let session = client.get_session().await;
    assert!(session.error.unwrap().contains("attempt 1 of 3"));
    assert_eq!(client.phase().await, SyncPhase::ResolutionFailed);

    signal(&client, ProviderSignal::authenticated()).await;
    let session = client.get_session().await;
    assert!(session.authenticated);
    assert_eq!(session.error, None);
    assert_eq!(client.snapshot().await.attempt.retry_count, 0);
    assert_eq!(resolver.calls(), 2);
}

#[tokio::test]
async fn configured_ceiling_is_respected() {
    let resolver = MockProfileResolver::always(transport_error());
    let config = test_config().with_retry(RetryPolicy::new(5));
    let (client, _) = client_with(MockIdentityProvider::new(), resolver.clone(), config);

    for _ in 0..8 {
        signal(&client, ProviderSignal::authenticated()).await;
    }

    assert_eq!(resolver.calls(), 5);
}

#[tokio::test]
async fn retry_delay_retries_without_new_signals() {
    let resolver = MockProfileResolver::new().then([transport_error(), transport_error()]);
    let config = test_config()
        .with_retry(RetryPolicy::default().with_retry_delay(Duration::from_millis(10)));
    let (client, _) = client_with(MockIdentityProvider::new(), resolver.clone(), config);

    signal(&client, ProviderSignal::authenticated()).await;

    assert_eq!(resolver.calls(), 3);
    assert!(client.get_session().await.authenticated);
}

#[tokio::test]
async fn missing_token_counts_as_failed_attempt() {
    let identity = MockIdentityProvider::new().with_identity_token(None);
    let resolver = MockProfileResolver::new();
    let (client, _) = client_with(identity, resolver.clone(), test_config());

    signal(&client, ProviderSignal::authenticated()).await;

    assert_eq!(resolver.calls(), 0);
    assert_eq!(client.snapshot().await.attempt.retry_count, 1);
    let error = client.get_session().await.error.unwrap();
    assert!(error.contains("token unavailable"), "{error}");
}

// ============================================================================
// Not found
// ============================================================================

#[tokio::test]
async fn not_found_redirects_to_sign_up_without_retrying() {
    let resolver = MockProfileResolver::always(ProfileResult::NotFound);
    let (client, navigator) = client(resolver.clone());

    client.route_changed(Route::new("/callback")).await;
    signal(&client, ProviderSignal::authenticated()).await;

    assert_eq!(resolver.calls(), 1);
    assert_eq!(client.snapshot().await.attempt.retry_count, 0);
    assert_eq!(navigator.redirects(), vec![Route::new("/sign-up")]);
    assert_eq!(client.phase().await, SyncPhase::ProfileNotFound);

    signal(&client, ProviderSignal::authenticated()).await;
    assert_eq!(resolver.calls(), 1);
    assert_eq!(navigator.redirects().len(), 1);
}

// ============================================================================
// Stale responses
// ============================================================================

#[tokio::test]
async fn late_success_after_sign_out_is_discarded() {
    let (resolver, gate) = MockProfileResolver::new().gated();
    let (client, _) = client(resolver.clone());

    client.provider_changed(ProviderSignal::authenticated()).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(resolver.calls(), 1);

    client.provider_changed(ProviderSignal::unauthenticated()).await;
    gate.open();
    client.wait_idle(IDLE).await.unwrap();

    let session = client.get_session().await;
    assert!(!session.authenticated);
    assert_eq!(session.user, None);
    assert!(!session.loading);
}

#[tokio::test]
async fn late_success_from_previous_identity_does_not_leak_into_new_one() {
    let (resolver, gate) = MockProfileResolver::new().gated();
    let (client, _) = client(resolver.clone());

    client.provider_changed(ProviderSignal::authenticated()).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    client.provider_changed(ProviderSignal::unauthenticated()).await;
    client.provider_changed(ProviderSignal::authenticated()).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(resolver.calls(), 2);

    gate.open();
    client.wait_idle(IDLE).await.unwrap();

    // Only the second resolution belongs to the current epoch.
    let state = client.snapshot().await;
    assert!(state.session.authenticated);
    assert!(!state.attempt.in_progress);
    assert_eq!(state.attempt.epoch, 1);
}

// ============================================================================
// Provider failures
// ============================================================================

#[tokio::test]
async fn provider_error_is_surfaced_without_signing_out() {
    let (client, _) = client(MockProfileResolver::new());
    signal(&client, ProviderSignal::authenticated()).await;

    signal(
        &client,
        ProviderSignal::authenticated().with_error("provider unreachable"),
    )
    .await;

    let session = client.get_session().await;
    assert!(session.authenticated);
    assert!(session.error.unwrap().contains("provider unreachable"));
}

#[tokio::test]
async fn failed_sign_in_handoff_is_reported() {
    let identity = MockIdentityProvider::new().failing_sign_in("popup blocked");
    let (client, _) = client_with(identity.clone(), MockProfileResolver::new(), test_config());
    signal(&client, ProviderSignal::unauthenticated()).await;

    client.sign_in().await;
    client.wait_idle(IDLE).await.unwrap();

    assert_eq!(identity.sign_in_calls(), vec!["https://app.test/callback"]);
    let session = client.get_session().await;
    assert!(!session.authenticated);
    assert!(session.error.unwrap().contains("popup blocked"));
}

struct PanickingResolver;

impl ProfileResolver for PanickingResolver {
    fn resolve(&self, token: &Token) -> impl Future<Output = ProfileResult> + Send {
        let token = token.clone();
        async move {
            if !token.as_str().is_empty() {
                panic!("resolver bug");
            }
            ProfileResult::NotFound
        }
    }
}

#[tokio::test]
async fn panicking_resolver_clears_in_progress() {
    let env = SessionEnvironment::new(
        Arc::new(session_sync::LivePipeline::new(
            MockIdentityProvider::new(),
            PanickingResolver,
        )),
        MockNavigator::new(),
        InMemoryRouteMemory::new(),
        test_config(),
    );
    let client = SessionClient::new(env);

    signal(&client, ProviderSignal::authenticated()).await;

    let state = client.snapshot().await;
    assert!(!state.attempt.in_progress);
    assert_eq!(state.attempt.retry_count, 1);
    assert!(!state.session.loading);
}
