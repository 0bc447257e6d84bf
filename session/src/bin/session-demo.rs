//! Session sync demo.
//!
//! Drives a full sign-in → resolve → redirect → sign-out cycle against the
//! mock collaborators and prints each session snapshot.
//!
//! ```text
//! RUST_LOG=session_sync=debug cargo run --bin session-demo
//! SESSION_SYNC_SANDBOX=1 cargo run --bin session-demo   # bypass pipeline
//! ```

use session_sync::mocks::{MockIdentityProvider, MockNavigator, MockProfileResolver};
use session_sync::{
    EnvProbe, InMemoryRouteMemory, LivePipeline, ProviderSignal, Route, SessionClient,
    SessionEnvironment, SyncConfig, select_pipeline,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

type DemoClient = SessionClient<MockNavigator, InMemoryRouteMemory>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("session_sync=info")),
        )
        .init();

    let config = SyncConfig::from_env().with_settle_delay(Duration::from_millis(200));
    let identity = MockIdentityProvider::new();
    let live = Arc::new(LivePipeline::new(identity.clone(), MockProfileResolver::new()));
    let pipeline = select_pipeline(&EnvProbe, &config, live);
    let bypass = pipeline.is_bypass();

    let navigator = MockNavigator::new();
    let client = SessionClient::new(SessionEnvironment::new(
        pipeline,
        navigator.clone(),
        InMemoryRouteMemory::new(),
        config,
    ));

    let (signals, rx) = watch::channel(ProviderSignal::bootstrapping());
    let forwarder = client.attach(rx);

    client.route_changed(Route::new("/dashboard")).await;
    report(&client, "bootstrapping").await?;

    if !bypass {
        signals.send_replace(ProviderSignal::unauthenticated());
    }
    settle(&client).await?;
    report(&client, "signed out").await?;

    client.sign_in().await;
    if !bypass {
        // The provider redirects back to the callback and reports the user.
        client.route_changed(Route::new("/callback")).await;
        signals.send_replace(ProviderSignal::authenticated());
    }
    settle(&client).await?;
    report(&client, "signed in").await?;

    match client.get_access_token().await {
        Some(token) => println!("access token: {} chars", token.as_str().len()),
        None => println!("access token: unavailable"),
    }

    client.refresh_user().await?;
    report(&client, "refreshed").await?;

    client.sign_out().await;
    if !bypass {
        signals.send_replace(ProviderSignal::unauthenticated());
    }
    settle(&client).await?;
    report(&client, "signed out again").await?;

    println!("sign-in requests: {:?}", identity.sign_in_calls());
    println!(
        "redirects: {:?}",
        navigator
            .redirects()
            .iter()
            .map(Route::as_str)
            .collect::<Vec<_>>()
    );

    drop(signals);
    forwarder.await?;
    client.shutdown(IDLE_TIMEOUT).await?;
    Ok(())
}

/// Let resolutions finish and settle windows close.
async fn settle(client: &DemoClient) -> anyhow::Result<()> {
    tokio::time::sleep(Duration::from_millis(20)).await;
    client.wait_idle(IDLE_TIMEOUT).await?;
    Ok(())
}

async fn report(client: &DemoClient, label: &str) -> anyhow::Result<()> {
    let state = client.snapshot().await;
    println!(
        "── {label} ({:?}, route {:?})\n{}",
        state.phase(),
        state.navigation.current.as_ref().map(Route::as_str),
        serde_json::to_string_pretty(&state.session)?
    );
    Ok(())
}
