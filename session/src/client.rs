//! Session client.
//!
//! The application-facing surface: read the session, request sign-in,
//! sign-out and refresh, fetch access tokens. State changes only happen
//! inside the store's reducer.

use crate::actions::SessionAction;
use crate::environment::SessionEnvironment;
use crate::error::{Result, SessionError};
use crate::providers::{Navigator, RouteMemory};
use crate::reducers::SessionReducer;
use crate::state::{ProviderSignal, Route, SessionState, SyncPhase, SyncState, Token};
use futures::FutureExt;
use session_sync_runtime::Store;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Store specialised for session synchronization.
pub type SessionStore<N, M> =
    Store<SyncState, SessionAction, SessionEnvironment<N, M>, SessionReducer<N, M>>;

/// Handle to the process-wide session.
///
/// Cheap to clone; clones share one store.
pub struct SessionClient<N, M>
where
    N: Navigator + Clone + 'static,
    M: RouteMemory + Clone + 'static,
{
    store: SessionStore<N, M>,
    next_refresh: Arc<AtomicU64>,
}

impl<N, M> SessionClient<N, M>
where
    N: Navigator + Clone + 'static,
    M: RouteMemory + Clone + 'static,
{
    /// Create a client over a fresh store.
    ///
    /// With the live pipeline the session starts bootstrapping; with the
    /// bypass pipeline it starts signed out and stays that way until
    /// [`sign_in`](Self::sign_in). An intended route persisted by an
    /// earlier run is picked up from the route memory.
    #[must_use]
    pub fn new(env: SessionEnvironment<N, M>) -> Self {
        let mut initial = if env.pipeline.is_bypass() {
            SyncState::signed_out()
        } else {
            SyncState::bootstrapping()
        };
        initial.navigation.intended = env.route_memory.recall();
        Self {
            store: Store::new(initial, SessionReducer::new(), env),
            next_refresh: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Snapshot of the session record.
    pub async fn get_session(&self) -> SessionState {
        self.store.state(|s| s.session.clone()).await
    }

    /// Snapshot of the whole store state.
    pub async fn snapshot(&self) -> SyncState {
        self.store.state(Clone::clone).await
    }

    /// Current controller phase.
    pub async fn phase(&self) -> SyncPhase {
        self.store.state(SyncState::phase).await
    }

    /// Start sign-in.
    ///
    /// Live: hands off to the identity provider. Bypass: installs the
    /// sandbox session immediately and navigates home.
    pub async fn sign_in(&self) {
        self.dispatch(SessionAction::SignIn).await;
    }

    /// Sign out. Clears the session before the provider is told.
    pub async fn sign_out(&self) {
        self.dispatch(SessionAction::SignOut).await;
    }

    /// Access token for API calls.
    ///
    /// Failures are logged and reported as `None`.
    pub async fn get_access_token(&self) -> Option<Token> {
        let fetch = self.store.environment().pipeline.access_token();
        match AssertUnwindSafe(fetch).catch_unwind().await {
            Ok(Ok(token)) => token,
            Ok(Err(error)) => {
                tracing::warn!(%error, "Access token unavailable");
                None
            },
            Err(_) => {
                tracing::error!("Access token fetch panicked");
                None
            },
        }
    }

    /// Resolve the profile again, outside the retry counter.
    ///
    /// Does nothing when signed out or when a resolution is already in
    /// flight. Each call waits for its own result only.
    ///
    /// # Errors
    ///
    /// - The resolution's own failure ([`SessionError::ResolutionTransport`], ...)
    /// - [`SessionError::Superseded`] if the session changed meanwhile
    /// - [`SessionError::Store`] on timeout or shutdown
    pub async fn refresh_user(&self) -> Result<()> {
        let timeout = self.store.environment().config.refresh_timeout;
        let request = self.next_refresh.fetch_add(1, Ordering::Relaxed);

        let settled = self
            .store
            .send_and_wait_for(
                SessionAction::RefreshUser { request },
                |action| action.settles_refresh(request),
                timeout,
            )
            .await?;

        match settled {
            SessionAction::ResolutionCompleted {
                epoch: completed,
                result,
                ..
            } => {
                let current = self.store.state(|s| s.attempt.epoch).await;
                if completed != current {
                    return Err(SessionError::Superseded);
                }
                result.map(|_| ())
            },
            _ => Ok(()),
        }
    }

    /// Feed one provider signal triple.
    pub async fn provider_changed(&self, signal: ProviderSignal) {
        self.dispatch(SessionAction::ProviderChanged { signal }).await;
    }

    /// Report the host router's current route.
    pub async fn route_changed(&self, route: Route) {
        self.dispatch(SessionAction::RouteChanged { route }).await;
    }

    /// Forward the current and every later provider signal from `signals`.
    ///
    /// The task ends when the sender is dropped.
    pub fn attach(&self, mut signals: watch::Receiver<ProviderSignal>) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            loop {
                let signal = signals.borrow_and_update().clone();
                client.provider_changed(signal).await;
                if signals.changed().await.is_err() {
                    tracing::debug!("Provider signal source closed");
                    break;
                }
            }
        })
    }

    /// Wait until no effect is running.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] on timeout.
    pub async fn wait_idle(&self, timeout: Duration) -> Result<()> {
        Ok(self.store.wait_idle(timeout).await?)
    }

    /// Stop accepting actions and wait for running effects.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if effects are still running at the
    /// timeout.
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        Ok(self.store.shutdown(timeout).await?)
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &SessionStore<N, M> {
        &self.store
    }

    async fn dispatch(&self, action: SessionAction) {
        if let Err(error) = self.store.send(action).await {
            tracing::warn!(%error, "Session action rejected");
        }
    }
}

impl<N, M> Clone for SessionClient<N, M>
where
    N: Navigator + Clone + 'static,
    M: RouteMemory + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            next_refresh: Arc::clone(&self.next_refresh),
        }
    }
}

impl<N, M> std::fmt::Debug for SessionClient<N, M>
where
    N: Navigator + Clone + 'static,
    M: RouteMemory + Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("environment", self.store.environment())
            .finish_non_exhaustive()
    }
}
