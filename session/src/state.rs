//! Session state types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// Value Types
// ═══════════════════════════════════════════════════════════════════════

/// Opaque bearer credential.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token, for use in an `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Application route path, e.g. `/sign-in`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(String);

impl Route {
    /// Create a route from a path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Route {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Application user record returned by the profile resolver.
///
/// Replaced wholesale on every successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Internal application id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form bio.
    #[serde(default)]
    pub bio: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Subject id assigned by the identity provider.
    #[serde(default)]
    pub auth_subject_id: Option<String>,
}

impl UserProfile {
    /// Profile with only the required fields set.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bio: None,
            email: None,
            phone: None,
            auth_subject_id: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Session Store Record
// ═══════════════════════════════════════════════════════════════════════

/// The session record everything else in the application reads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// A profile has been resolved for the current identity.
    pub authenticated: bool,
    /// Provider bootstrapping or a resolution is in flight.
    pub loading: bool,
    /// User-visible error message.
    pub error: Option<String>,
    /// The resolved profile.
    pub user: Option<UserProfile>,
    /// When `user` was last committed.
    pub synced_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Merge a patch, leaving unspecified fields untouched.
    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(authenticated) = patch.authenticated {
            self.authenticated = authenticated;
        }
        if let Some(loading) = patch.loading {
            self.loading = loading;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
        if let Some(user) = patch.user {
            self.user = user;
        }
        if let Some(synced_at) = patch.synced_at {
            self.synced_at = synced_at;
        }
    }
}

/// Partial update for [`SessionState`].
///
/// `None` leaves a field alone. For the optional fields, `Some(None)` clears.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPatch {
    /// New `authenticated` flag
    pub authenticated: Option<bool>,
    /// New `loading` flag
    pub loading: Option<bool>,
    /// New error message, or `Some(None)` to clear
    pub error: Option<Option<String>>,
    /// New profile, or `Some(None)` to clear
    pub user: Option<Option<UserProfile>>,
    /// New sync timestamp, or `Some(None)` to clear
    pub synced_at: Option<Option<DateTime<Utc>>>,
}

impl SessionPatch {
    /// Patch that signs the session out.
    #[must_use]
    pub const fn cleared() -> Self {
        Self {
            authenticated: Some(false),
            loading: None,
            error: Some(None),
            user: Some(None),
            synced_at: Some(None),
        }
    }

    /// Patch that installs a resolved profile.
    #[must_use]
    pub const fn resolved(user: UserProfile, at: DateTime<Utc>) -> Self {
        Self {
            authenticated: Some(true),
            loading: None,
            error: Some(None),
            user: Some(Some(user)),
            synced_at: Some(Some(at)),
        }
    }

    /// Patch that only sets the error message.
    #[must_use]
    pub const fn error(message: String) -> Self {
        Self {
            authenticated: None,
            loading: None,
            error: Some(Some(message)),
            user: None,
            synced_at: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Controller Bookkeeping
// ═══════════════════════════════════════════════════════════════════════

/// The identity provider's signal triple.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderSignal {
    /// Provider considers the user signed in.
    pub authenticated: bool,
    /// Provider is still restoring or exchanging credentials.
    pub loading: bool,
    /// Last provider error, if any.
    pub error: Option<String>,
}

impl ProviderSignal {
    /// Provider still starting up.
    #[must_use]
    pub const fn bootstrapping() -> Self {
        Self {
            authenticated: false,
            loading: true,
            error: None,
        }
    }

    /// Provider finished loading with a signed-in user.
    #[must_use]
    pub const fn authenticated() -> Self {
        Self {
            authenticated: true,
            loading: false,
            error: None,
        }
    }

    /// Provider finished loading with nobody signed in.
    #[must_use]
    pub const fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            loading: false,
            error: None,
        }
    }

    /// Attach a provider error to this signal.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Why a resolution was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionKind {
    /// Driven by provider signals; counted against the retry ceiling.
    Automatic,
    /// Requested through `refresh_user`; never counted.
    Manual {
        /// Caller-chosen id echoed back in the completion.
        request: u64,
    },
}

/// Resolution bookkeeping owned by the sync reducer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncAttempt {
    /// Failed automatic resolutions since the last reset.
    pub retry_count: u32,
    /// A resolution is in flight.
    pub in_progress: bool,
    /// Incremented whenever an in-flight result must be discarded.
    pub epoch: u64,
    /// No automatic attempts until the provider reports unauthenticated.
    pub exhausted: bool,
    /// Sign-out was delegated; waiting for the provider to confirm it.
    pub awaiting_sign_out: bool,
}

impl SyncAttempt {
    /// Back to `{0, false}` in a fresh epoch.
    pub fn reset(&mut self) {
        self.retry_count = 0;
        self.in_progress = false;
        self.exhausted = false;
        self.awaiting_sign_out = false;
        self.epoch += 1;
    }
}

/// Navigation guard bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    /// Last route reported by the host or issued by the guard.
    pub current: Option<Route>,
    /// A redirect was issued and its settle window is still open.
    pub in_flight: bool,
    /// Explicit navigation requested by the controller (bypass sign-in/out).
    pub requested: Option<Route>,
    /// Where a signed-out user was headed before being sent to sign-in.
    pub intended: Option<Route>,
}

/// Conceptual controller state, derived from the bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Provider still loading.
    Bootstrapping,
    /// Nobody signed in.
    Unauthenticated,
    /// Provider authenticated, waiting for a trigger to resolve.
    Pending,
    /// Resolution in flight.
    Resolving,
    /// Profile committed.
    Resolved,
    /// Last automatic resolution failed; another attempt is allowed.
    ResolutionFailed,
    /// Retry ceiling reached or a non-retryable failure.
    RetriesExhausted,
    /// The identity has no application account.
    ProfileNotFound,
}

/// Root state of the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    /// Public session record.
    pub session: SessionState,
    /// Resolution bookkeeping.
    pub attempt: SyncAttempt,
    /// Last provider triple observed.
    pub provider: ProviderSignal,
    /// Navigation guard bookkeeping.
    pub navigation: NavigationState,
    /// Last resolution reported that no account exists.
    pub profile_missing: bool,
}

impl SyncState {
    /// Initial state while the provider is starting up.
    #[must_use]
    pub fn bootstrapping() -> Self {
        Self {
            session: SessionState {
                loading: true,
                ..SessionState::default()
            },
            attempt: SyncAttempt::default(),
            provider: ProviderSignal::bootstrapping(),
            navigation: NavigationState::default(),
            profile_missing: false,
        }
    }

    /// Initial state when nothing will be restored (bypass mode).
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            session: SessionState::default(),
            attempt: SyncAttempt::default(),
            provider: ProviderSignal::unauthenticated(),
            navigation: NavigationState::default(),
            profile_missing: false,
        }
    }

    /// Derive the controller's conceptual state.
    #[must_use]
    pub const fn phase(&self) -> SyncPhase {
        if self.attempt.in_progress {
            SyncPhase::Resolving
        } else if self.session.authenticated {
            SyncPhase::Resolved
        } else if self.provider.loading {
            SyncPhase::Bootstrapping
        } else if self.profile_missing {
            SyncPhase::ProfileNotFound
        } else if !self.provider.authenticated {
            SyncPhase::Unauthenticated
        } else if self.attempt.exhausted {
            SyncPhase::RetriesExhausted
        } else if self.attempt.retry_count > 0 {
            SyncPhase::ResolutionFailed
        } else {
            SyncPhase::Pending
        }
    }

    /// Keep `session.loading` in step with the bookkeeping.
    pub fn sync_loading(&mut self) {
        self.session.loading = self.provider.loading || self.attempt.in_progress;
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::bootstrapping()
    }
}
