//! Session actions.
//!
//! Every input to the session store: provider signals, user requests,
//! effect results and router notifications.

use crate::error::SessionError;
use crate::state::{ProviderSignal, ResolutionKind, Route, UserProfile};

/// Session action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    // ═══════════════════════════════════════════════════════════════════════
    // Identity Provider
    // ═══════════════════════════════════════════════════════════════════════

    /// The provider's signal triple changed (or was re-emitted).
    ProviderChanged {
        /// Current triple
        signal: ProviderSignal,
    },

    /// A delegated provider operation failed.
    ProviderFailed {
        /// Converted failure
        error: SessionError,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // User Requests
    // ═══════════════════════════════════════════════════════════════════════

    /// Start sign-in.
    SignIn,

    /// Sign out.
    SignOut,

    /// Resolve the profile again outside the retry counter.
    RefreshUser {
        /// Id the settling action carries back
        request: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Resolution
    // ═══════════════════════════════════════════════════════════════════════

    /// Scheduled retry after a failed automatic resolution.
    RetryResolution,

    /// A resolution settled.
    ResolutionCompleted {
        /// Epoch the resolution was started in
        epoch: u64,
        /// Automatic or manual
        kind: ResolutionKind,
        /// Profile or converted failure
        result: Result<UserProfile, SessionError>,
    },

    /// `RefreshUser` had nothing to do.
    RefreshSkipped {
        /// Id of the skipped request
        request: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Navigation
    // ═══════════════════════════════════════════════════════════════════════

    /// The host router reports the current location.
    RouteChanged {
        /// Current route
        route: Route,
    },

    /// The guard's settle window elapsed.
    NavigationSettled,
}

impl SessionAction {
    /// Shorthand for a provider signal.
    #[must_use]
    pub const fn provider(signal: ProviderSignal) -> Self {
        Self::ProviderChanged { signal }
    }

    /// Shorthand for a route change.
    #[must_use]
    pub fn route(path: impl Into<String>) -> Self {
        Self::RouteChanged {
            route: Route::new(path),
        }
    }

    /// Whether this action settles the manual refresh `request`.
    #[must_use]
    pub const fn settles_refresh(&self, request: u64) -> bool {
        match self {
            Self::RefreshSkipped { request: skipped } => *skipped == request,
            Self::ResolutionCompleted {
                kind: ResolutionKind::Manual { request: completed },
                ..
            } => *completed == request,
            _ => false,
        }
    }
}
