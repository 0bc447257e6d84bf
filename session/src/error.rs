//! Error types for session synchronization.

use session_sync_runtime::StoreError;
use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Error taxonomy for session synchronization.
///
/// Every failure reported by the identity provider or the profile resolver
/// is converted into one of these at the controller boundary. Nothing from
/// the collaborators reaches callers unconverted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    // ═══════════════════════════════════════════════════════════
    // Collaborator Errors
    // ═══════════════════════════════════════════════════════════

    /// The identity provider itself failed or reported an error.
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// Token fetch returned nothing.
    #[error("Identity token unavailable")]
    TokenUnavailable,

    /// Profile fetch failed for network or parse reasons.
    #[error("Profile lookup failed: {0}")]
    ResolutionTransport(String),

    /// The identity has no application account.
    #[error("No account exists for this identity")]
    ProfileNotFound,

    // ═══════════════════════════════════════════════════════════
    // Controller Errors
    // ═══════════════════════════════════════════════════════════

    /// Automatic resolution gave up.
    #[error(
        "We couldn't load your profile after {attempts} attempts. Please refresh the page to try again."
    )]
    MaxRetriesExceeded {
        /// Attempts made before giving up
        attempts: u32,
    },

    /// The session changed (sign-out, provider reset) while a manual
    /// refresh was in flight; its result was discarded.
    #[error("Session changed before the refresh completed")]
    Superseded,

    /// Store runtime failure (shutdown, timeout).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Default retry classification.
    ///
    /// Transport-like failures are retryable; a missing account and the
    /// controller's own terminal conditions are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider(_) | Self::TokenUnavailable | Self::ResolutionTransport(_)
        )
    }

    /// Returns `true` for [`SessionError::ProfileNotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ProfileNotFound)
    }

    /// Short label used as a metrics dimension.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Provider(_) => "provider",
            Self::TokenUnavailable => "token_unavailable",
            Self::ResolutionTransport(_) => "transport",
            Self::ProfileNotFound => "not_found",
            Self::MaxRetriesExceeded { .. } => "max_retries",
            Self::Superseded => "superseded",
            Self::Store(_) => "store",
        }
    }
}
