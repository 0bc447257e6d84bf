//! Backend profile resolver contract.

use crate::error::SessionError;
use crate::state::{Token, UserProfile};
use std::future::Future;

/// Outcome of a profile lookup.
///
/// "No such account" is a normal answer, distinct from failing to get an
/// answer at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileResult {
    /// The identity maps to this profile.
    Found(UserProfile),
    /// The identity has no application account.
    NotFound,
    /// Network, status or parse failure.
    TransportError(String),
}

impl ProfileResult {
    /// Convert into the controller's error taxonomy.
    ///
    /// # Errors
    ///
    /// - `NotFound` → [`SessionError::ProfileNotFound`]
    /// - `TransportError` → [`SessionError::ResolutionTransport`]
    pub fn into_result(self) -> Result<UserProfile, SessionError> {
        match self {
            Self::Found(profile) => Ok(profile),
            Self::NotFound => Err(SessionError::ProfileNotFound),
            Self::TransportError(detail) => Err(SessionError::ResolutionTransport(detail)),
        }
    }

    /// Short label used as a metrics dimension.
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::NotFound => "not_found",
            Self::TransportError(_) => "transport_error",
        }
    }
}

/// Turns a bearer token into an application profile.
pub trait ProfileResolver: Send + Sync {
    /// Look up the profile for `token`.
    fn resolve(&self, token: &Token) -> impl Future<Output = ProfileResult> + Send;
}
