//! Identity provider adapter.

use crate::error::Result;
use crate::state::Token;
use std::future::Future;

/// External identity provider client.
///
/// The protocol behind it (OIDC, hosted login page, ...) is the
/// implementation's business. Failures are reported as
/// [`SessionError::Provider`](crate::error::SessionError::Provider).
///
/// The signal triple is not part of this trait: the host feeds it to
/// [`SessionClient::provider_changed`](crate::client::SessionClient::provider_changed)
/// or through a watch channel.
pub trait IdentityProvider: Send + Sync {
    /// Start an interactive sign-in that returns to `callback_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot start the flow.
    fn begin_sign_in(&self, callback_url: &str) -> impl Future<Output = Result<()>> + Send;

    /// End the provider session and return to `redirect_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the provider cannot start the flow.
    fn begin_sign_out(&self, redirect_url: &str) -> impl Future<Output = Result<()>> + Send;

    /// Identity token for the signed-in user, `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns error if the provider fails.
    fn fetch_identity_token(&self) -> impl Future<Output = Result<Option<Token>>> + Send;

    /// Access token for API calls, `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns error if the provider fails.
    fn fetch_access_token(&self) -> impl Future<Output = Result<Option<Token>>> + Send;
}
