//! Mock identity provider for testing.

use crate::error::{Result, SessionError};
use crate::providers::IdentityProvider;
use crate::state::Token;
use std::future::Future;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct Inner {
    identity_token: Result<Option<Token>>,
    access_token: Result<Option<Token>>,
    sign_in_failure: Option<String>,
    sign_in_calls: Vec<String>,
    sign_out_calls: Vec<String>,
    identity_token_fetches: usize,
}

/// Mock identity provider.
///
/// Hands out `mock-identity-token` / `mock-access-token` by default and
/// records every sign-in and sign-out request.
#[derive(Debug, Clone)]
pub struct MockIdentityProvider {
    inner: Arc<Mutex<Inner>>,
}

impl MockIdentityProvider {
    /// Create a new mock identity provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                identity_token: Ok(Some(Token::new("mock-identity-token"))),
                access_token: Ok(Some(Token::new("mock-access-token"))),
                sign_in_failure: None,
                sign_in_calls: Vec::new(),
                sign_out_calls: Vec::new(),
                identity_token_fetches: 0,
            })),
        }
    }

    /// Set the identity token result.
    #[must_use]
    pub fn with_identity_token(self, token: Option<Token>) -> Self {
        self.update(|inner| inner.identity_token = Ok(token));
        self
    }

    /// Make identity token fetches fail.
    #[must_use]
    pub fn failing_identity_token(self, message: &str) -> Self {
        let error = SessionError::Provider(message.to_string());
        self.update(|inner| inner.identity_token = Err(error));
        self
    }

    /// Make access token fetches fail.
    #[must_use]
    pub fn failing_access_token(self, message: &str) -> Self {
        let error = SessionError::Provider(message.to_string());
        self.update(|inner| inner.access_token = Err(error));
        self
    }

    /// Make `begin_sign_in` fail.
    #[must_use]
    pub fn failing_sign_in(self, message: &str) -> Self {
        let message = message.to_string();
        self.update(|inner| inner.sign_in_failure = Some(message));
        self
    }

    /// Callback URLs passed to `begin_sign_in`.
    #[must_use]
    pub fn sign_in_calls(&self) -> Vec<String> {
        self.read(|inner| inner.sign_in_calls.clone())
    }

    /// Redirect URLs passed to `begin_sign_out`.
    #[must_use]
    pub fn sign_out_calls(&self) -> Vec<String> {
        self.read(|inner| inner.sign_out_calls.clone())
    }

    /// Number of identity token fetches.
    #[must_use]
    pub fn identity_token_fetches(&self) -> usize {
        self.read(|inner| inner.identity_token_fetches)
    }

    fn update(&self, f: impl FnOnce(&mut Inner)) {
        if let Ok(mut inner) = self.inner.lock() {
            f(&mut inner);
        }
    }

    fn read<T: Default>(&self, f: impl FnOnce(&Inner) -> T) -> T {
        self.inner.lock().map(|inner| f(&inner)).unwrap_or_default()
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for MockIdentityProvider {
    fn begin_sign_in(&self, callback_url: &str) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);
        let callback_url = callback_url.to_string();

        async move {
            let mut inner = inner
                .lock()
                .map_err(|_| SessionError::Provider("mock poisoned".to_string()))?;
            inner.sign_in_calls.push(callback_url);
            match &inner.sign_in_failure {
                Some(message) => Err(SessionError::Provider(message.clone())),
                None => Ok(()),
            }
        }
    }

    fn begin_sign_out(&self, redirect_url: &str) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);
        let redirect_url = redirect_url.to_string();

        async move {
            inner
                .lock()
                .map_err(|_| SessionError::Provider("mock poisoned".to_string()))?
                .sign_out_calls
                .push(redirect_url);
            Ok(())
        }
    }

    fn fetch_identity_token(&self) -> impl Future<Output = Result<Option<Token>>> + Send {
        let inner = Arc::clone(&self.inner);

        async move {
            let mut inner = inner
                .lock()
                .map_err(|_| SessionError::Provider("mock poisoned".to_string()))?;
            inner.identity_token_fetches += 1;
            inner.identity_token.clone()
        }
    }

    fn fetch_access_token(&self) -> impl Future<Output = Result<Option<Token>>> + Send {
        let inner = Arc::clone(&self.inner);

        async move {
            inner
                .lock()
                .map_err(|_| SessionError::Provider("mock poisoned".to_string()))?
                .access_token
                .clone()
        }
    }
}
