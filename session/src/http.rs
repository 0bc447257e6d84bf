//! HTTP backend profile resolver.

use crate::config::SyncConfig;
use crate::providers::{ProfileResolver, ProfileResult};
use crate::state::{Token, UserProfile};
use reqwest::StatusCode;
use std::future::Future;

/// Resolves profiles with `GET {profile_url}` and bearer auth.
///
/// | Response | Result |
/// |---|---|
/// | `200` with a profile body | `Found` |
/// | `404` | `NotFound` |
/// | anything else, network failure, unparseable body | `TransportError` |
#[derive(Debug, Clone)]
pub struct HttpProfileResolver {
    client: reqwest::Client,
    url: String,
}

impl HttpProfileResolver {
    /// Create a resolver for `url` with a default client.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Create a resolver using an existing client (timeouts, proxies, ...).
    #[must_use]
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Resolver for `config.profile_url`.
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.profile_url.clone())
    }
}

impl ProfileResolver for HttpProfileResolver {
    fn resolve(&self, token: &Token) -> impl Future<Output = ProfileResult> + Send {
        let request = self.client.get(&self.url).bearer_auth(token.as_str());
        let url = self.url.clone();

        async move {
            let response = match request.send().await {
                Ok(response) => response,
                Err(error) => {
                    tracing::warn!(%url, %error, "Profile request failed");
                    return ProfileResult::TransportError(error.to_string());
                },
            };

            let status = response.status();
            let body = match response.text().await {
                Ok(body) => body,
                Err(error) => return ProfileResult::TransportError(error.to_string()),
            };

            let result = classify(status, &body);
            tracing::debug!(%url, %status, outcome = result.outcome(), "Profile request completed");
            result
        }
    }
}

/// Map a profile endpoint response to a [`ProfileResult`].
#[must_use]
pub fn classify(status: StatusCode, body: &str) -> ProfileResult {
    match status {
        StatusCode::OK => serde_json::from_str::<UserProfile>(body).map_or_else(
            |error| ProfileResult::TransportError(format!("invalid profile body: {error}")),
            ProfileResult::Found,
        ),
        StatusCode::NOT_FOUND => ProfileResult::NotFound,
        other => ProfileResult::TransportError(format!("unexpected status {other}")),
    }
}
