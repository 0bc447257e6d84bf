//! Session sync configuration.
//!
//! Values come from the application or from `SESSION_SYNC_*` environment
//! variables; every field has a usable default.

use crate::constants::{self, env_vars, routes};
use crate::error::SessionError;
use crate::state::Route;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Retry classification hook.
pub type Classifier = fn(&SessionError) -> bool;

/// Route policy consulted by the navigation guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePolicy {
    /// Sign-in screen.
    pub sign_in: Route,
    /// Sign-up screen for identities without an account.
    pub sign_up: Route,
    /// Identity provider callback.
    pub callback: Route,
    /// Sign-out landing page.
    pub sign_out: Route,
    /// Default post-sign-in destination.
    pub home: Route,
}

impl RoutePolicy {
    /// Auth-flow routes: an unauthenticated user is never redirected away
    /// from these.
    #[must_use]
    pub fn is_auth_route(&self, route: &Route) -> bool {
        [&self.sign_in, &self.sign_up, &self.callback, &self.sign_out].contains(&route)
    }

    /// Routes an authenticated user is moved off of.
    #[must_use]
    pub fn is_sign_in_flow(&self, route: &Route) -> bool {
        *route == self.sign_in || *route == self.callback
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            sign_in: Route::new(routes::SIGN_IN),
            sign_up: Route::new(routes::SIGN_UP),
            callback: Route::new(routes::CALLBACK),
            sign_out: Route::new(routes::SIGN_OUT),
            home: Route::new(routes::HOME),
        }
    }
}

/// Automatic retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Failed automatic resolutions allowed before giving up. At least one
    /// attempt is always made; see [`ceiling`](Self::ceiling).
    ///
    /// Default: 3
    pub max_retries: u32,

    /// Schedule a retry this long after a failure. `None` waits for the
    /// next provider signal instead.
    ///
    /// Default: `None`
    pub retry_delay: Option<Duration>,

    /// Decides which failures count as retryable.
    ///
    /// Default: [`SessionError::is_retryable`]
    #[serde(skip, default = "default_classifier")]
    pub classifier: Classifier,
}

fn default_classifier() -> Classifier {
    SessionError::is_retryable
}

impl RetryPolicy {
    /// Policy with the given ceiling and default classification.
    ///
    /// A ceiling of zero is raised to one.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
            ..Self::default()
        }
    }

    /// Effective attempt ceiling, never below one.
    #[must_use]
    pub const fn ceiling(&self) -> u32 {
        if self.max_retries == 0 { 1 } else { self.max_retries }
    }

    /// Set the automatic retry delay.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Replace the retry classification.
    #[must_use]
    pub const fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Apply the classifier.
    #[must_use]
    pub fn is_retryable(&self, error: &SessionError) -> bool {
        (self.classifier)(error)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: constants::DEFAULT_MAX_RETRIES,
            retry_delay: None,
            classifier: default_classifier(),
        }
    }
}

/// Session sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Application origin, e.g. `https://app.example.com`.
    pub base_url: String,

    /// Backend profile endpoint.
    pub profile_url: String,

    /// Route policy.
    pub routes: RoutePolicy,

    /// Automatic retry policy.
    pub retry: RetryPolicy,

    /// Guard settle window after each redirect.
    ///
    /// Default: 1 second
    pub settle_delay: Duration,

    /// How long `refresh_user` waits.
    ///
    /// Default: 10 seconds
    pub refresh_timeout: Duration,

    /// Forces (`Some(true)`) or forbids (`Some(false)`) bypass mode,
    /// overriding the runtime probe.
    pub sandbox_override: Option<bool>,
}

impl SyncConfig {
    /// Configuration for the given origin with defaults elsewhere.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            profile_url: format!("{}/api/users/me", base_url.trim_end_matches('/')),
            base_url,
            ..Self::default()
        }
    }

    /// Load configuration from `SESSION_SYNC_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unparseable values are logged and replaced by their default.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = lookup(env_vars::BASE_URL).map_or_else(Self::default, Self::new);

        let retry = RetryPolicy {
            max_retries: parse_max_retries(&lookup, defaults.retry.max_retries),
            retry_delay: parse_opt::<u64, _>(&lookup, env_vars::RETRY_DELAY_MS)
                .map(Duration::from_millis),
            classifier: default_classifier(),
        };

        Self {
            profile_url: lookup(env_vars::PROFILE_URL).unwrap_or(defaults.profile_url),
            retry,
            settle_delay: parse_opt(&lookup, env_vars::SETTLE_MS)
                .map_or(defaults.settle_delay, Duration::from_millis),
            refresh_timeout: parse_opt(&lookup, env_vars::REFRESH_TIMEOUT_MS)
                .map_or(defaults.refresh_timeout, Duration::from_millis),
            sandbox_override: lookup(env_vars::SANDBOX).and_then(|raw| parse_flag(&raw)),
            ..defaults
        }
    }

    /// Set the profile endpoint.
    #[must_use]
    pub fn with_profile_url(mut self, url: impl Into<String>) -> Self {
        self.profile_url = url.into();
        self
    }

    /// Replace the route policy.
    #[must_use]
    pub fn with_routes(mut self, routes: RoutePolicy) -> Self {
        self.routes = routes;
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the guard settle window.
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Set the `refresh_user` timeout.
    #[must_use]
    pub const fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Force or forbid bypass mode.
    #[must_use]
    pub const fn with_sandbox_override(mut self, sandboxed: bool) -> Self {
        self.sandbox_override = Some(sandboxed);
        self
    }

    /// URL the identity provider returns to after sign-in.
    #[must_use]
    pub fn callback_url(&self) -> String {
        self.absolute(&self.routes.callback)
    }

    /// URL the identity provider returns to after sign-out.
    #[must_use]
    pub fn sign_out_url(&self) -> String {
        self.absolute(&self.routes.sign_in)
    }

    fn absolute(&self, route: &Route) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), route)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            profile_url: "http://localhost:3000/api/users/me".to_string(),
            routes: RoutePolicy::default(),
            retry: RetryPolicy::default(),
            settle_delay: constants::DEFAULT_SETTLE_DELAY,
            refresh_timeout: constants::DEFAULT_REFRESH_TIMEOUT,
            sandbox_override: None,
        }
    }
}

/// Parse a boolean-ish flag (`1`, `true`, `yes`, `on` and their negations).
pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!(value = other, "Ignoring unrecognized sandbox flag");
            None
        },
    }
}

fn parse_opt<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    if let Ok(value) = raw.trim().parse() {
        Some(value)
    } else {
        tracing::warn!(key, value = %raw, "Invalid configuration value, using default");
        None
    }
}

fn parse_max_retries<F>(lookup: &F, default: u32) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    match parse_opt::<u32, _>(lookup, env_vars::MAX_RETRIES) {
        Some(0) => {
            tracing::warn!(
                key = env_vars::MAX_RETRIES,
                default,
                "Retry ceiling must allow at least one attempt, using default"
            );
            default
        },
        Some(max_retries) => max_retries,
        None => default,
    }
}
