//! Session sync constants.

use std::time::Duration;

/// Default route paths.
pub mod routes {
    /// Sign-in screen.
    pub const SIGN_IN: &str = "/sign-in";

    /// Account creation for identities without a profile.
    pub const SIGN_UP: &str = "/sign-up";

    /// Identity provider redirect target.
    pub const CALLBACK: &str = "/callback";

    /// Sign-out landing page.
    pub const SIGN_OUT: &str = "/sign-out";

    /// Default destination after sign-in.
    pub const HOME: &str = "/home";
}

/// Automatic resolution attempts before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Window after a redirect during which the guard stays quiet.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// How long `refresh_user` waits for its resolution.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed identity installed by the bypass pipeline.
pub mod bypass {
    /// Mock profile id.
    pub const USER_ID: &str = "sandbox-user";

    /// Mock profile name.
    pub const USER_NAME: &str = "Sandbox User";

    /// Mock profile email.
    pub const USER_EMAIL: &str = "sandbox@example.com";

    /// Mock subject id.
    pub const SUBJECT_ID: &str = "sandbox|0";

    /// Mock bearer token.
    pub const ACCESS_TOKEN: &str = "sandbox-access-token";
}

/// Environment variable names read by `SyncConfig::from_env` and `EnvProbe`.
pub mod env_vars {
    /// Application origin used to build callback URLs.
    pub const BASE_URL: &str = "SESSION_SYNC_BASE_URL";

    /// Profile endpoint.
    pub const PROFILE_URL: &str = "SESSION_SYNC_PROFILE_URL";

    /// Retry ceiling.
    pub const MAX_RETRIES: &str = "SESSION_SYNC_MAX_RETRIES";

    /// Automatic retry delay in milliseconds (unset: retry on next signal).
    pub const RETRY_DELAY_MS: &str = "SESSION_SYNC_RETRY_DELAY_MS";

    /// Navigation settle window in milliseconds.
    pub const SETTLE_MS: &str = "SESSION_SYNC_SETTLE_MS";

    /// `refresh_user` timeout in milliseconds.
    pub const REFRESH_TIMEOUT_MS: &str = "SESSION_SYNC_REFRESH_TIMEOUT_MS";

    /// Sandbox detection (`1`/`true` forces bypass, `0`/`false` forbids it).
    pub const SANDBOX: &str = "SESSION_SYNC_SANDBOX";
}
