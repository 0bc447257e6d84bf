//! Identity pipelines.
//!
//! The controller never branches on the environment itself. It talks to a
//! [`SessionPipeline`] chosen once at startup by [`select_pipeline`]:
//!
//! - [`LivePipeline`]: the real identity provider and profile resolver
//! - [`BypassPipeline`]: a fixed sandbox identity, no network at all

use crate::config::SyncConfig;
use crate::constants::bypass;
use crate::error::{Result, SessionError};
use crate::providers::{IdentityProvider, ProfileResolver, RuntimeProbe};
use crate::state::{Token, UserProfile};
use futures::future::{self, BoxFuture};
use std::sync::Arc;

/// Which pipeline is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Real provider and resolver.
    Live,
    /// Sandbox substitute.
    Bypass,
}

/// What sign-in does under the active pipeline.
pub enum SignInPlan {
    /// Hand off to the identity provider; the result arrives later as
    /// provider signals.
    Redirect(BoxFuture<'static, Result<()>>),
    /// Install this profile right away.
    Session(UserProfile),
}

/// What sign-out does under the active pipeline.
pub enum SignOutPlan {
    /// Hand off to the identity provider.
    Redirect(BoxFuture<'static, Result<()>>),
    /// Nothing beyond clearing local state.
    Local,
}

/// Strategy for every identity-dependent step of the controller.
pub trait SessionPipeline: Send + Sync {
    /// Active mode.
    fn mode(&self) -> PipelineMode;

    /// Plan a sign-in returning to `callback_url`.
    fn sign_in(&self, callback_url: String) -> SignInPlan;

    /// Plan a sign-out returning to `redirect_url`.
    fn sign_out(&self, redirect_url: String) -> SignOutPlan;

    /// Fetch an identity token and resolve it into a profile.
    fn resolve_profile(&self) -> BoxFuture<'static, Result<UserProfile>>;

    /// Fetch an access token.
    fn access_token(&self) -> BoxFuture<'static, Result<Option<Token>>>;

    /// Shorthand for `mode() == PipelineMode::Bypass`.
    fn is_bypass(&self) -> bool {
        self.mode() == PipelineMode::Bypass
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Live
// ═══════════════════════════════════════════════════════════════════════

/// Pipeline backed by a real identity provider and profile resolver.
pub struct LivePipeline<I, P> {
    identity: Arc<I>,
    resolver: Arc<P>,
}

impl<I, P> LivePipeline<I, P>
where
    I: IdentityProvider + 'static,
    P: ProfileResolver + 'static,
{
    /// Create a live pipeline.
    #[must_use]
    pub fn new(identity: I, resolver: P) -> Self {
        Self {
            identity: Arc::new(identity),
            resolver: Arc::new(resolver),
        }
    }
}

impl<I, P> Clone for LivePipeline<I, P> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<I, P> SessionPipeline for LivePipeline<I, P>
where
    I: IdentityProvider + 'static,
    P: ProfileResolver + 'static,
{
    fn mode(&self) -> PipelineMode {
        PipelineMode::Live
    }

    fn sign_in(&self, callback_url: String) -> SignInPlan {
        let identity = Arc::clone(&self.identity);
        SignInPlan::Redirect(Box::pin(async move {
            identity.begin_sign_in(&callback_url).await
        }))
    }

    fn sign_out(&self, redirect_url: String) -> SignOutPlan {
        let identity = Arc::clone(&self.identity);
        SignOutPlan::Redirect(Box::pin(async move {
            identity.begin_sign_out(&redirect_url).await
        }))
    }

    fn resolve_profile(&self) -> BoxFuture<'static, Result<UserProfile>> {
        let identity = Arc::clone(&self.identity);
        let resolver = Arc::clone(&self.resolver);
        Box::pin(async move {
            let token = identity
                .fetch_identity_token()
                .await?
                .ok_or(SessionError::TokenUnavailable)?;
            resolver.resolve(&token).await.into_result()
        })
    }

    fn access_token(&self) -> BoxFuture<'static, Result<Option<Token>>> {
        let identity = Arc::clone(&self.identity);
        Box::pin(async move { identity.fetch_access_token().await })
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Bypass
// ═══════════════════════════════════════════════════════════════════════

/// Deterministic sandbox pipeline.
///
/// Makes no network calls. Sign-in installs a fixed profile immediately.
#[derive(Debug, Clone)]
pub struct BypassPipeline {
    profile: UserProfile,
    token: Token,
}

impl BypassPipeline {
    /// Bypass pipeline with a custom identity.
    #[must_use]
    pub const fn new(profile: UserProfile, token: Token) -> Self {
        Self { profile, token }
    }

    /// The profile sign-in installs.
    #[must_use]
    pub const fn profile(&self) -> &UserProfile {
        &self.profile
    }
}

impl Default for BypassPipeline {
    fn default() -> Self {
        let profile = UserProfile {
            email: Some(bypass::USER_EMAIL.to_string()),
            auth_subject_id: Some(bypass::SUBJECT_ID.to_string()),
            ..UserProfile::new(bypass::USER_ID, bypass::USER_NAME)
        };
        Self::new(profile, Token::new(bypass::ACCESS_TOKEN))
    }
}

impl SessionPipeline for BypassPipeline {
    fn mode(&self) -> PipelineMode {
        PipelineMode::Bypass
    }

    fn sign_in(&self, _callback_url: String) -> SignInPlan {
        SignInPlan::Session(self.profile.clone())
    }

    fn sign_out(&self, _redirect_url: String) -> SignOutPlan {
        SignOutPlan::Local
    }

    fn resolve_profile(&self) -> BoxFuture<'static, Result<UserProfile>> {
        Box::pin(future::ready(Ok(self.profile.clone())))
    }

    fn access_token(&self) -> BoxFuture<'static, Result<Option<Token>>> {
        Box::pin(future::ready(Ok(Some(self.token.clone()))))
    }
}

/// Pick the pipeline once at startup.
///
/// `config.sandbox_override` wins over the probe.
#[must_use]
pub fn select_pipeline(
    probe: &dyn RuntimeProbe,
    config: &SyncConfig,
    live: Arc<dyn SessionPipeline>,
) -> Arc<dyn SessionPipeline> {
    let sandboxed = config
        .sandbox_override
        .unwrap_or_else(|| probe.is_sandboxed());

    if sandboxed {
        tracing::info!("Sandboxed runtime detected, using bypass pipeline");
        Arc::new(BypassPipeline::default())
    } else {
        tracing::debug!("Using live identity pipeline");
        live
    }
}
