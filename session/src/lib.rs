//! # Session Sync
//!
//! Client-side session synchronization. Reconciles what an external
//! identity provider reports with the application's own session record,
//! resolves the provider identity into an application profile, and keeps
//! navigation consistent with the result.
//!
//! ## Architecture
//!
//! Everything runs through one store:
//!
//! ```text
//! provider signal ─┐
//! user request ────┼─→ SessionAction → SessionReducer → (SyncState, Effects)
//! router event ────┘                                         │
//!        ↑                                                   │
//!        └──── ResolutionCompleted / NavigationSettled ←─────┘
//! ```
//!
//! - [`reducers::SyncReducer`]: the synchronization controller
//! - [`reducers::NavigationGuard`]: redirect policy with a settle window
//! - [`pipeline`]: live identity pipeline or sandbox bypass, chosen once
//! - [`client::SessionClient`]: the surface the application calls
//!
//! ## Example
//!
//! ```rust,ignore
//! use session_sync::*;
//!
//! let config = SyncConfig::from_env();
//! let live = Arc::new(LivePipeline::new(my_identity, HttpProfileResolver::from_config(&config)));
//! let pipeline = select_pipeline(&EnvProbe, &config, live);
//!
//! let client = SessionClient::new(SessionEnvironment::new(
//!     pipeline,
//!     my_router,
//!     InMemoryRouteMemory::new(),
//!     config,
//! ));
//! client.attach(provider_signals);
//!
//! let session = client.get_session().await;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod client;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod providers;
pub mod reducers;
pub mod state;

#[cfg(feature = "test-utils")]
pub mod mocks;

// Re-export main types for convenience
pub use actions::SessionAction;
pub use client::{SessionClient, SessionStore};
pub use config::{RetryPolicy, RoutePolicy, SyncConfig};
pub use environment::SessionEnvironment;
pub use error::{Result, SessionError};
pub use http::HttpProfileResolver;
pub use pipeline::{BypassPipeline, LivePipeline, PipelineMode, SessionPipeline, select_pipeline};
pub use providers::{
    EnvProbe, IdentityProvider, InMemoryRouteMemory, Navigator, ProfileResolver, ProfileResult,
    RouteMemory, RuntimeProbe,
};
pub use reducers::{NavigationGuard, SessionReducer, SyncReducer};
pub use state::{
    ProviderSignal, ResolutionKind, Route, SessionPatch, SessionState, SyncPhase, SyncState,
    Token, UserProfile,
};
