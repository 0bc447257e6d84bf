//! Mock collaborators for testing.
//!
//! In-memory, deterministic implementations of every provider trait, plus
//! [`test_environment`] which wires them into a live pipeline.

pub mod identity;
pub mod navigator;
pub mod resolver;

pub use identity::MockIdentityProvider;
pub use navigator::MockNavigator;
pub use resolver::{MockProfileResolver, ResolverGate};

use crate::config::SyncConfig;
use crate::environment::SessionEnvironment;
use crate::pipeline::LivePipeline;
use crate::providers::{InMemoryRouteMemory, RuntimeProbe};
use std::sync::Arc;
use std::time::Duration;

/// Probe with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

impl RuntimeProbe for StaticProbe {
    fn is_sandboxed(&self) -> bool {
        self.0
    }
}

/// Configuration with test-friendly timings.
#[must_use]
pub fn test_config() -> SyncConfig {
    SyncConfig::new("https://app.test")
        .with_settle_delay(Duration::from_millis(30))
        .with_refresh_timeout(Duration::from_secs(2))
}

/// Environment over a live pipeline built from default mocks.
#[must_use]
pub fn test_environment() -> SessionEnvironment<MockNavigator, InMemoryRouteMemory> {
    live_environment(
        MockIdentityProvider::new(),
        MockProfileResolver::new(),
        test_config(),
    )
}

/// Environment over a live pipeline built from the given mocks.
#[must_use]
pub fn live_environment(
    identity: MockIdentityProvider,
    resolver: MockProfileResolver,
    config: SyncConfig,
) -> SessionEnvironment<MockNavigator, InMemoryRouteMemory> {
    SessionEnvironment::new(
        Arc::new(LivePipeline::new(identity, resolver)),
        MockNavigator::new(),
        InMemoryRouteMemory::new(),
        config,
    )
}
