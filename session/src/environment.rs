//! Session environment.
//!
//! Dependency injection for the session reducers.

use crate::config::SyncConfig;
use crate::pipeline::SessionPipeline;
use crate::providers::{Navigator, RouteMemory};
use session_sync_core::environment::Clock;
use session_sync_runtime::SystemClock;
use std::sync::Arc;

/// Session environment.
///
/// # Type Parameters
///
/// - `N`: Navigator
/// - `M`: Intended-route memory
#[derive(Clone)]
pub struct SessionEnvironment<N, M>
where
    N: Navigator + Clone,
    M: RouteMemory + Clone,
{
    /// Live or bypass pipeline, selected once at startup.
    pub pipeline: Arc<dyn SessionPipeline>,

    /// Host router.
    pub navigator: N,

    /// Intended-route memory.
    pub route_memory: M,

    /// Clock for sync timestamps.
    pub clock: Arc<dyn Clock>,

    /// Policy and timings.
    pub config: Arc<SyncConfig>,
}

impl<N, M> SessionEnvironment<N, M>
where
    N: Navigator + Clone,
    M: RouteMemory + Clone,
{
    /// Create a new environment using the system clock.
    #[must_use]
    pub fn new(
        pipeline: Arc<dyn SessionPipeline>,
        navigator: N,
        route_memory: M,
        config: SyncConfig,
    ) -> Self {
        Self {
            pipeline,
            navigator,
            route_memory,
            clock: Arc::new(SystemClock),
            config: Arc::new(config),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl<N, M> std::fmt::Debug for SessionEnvironment<N, M>
where
    N: Navigator + Clone,
    M: RouteMemory + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEnvironment")
            .field("mode", &self.pipeline.mode())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
