//! Intended-route memory.

use crate::state::Route;
use std::sync::{Arc, Mutex};

/// Persists where a signed-out user was headed for one auth round-trip.
///
/// The guard keeps the working copy in `NavigationState::intended` and
/// writes through to this store from effects, so the route survives a
/// reload during the provider redirect.
pub trait RouteMemory: Send + Sync {
    /// Store `route`, replacing any earlier value.
    fn remember(&self, route: Route);

    /// Stored route, if any, without clearing it.
    fn recall(&self) -> Option<Route>;

    /// Clear the stored route.
    fn forget(&self);
}

/// Process-local [`RouteMemory`].
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRouteMemory {
    slot: Arc<Mutex<Option<Route>>>,
}

impl InMemoryRouteMemory {
    /// Create an empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RouteMemory for InMemoryRouteMemory {
    fn remember(&self, route: Route) {
        match self.slot.lock() {
            Ok(mut slot) => *slot = Some(route),
            Err(_) => tracing::warn!(%route, "Route memory poisoned, intended route dropped"),
        }
    }

    fn recall(&self) -> Option<Route> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn forget(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.take();
        }
    }
}
