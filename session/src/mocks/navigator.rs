//! Mock navigator for testing.

use crate::providers::Navigator;
use crate::state::Route;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Navigator that records every redirect.
#[derive(Debug, Clone, Default)]
pub struct MockNavigator {
    redirects: Arc<Mutex<Vec<Route>>>,
}

impl MockNavigator {
    /// Create a new mock navigator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirects performed so far, oldest first.
    #[must_use]
    pub fn redirects(&self) -> Vec<Route> {
        self.redirects
            .lock()
            .map(|redirects| redirects.clone())
            .unwrap_or_default()
    }

    /// Last redirect performed.
    #[must_use]
    pub fn last(&self) -> Option<Route> {
        self.redirects().pop()
    }
}

impl Navigator for MockNavigator {
    fn navigate(&self, route: &Route) -> impl Future<Output = ()> + Send {
        let redirects = Arc::clone(&self.redirects);
        let route = route.clone();

        async move {
            if let Ok(mut redirects) = redirects.lock() {
                redirects.push(route);
            }
        }
    }
}
