//! Host router hook.

use crate::state::Route;
use std::future::Future;

/// Performs redirects issued by the navigation guard.
pub trait Navigator: Send + Sync {
    /// Move the application to `route`.
    fn navigate(&self, route: &Route) -> impl Future<Output = ()> + Send;
}
