//! Sandbox detection.

use crate::config::parse_flag;
use crate::constants::env_vars;

/// Tells whether the process runs in a sandboxed or offline environment
/// where the real identity pipeline cannot work.
pub trait RuntimeProbe: Send + Sync {
    /// `true` when the bypass pipeline should be used.
    fn is_sandboxed(&self) -> bool;
}

/// Reads `SESSION_SYNC_SANDBOX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProbe;

impl RuntimeProbe for EnvProbe {
    fn is_sandboxed(&self) -> bool {
        std::env::var(env_vars::SANDBOX)
            .ok()
            .and_then(|raw| parse_flag(&raw))
            .unwrap_or(false)
    }
}
