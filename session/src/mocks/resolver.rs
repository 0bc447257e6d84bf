//! Mock profile resolver for testing.

use crate::providers::{ProfileResolver, ProfileResult};
use crate::state::{Token, UserProfile};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

#[derive(Debug)]
struct Script {
    queued: VecDeque<ProfileResult>,
    fallback: ProfileResult,
    tokens: Vec<String>,
}

/// Mock profile resolver.
///
/// Answers from a script, then with a fallback. Counts calls and can hold
/// every call in flight until its [`ResolverGate`] is opened.
#[derive(Debug, Clone)]
pub struct MockProfileResolver {
    script: Arc<Mutex<Script>>,
    calls: Arc<AtomicUsize>,
    gate: Option<watch::Receiver<bool>>,
}

/// Releases calls held by a gated [`MockProfileResolver`].
#[derive(Debug)]
pub struct ResolverGate {
    tx: watch::Sender<bool>,
}

impl ResolverGate {
    /// Let every held and future call through.
    pub fn open(&self) {
        let _ = self.tx.send(true);
    }
}

impl MockProfileResolver {
    /// Resolver that always finds `{id: "u1", name: "Ada"}`.
    #[must_use]
    pub fn new() -> Self {
        Self::always(ProfileResult::Found(UserProfile::new("u1", "Ada")))
    }

    /// Resolver that always answers `result`.
    #[must_use]
    pub fn always(result: ProfileResult) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                queued: VecDeque::new(),
                fallback: result,
                tokens: Vec::new(),
            })),
            calls: Arc::new(AtomicUsize::new(0)),
            gate: None,
        }
    }

    /// Answer `results` in order before falling back.
    #[must_use]
    pub fn then(self, results: impl IntoIterator<Item = ProfileResult>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.queued.extend(results);
        }
        self
    }

    /// Hold calls until the returned gate is opened.
    #[must_use]
    pub fn gated(mut self) -> (Self, ResolverGate) {
        let (tx, rx) = watch::channel(false);
        self.gate = Some(rx);
        (self, ResolverGate { tx })
    }

    /// Number of `resolve` calls so far, including held ones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Bearer tokens received, oldest first.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        self.script
            .lock()
            .map(|script| script.tokens.clone())
            .unwrap_or_default()
    }
}

impl Default for MockProfileResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileResolver for MockProfileResolver {
    fn resolve(&self, token: &Token) -> impl Future<Output = ProfileResult> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = Arc::clone(&self.script);
        let gate = self.gate.clone();
        let token = token.as_str().to_string();

        async move {
            if let Some(mut gate) = gate {
                let _ = gate.wait_for(|open| *open).await;
            }

            let Ok(mut script) = script.lock() else {
                return ProfileResult::TransportError("mock poisoned".to_string());
            };
            script.tokens.push(token);
            script
                .queued
                .pop_front()
                .unwrap_or_else(|| script.fallback.clone())
        }
    }
}
