//! Cooperative cancellation of long searches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

/// A flag a search polls between units of work.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

/// One live token per client session.
///
/// Starting a new search for a session cancels that session's previous one.
#[derive(Debug, Default)]
pub struct SupersedeRegistry {
    sessions: Mutex<HashMap<String, CancelToken>>,
}

impl SupersedeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new search for `session`, cancelling the one it replaces.
    pub fn begin(&self, session: &str) -> CancelToken {
        let token = CancelToken::new();
        let previous = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(session.to_string(), token.clone());
        if let Some(previous) = previous {
            debug!(session, "Superseding previous search");
            previous.cancel();
        }
        token
    }

    /// Forget `token` if it is still the session's current search.
    pub fn finish(&self, session: &str, token: &CancelToken) {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if sessions.get(session).is_some_and(|t| t.same_as(token)) {
            sessions.remove(session);
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn newer_search_cancels_older() {
        let registry = SupersedeRegistry::new();
        let first = registry.begin("abc");
        let second = registry.begin("abc");
        let other = registry.begin("xyz");

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!other.is_cancelled());
    }

    #[test]
    fn finish_only_removes_current() {
        let registry = SupersedeRegistry::new();
        let first = registry.begin("abc");
        let second = registry.begin("abc");

        registry.finish("abc", &first);
        assert_eq!(registry.active_sessions(), 1);

        registry.finish("abc", &second);
        assert_eq!(registry.active_sessions(), 0);
    }
}
