//! Active poll session registry.
//!
//! Enforces one polling loop per cache key within a client. A second
//! caller for a key that is already being polled is rejected with
//! [`AnalysisError::DuplicateSession`]; the running loop is unaffected.

use careline_domain::{AnalysisError, CacheKey};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Set of cache keys with a live poll loop.
///
/// Cheap to clone; clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct ActiveSessions {
    keys: Arc<Mutex<HashSet<CacheKey>>>,
}

impl ActiveSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `cache_key` for the caller.
    ///
    /// The claim is released when the returned guard is dropped, on every
    /// exit path of the poll loop including cancellation.
    pub fn try_acquire(&self, cache_key: &CacheKey) -> Result<SessionGuard, AnalysisError> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(cache_key.clone()) {
            return Err(AnalysisError::DuplicateSession(cache_key.clone()));
        }
        debug!("Acquired poll session for {}", cache_key);
        Ok(SessionGuard {
            sessions: self.clone(),
            cache_key: cache_key.clone(),
        })
    }

    pub fn is_active(&self, cache_key: &CacheKey) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(cache_key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, cache_key: &CacheKey) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(cache_key);
        debug!("Released poll session for {}", cache_key);
    }
}

/// Exclusive claim on one cache key.
#[derive(Debug)]
pub struct SessionGuard {
    sessions: ActiveSessions,
    cache_key: CacheKey,
}

impl SessionGuard {
    pub fn cache_key(&self) -> &CacheKey {
        &self.cache_key
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.release(&self.cache_key);
    }
}
