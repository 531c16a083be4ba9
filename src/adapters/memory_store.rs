//! In-memory session store with idle expiry.
//!
//! Each entry remembers when it was last written. Entries idle for longer than
//! the TTL are invisible to `get` and are dropped by `purge_expired`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::ports::SessionStore;

/// Default idle TTL for sessions.
const DEFAULT_TTL_SECS: u64 = 3600;

struct Entry<S> {
    value: S,
    touched: Instant,
}

/// Session store backed by a `HashMap` behind a tokio `RwLock`.
pub struct InMemorySessionStore<S> {
    entries: RwLock<HashMap<String, Entry<S>>>,
    ttl: Duration,
}

impl<S> Default for InMemorySessionStore<S> {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

impl<S> InMemorySessionStore<S> {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, expired ones included until purged
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn is_live(&self, entry: &Entry<S>, now: Instant) -> bool {
        now.duration_since(entry.touched) < self.ttl
    }
}

#[async_trait]
impl<S> SessionStore<S> for InMemorySessionStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn get(&self, id: &str) -> DomainResult<Option<S>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(id)
            .filter(|entry| self.is_live(entry, now))
            .map(|entry| entry.value.clone()))
    }

    async fn put(&self, id: &str, value: S) -> DomainResult<()> {
        self.entries.write().await.insert(
            id.to_string(),
            Entry {
                value,
                touched: Instant::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        let now = Instant::now();
        let removed = self.entries.write().await.remove(id);
        Ok(removed.is_some_and(|entry| self.is_live(&entry, now)))
    }

    async fn purge_expired(&self) -> DomainResult<usize> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.touched) < self.ttl);
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!(purged, remaining = entries.len(), "purged expired sessions");
        }
        Ok(purged)
    }
}
