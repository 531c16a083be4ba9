//! Session store port (trait) for dependency injection.
//!
//! Replaces a process-wide session table with an injected store so that
//! services can be tested without global state and the in-memory adapter can
//! be swapped for a shared store.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Keyed storage for per-user session state with explicit expiry
///
/// Implementations should handle:
/// - Concurrent access from independent sessions
/// - Expiry of idle entries (expired entries must be invisible to `get`)
#[async_trait]
pub trait SessionStore<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Retrieves a session by id
    ///
    /// # Returns
    /// - `Some(S)` if found and not expired
    /// - `None` otherwise
    async fn get(&self, id: &str) -> DomainResult<Option<S>>;

    /// Inserts or replaces a session and refreshes its expiry
    async fn put(&self, id: &str, session: S) -> DomainResult<()>;

    /// Removes a session, returning whether it existed
    async fn delete(&self, id: &str) -> DomainResult<bool>;

    /// Drops every expired entry, returning how many were removed
    async fn purge_expired(&self) -> DomainResult<usize>;
}
