//! Pluggable persistence for session records.
//!
//! The [`SessionStore`] trait is the narrow contract a backend must satisfy:
//! `get`, `set`, `delete`, each a single atomic call. [`MemoryStore`] is the
//! default in-process implementation; production deployments inject a
//! networked or persistent backend instead.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Per-client session state, owned exclusively by the store.
///
/// The session identifier is the store key; middleware hands out a transient
/// handle carrying it for the duration of a request. The payload holds
/// application-defined key/value data (authorization-flow state in the full
/// system, empty in the MCP gateway).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session-scoped key/value data.
    pub payload: HashMap<String, serde_json::Value>,
}

impl SessionRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Failure talking to the session backend.
///
/// Surfaced to the caller as a 5xx; the gateway performs no retries. Retry
/// policy, if any, belongs to the backend itself.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or answered with a failure.
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence for session records.
///
/// Implementations must make each operation a single atomic call; the
/// middleware never issues multi-step sequences that span a suspension
/// point. Concurrent operations on *different* ids must not block each
/// other; concurrent writes to the *same* id resolve last-writer-wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the record for `id`, or `None` when the store has no entry.
    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Persist `record` under `id`, replacing any previous value.
    async fn set(&self, id: &str, record: SessionRecord) -> Result<(), StoreError>;

    /// Drop the record for `id`. Deleting an absent id is not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// In-memory session store backed by a shared map.
///
/// The default and test implementation. It has no TTL and no eviction, so a
/// long-running process accumulates records for every session ever issued;
/// production backends must provide their own expiry.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns true when no records are held.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn set(&self, id: &str, record: SessionRecord) -> Result<(), StoreError> {
        self.sessions.write().await.insert(id.to_string(), record);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_miss_returns_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new();
        let mut record = SessionRecord::new();
        record
            .payload
            .insert("state".to_string(), serde_json::json!("abc123"));

        store.set("sess-1", record.clone()).await.unwrap();
        assert_eq!(store.get("sess-1").await.unwrap(), Some(record));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_replaces_previous_record() {
        let store = MemoryStore::new();
        let mut first = SessionRecord::new();
        first.payload.insert("n".to_string(), serde_json::json!(1));
        let mut second = SessionRecord::new();
        second.payload.insert("n".to_string(), serde_json::json!(2));

        store.set("sess-1", first).await.unwrap();
        store.set("sess-1", second.clone()).await.unwrap();
        assert_eq!(store.get("sess-1").await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.set("sess-1", SessionRecord::new()).await.unwrap();
        store.delete("sess-1").await.unwrap();
        assert_eq!(store.get("sess-1").await.unwrap(), None);

        // Deleting an absent id is fine
        store.delete("sess-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_ids_do_not_interfere() {
        let store = MemoryStore::new();
        let mut a = SessionRecord::new();
        a.payload.insert("who".to_string(), serde_json::json!("a"));
        let mut b = SessionRecord::new();
        b.payload.insert("who".to_string(), serde_json::json!("b"));

        store.set("sess-a", a.clone()).await.unwrap();
        store.set("sess-b", b.clone()).await.unwrap();

        assert_eq!(store.get("sess-a").await.unwrap(), Some(a));
        assert_eq!(store.get("sess-b").await.unwrap(), Some(b));
    }
}
