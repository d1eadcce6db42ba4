//! In-memory session store
//!
//! Records live in a `DashMap`, so operations on one token are serialized by
//! its shard lock while different tokens rarely contend. The number of held
//! records is tracked in an atomic counter that is only incremented by an
//! insertion into a vacant entry, which keeps the capacity check exact under
//! concurrent logins.

use async_trait::async_trait;
use campusgate_core::{Error, Result, SessionRecord, SessionStore, SessionUpdate};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::token;

#[derive(Debug)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionRecord>,
    count: AtomicUsize,
    max_sessions: usize,
    ttl: chrono::Duration,
}

impl InMemorySessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_limits(config.max_sessions, config.ttl())
    }

    /// Create a store with an explicit capacity and idle timeout
    pub fn with_limits(max_sessions: usize, ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            count: AtomicUsize::new(0),
            max_sessions,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    fn is_expired(&self, record: &SessionRecord, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(record.last_accessed_at) > self.ttl
    }

    /// Reserve one slot of capacity, failing when the store is full
    fn reserve_slot(&self) -> Result<()> {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < self.max_sessions).then_some(current + 1)
            })
            .map(|_| ())
            .map_err(|_| Error::CapacityExceeded {
                max_sessions: self.max_sessions,
            })
    }

    fn release_slots(&self, n: usize) {
        if n > 0 {
            self.count.fetch_sub(n, Ordering::AcqRel);
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn can_create_session(&self) -> bool {
        self.count.load(Ordering::Acquire) < self.max_sessions
    }

    fn generate_secure_token(&self) -> Result<String> {
        token::generate_secure_token()
    }

    async fn save_session(&self, record: SessionRecord) -> Result<()> {
        match self.sessions.entry(record.token.clone()) {
            Entry::Occupied(mut existing) => {
                existing.insert(record);
            }
            Entry::Vacant(vacant) => {
                self.reserve_slot()?;
                vacant.insert(record);
            }
        }
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Option<SessionRecord> {
        let now = Utc::now();
        {
            let mut record = self.sessions.get_mut(token)?;
            if !self.is_expired(&record, now) {
                record.last_accessed_at = now;
                return Some(record.clone());
            }
        }

        if self
            .sessions
            .remove_if(token, |_, record| self.is_expired(record, now))
            .is_some()
        {
            self.release_slots(1);
            debug!("Dropped expired session on access");
        }
        None
    }

    async fn update_session(&self, token: &str, update: SessionUpdate) -> bool {
        match self.sessions.get_mut(token) {
            Some(mut record) => {
                record.apply(update);
                true
            }
            None => false,
        }
    }

    async fn delete_session(&self, token: &str) -> bool {
        let removed = self.sessions.remove(token).is_some();
        if removed {
            self.release_slots(1);
        }
        removed
    }

    async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        self.sessions.retain(|_, record| {
            let keep = !self.is_expired(record, now);
            if !keep {
                removed += 1;
            }
            keep
        });
        self.release_slots(removed);

        if removed > 0 {
            info!(
                "Swept {} expired sessions ({} active)",
                removed,
                self.count.load(Ordering::Acquire)
            );
        }
        removed
    }

    async fn active_sessions(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusgate_core::{CookieSet, SecondaryLoginState};
    use std::sync::Arc;

    fn record(token: &str) -> SessionRecord {
        SessionRecord::new(token, "2110123", CookieSet::new("SESSION=a"), None, None)
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = InMemorySessionStore::new(&SessionConfig::default());
        store.save_session(record("t1")).await.unwrap();

        let found = store.get_session("t1").await.unwrap();
        assert_eq!(found.username, "2110123");
        assert!(store.get_session("missing").await.is_none());
        assert_eq!(store.active_sessions().await, 1);
    }

    #[tokio::test]
    async fn test_get_refreshes_last_access() {
        let store = InMemorySessionStore::new(&SessionConfig::default());
        let mut old = record("t1");
        old.last_accessed_at = Utc::now() - chrono::Duration::seconds(60);
        let before = old.last_accessed_at;
        store.save_session(old).await.unwrap();

        let found = store.get_session("t1").await.unwrap();
        assert!(found.last_accessed_at > before);
    }

    #[tokio::test]
    async fn test_capacity_is_enforced_and_refilled() {
        let store = InMemorySessionStore::with_limits(2, Duration::from_secs(60));
        store.save_session(record("a")).await.unwrap();
        store.save_session(record("b")).await.unwrap();

        assert!(!store.can_create_session().await);
        let err = store.save_session(record("c")).await.unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { max_sessions: 2 }));

        // Replacing an existing record does not need a free slot
        store.save_session(record("a")).await.unwrap();

        assert!(store.delete_session("a").await);
        assert!(store.can_create_session().await);
        store.save_session(record("c")).await.unwrap();
        assert_eq!(store.active_sessions().await, 2);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemorySessionStore::new(&SessionConfig::default());
        store.save_session(record("a")).await.unwrap();
        assert!(store.delete_session("a").await);
        assert!(!store.delete_session("a").await);
        assert_eq!(store.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_update_missing_token_does_not_resurrect() {
        let store = InMemorySessionStore::new(&SessionConfig::default());
        store.save_session(record("a")).await.unwrap();
        store.delete_session("a").await;

        let applied = store
            .update_session("a", SessionUpdate::SecondaryFailed)
            .await;
        assert!(!applied);
        assert!(store.get_session("a").await.is_none());
        assert_eq!(store.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_update_applies_to_record() {
        let store = InMemorySessionStore::new(&SessionConfig::default());
        store.save_session(record("a")).await.unwrap();

        assert!(
            store
                .update_session(
                    "a",
                    SessionUpdate::SecondaryEstablished(CookieSet::new("JSESSIONID=x"))
                )
                .await
        );
        let found = store.get_session("a").await.unwrap();
        assert_eq!(found.secondary, SecondaryLoginState::Established);
        assert!(found.secondary_logged_in());
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped_on_access() {
        let store = InMemorySessionStore::with_limits(5, Duration::from_secs(60));
        let mut stale = record("old");
        stale.last_accessed_at = Utc::now() - chrono::Duration::seconds(120);
        store.save_session(stale).await.unwrap();

        assert!(store.get_session("old").await.is_none());
        assert_eq!(store.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let store = InMemorySessionStore::with_limits(5, Duration::from_secs(60));
        let mut stale = record("old");
        stale.last_accessed_at = Utc::now() - chrono::Duration::seconds(120);
        store.save_session(stale).await.unwrap();
        store.save_session(record("fresh")).await.unwrap();

        assert_eq!(store.sweep_expired().await, 1);
        assert_eq!(store.active_sessions().await, 1);
        assert!(store.get_session("fresh").await.is_some());
        assert_eq!(store.sweep_expired().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_saves_never_exceed_capacity() {
        let store = Arc::new(InMemorySessionStore::with_limits(10, Duration::from_secs(60)));

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.save_session(record(&format!("t{}", i))).await })
            })
            .collect();

        let mut saved = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                saved += 1;
            }
        }

        assert_eq!(saved, 10);
        assert_eq!(store.active_sessions().await, 10);
    }
}
