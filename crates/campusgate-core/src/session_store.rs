//! Session store trait
//!
//! The `SessionStore` trait abstracts over where session records live. The
//! in-process implementation (`campusgate_session::InMemorySessionStore`) suits a
//! single instance with a hard memory ceiling; a shared key-value store can sit
//! behind the same trait for horizontal scaling without touching the
//! orchestrator or the parser.

use async_trait::async_trait;

use crate::{Result, SessionRecord, SessionUpdate};

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Whether one more session fits under the configured maximum
    async fn can_create_session(&self) -> bool;

    /// Generate an unguessable session token
    ///
    /// # Errors
    /// - `Error::TokenGeneration` if the OS random source is unavailable
    fn generate_secure_token(&self) -> Result<String>;

    /// Insert or replace the record stored under `record.token`
    ///
    /// # Errors
    /// - `Error::CapacityExceeded` when inserting a new token into a full store
    async fn save_session(&self, record: SessionRecord) -> Result<()>;

    /// Snapshot of a live record; refreshes its last-access time.
    ///
    /// Returns `None` for unknown and expired tokens.
    async fn get_session(&self, token: &str) -> Option<SessionRecord>;

    /// Apply an update to an existing record.
    ///
    /// Returns `false` (and does nothing) when the token is gone, so late
    /// background updates never resurrect a deleted session.
    async fn update_session(&self, token: &str, update: SessionUpdate) -> bool;

    /// Remove a record; returns whether it existed
    async fn delete_session(&self, token: &str) -> bool;

    /// Remove every expired record; returns how many were removed
    async fn sweep_expired(&self) -> usize;

    /// Number of records currently held
    async fn active_sessions(&self) -> usize;

    /// Configured maximum number of records
    fn max_sessions(&self) -> usize;
}
