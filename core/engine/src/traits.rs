//! External collaborators the engine depends on only by interface.
//!
//! Persistence, catalog search, fact extraction, and thought localization
//! are all owned outside this crate; these traits are the seams.

use crate::error::Result;
use async_trait::async_trait;
use hic_protocol::Message;
use hic_protocol::Profile;
use std::fmt::Debug;

/// Owns conversation history persistence.
///
/// The engine only ever borrows a snapshot for the duration of one request;
/// it never assumes exclusive access to the underlying store.
#[async_trait]
pub trait HistoryStore: Send + Sync + Debug {
    /// Resolve `session_hint` to a session id already on file for
    /// `user_id`, or `None` if it does not match (a fresh id should be
    /// minted by the caller in that case).
    async fn resolve_session(&self, user_id: &str, session_hint: Option<&str>) -> Result<Option<String>>;

    /// Fetch the most recent `limit` messages for `session_id`, oldest first.
    async fn fetch_recent(&self, session_id: &str, limit: usize) -> Result<Vec<Message>>;

    /// Append newly exchanged messages to the stored history.
    async fn append(&self, session_id: &str, messages: &[Message]) -> Result<()>;
}

/// Owns the user profile record.
#[async_trait]
pub trait ProfileStore: Send + Sync + Debug {
    /// Fetch the profile for `user_id`, or a default if none is on file.
    async fn fetch(&self, user_id: &str) -> Result<Profile>;
}

/// Invoked on the messages a compaction pass is about to drop, so their
/// facts can be extracted before the text itself is discarded.
#[async_trait]
pub trait MemoryHooks: Send + Sync + Debug {
    /// Extract and persist any durable facts from `dropped` before they are
    /// summarized away. Must not block the hot path past the pre-flush;
    /// errors are logged, never surfaced to the caller.
    async fn pre_flush(&self, user_id: &str, dropped: &[Message]) -> Result<()>;
}
