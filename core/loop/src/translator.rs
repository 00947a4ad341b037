//! Translates upstream reasoning traces into client-facing status lines.

use crate::error::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// Translates an internal `Thinking` part into a short status line suitable
/// for the `thinking` SSE event.
///
/// Owned externally (localization, summarization, or a no-op passthrough are
/// all valid implementations); the loop only ever calls `translate`.
#[async_trait]
pub trait ThoughtTranslator: Send + Sync + Debug {
    /// Translate `thought` into a user-facing status line.
    async fn translate(&self, thought: &str) -> Result<String>;
}
