//! Binds a model id and system prompt to a fresh `ChatSession`.

use crate::chat::ChatSession;
use crate::error::Result;
use async_trait::async_trait;
use hic_protocol::Message;
use std::fmt::Debug;

/// Creates a `ChatSession` bound to one model for the lifetime of a request.
///
/// Automatic function-calling must be disabled by the created session —
/// manual tool handling is mandatory, otherwise the upstream SDK would
/// swallow streaming text while it resolves tool calls on its own.
#[async_trait]
pub trait ChatSessionFactory: Send + Sync + Debug {
    /// Open a session against `model`, seeded with `system_prompt` and the
    /// prior conversation history (oldest first).
    async fn create(
        &self,
        model: &str,
        system_prompt: &str,
        history: &[Message],
    ) -> Result<Box<dyn ChatSession>>;
}
