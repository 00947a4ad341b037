//! The streaming chat session the function-calling loop drives.

use crate::content::ContentPart;
use crate::error::Result;
use crate::response::StreamChunk;
use async_trait::async_trait;
use std::fmt::Debug;

/// A stream of chunks for one round of generation.
///
/// Boxed rather than generic so `FunctionCallingLoop` can hold a
/// `Box<dyn ChatSession>` without threading a stream type parameter through
/// every caller.
pub type ChunkStream = std::pin::Pin<Box<dyn futures::Stream<Item = Result<StreamChunk>> + Send>>;

/// A bound streaming chat session against one concrete upstream model.
///
/// Implementations talk to exactly one model id for their lifetime;
/// model selection and fallback happen one layer up, in
/// `HybridInferenceManager`. Automatic function-calling must be disabled by
/// the implementation — the loop handles tool dispatch manually, per the
/// system-prompt contract the upstream was configured with.
#[async_trait]
pub trait ChatSession: Send + Sync + Debug {
    /// The model id this session is bound to.
    fn model(&self) -> &str;

    /// Send a round's outbound parts (a user message, or tool-response
    /// parts answering the previous round's tool calls) and stream back the
    /// model's reply for that round.
    async fn send(&mut self, parts: Vec<ContentPart>) -> Result<ChunkStream>;
}
