//! Minimal vocabulary for talking to a streaming generative upstream model.
//!
//! This crate is deliberately not a full provider SDK: it defines only the
//! content/response shapes and the `ChatSession` trait the function-calling
//! loop drives. Wiring a concrete provider behind `ChatSession` is out of
//! scope here.

pub mod chat;
pub mod content;
pub mod error;
pub mod factory;
pub mod response;

pub use chat::ChatSession;
pub use chat::ChunkStream;
pub use content::ContentPart;
pub use error::UpstreamError;
pub use factory::ChatSessionFactory;
pub use response::FinishReason;
pub use response::StreamChunk;
pub use response::ToolCall;
