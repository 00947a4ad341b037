//! Shared protocol types for the hybrid inference core.
//!
//! This crate provides the foundational types shared across the inference
//! routing, function-calling loop, and conversation engine crates:
//! - Conversation data model (messages, parts, profile, user message)
//! - Model descriptors and routing/fallback decisions
//! - The outbound SSE event grammar
//! - Configuration shared by every component

pub mod config;
pub mod event;
pub mod fallback;
pub mod message;
pub mod model;
pub mod profile;
pub mod routing;
pub mod user_message;

pub use config::HybridInferenceConfig;
pub use event::InferenceEvent;
pub use fallback::FallbackDecision;
pub use fallback::FallbackReason;
pub use message::Message;
pub use message::Part;
pub use message::Role;
pub use model::ModelDescriptor;
pub use model::ModelRole;
pub use profile::Profile;
pub use routing::RoutingDecision;
pub use routing::RoutingReason;
pub use user_message::UserMessage;
