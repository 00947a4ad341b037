//! Inbound user message payload.

use serde::Deserialize;
use serde::Serialize;

/// A single inbound user message plus routing hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMessage {
    /// The message text.
    pub text: String,
    /// Opaque user identifier, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Client-supplied session key, to be rebound to a stored session if it
    /// matches one the engine recognizes for this user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_hint: Option<String>,
}

impl UserMessage {
    /// Construct a bare message with no user/session hints.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user_id: None,
            session_hint: None,
        }
    }
}
