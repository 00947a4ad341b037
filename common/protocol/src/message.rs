//! Conversation history data model.
//!
//! A [`Message`] belongs to one of three roles and carries an ordered list
//! of [`Part`]s. `HistoryStore` owns persistence; the engine only ever
//! borrows a snapshot of this shape for the duration of one request.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Who produced a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The end user.
    User,
    /// The upstream model.
    Assistant,
    /// A tool/function result fed back to the model.
    Tool,
}

/// One piece of content within a [`Message`].
///
/// Mirrors the shape the upstream model actually emits: plain text, a
/// function call (with an optional opaque continuation signature attached
/// to at most the first call of a round), a function response, or an
/// internal thought that is never shown to the end user verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Plain user-facing text.
    Text {
        /// The text content.
        text: String,
    },
    /// A request to invoke a tool.
    FunctionCall {
        /// Tool name.
        name: String,
        /// Structured arguments.
        args: Value,
        /// Opaque continuation blob the upstream attaches to (usually only)
        /// the first function call of a round; echoed back unmodified.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    /// The result of a tool invocation, fed back as the next turn's input.
    FunctionResponse {
        /// Tool name this responds to.
        name: String,
        /// Structured result.
        result: Value,
    },
    /// Internal reasoning text, never forwarded to the end user except as
    /// a translated status ping.
    Thought {
        /// Raw thought text.
        text: String,
    },
}

impl Part {
    /// The text of this part, if it is a [`Part::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            _ => None,
        }
    }

    /// True if this part is a function call.
    pub fn is_function_call(&self) -> bool {
        matches!(self, Part::FunctionCall { .. })
    }
}

/// A single message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who produced this message.
    pub role: Role,
    /// The message's content parts. Defensively treated as empty when a
    /// wire payload carries a null/absent `parts` field upstream; once
    /// constructed here the vector is always a valid (possibly empty) list.
    pub parts: Vec<Part>,
}

impl Message {
    /// Construct a user message with a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    /// Construct an assistant message from arbitrary parts.
    pub fn assistant(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Assistant,
            parts,
        }
    }

    /// Construct a tool-role message carrying function responses.
    pub fn tool(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Tool,
            parts,
        }
    }

    /// Concatenated text across all [`Part::Text`] parts.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }
}
