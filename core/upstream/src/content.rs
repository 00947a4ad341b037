//! Content vocabulary exchanged with an upstream model.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// One block of content in a request or response turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// The text itself.
        text: String,
    },
    /// A request from the model to invoke a named tool.
    ToolUse {
        /// Opaque id correlating this call with its eventual `ToolResult`.
        id: String,
        /// Tool name.
        name: String,
        /// Tool arguments as the upstream serialized them.
        input: Value,
    },
    /// The result of a previously requested tool call.
    ToolResult {
        /// Id matching the originating `ToolUse`.
        tool_use_id: String,
        /// Result payload.
        content: Value,
        /// Whether the tool call failed.
        #[serde(default)]
        is_error: bool,
    },
    /// Internal reasoning trace, opaque except for its signature.
    Thinking {
        /// The reasoning text, when the upstream exposes it.
        content: String,
        /// Opaque signature blob that must be echoed back verbatim on the
        /// next turn; never inspected or transformed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
}

impl ContentPart {
    /// Construct a text part.
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Construct a tool-use part.
    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        ContentPart::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Construct a successful tool-result part.
    pub fn tool_result(tool_use_id: impl Into<String>, content: Value) -> Self {
        ContentPart::ToolResult {
            tool_use_id: tool_use_id.into(),
            content,
            is_error: false,
        }
    }

    /// Construct a thinking part, optionally carrying an opaque signature.
    pub fn thinking(content: impl Into<String>, signature: Option<String>) -> Self {
        ContentPart::Thinking {
            content: content.into(),
            signature,
        }
    }

    /// The text of this part, if it is a `Text` part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Whether this part requests a tool call.
    pub fn is_tool_use(&self) -> bool {
        matches!(self, ContentPart::ToolUse { .. })
    }

    /// Whether this part carries reasoning content.
    pub fn is_thinking(&self) -> bool {
        matches!(self, ContentPart::Thinking { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[expect(clippy::expect_used, reason = "test assertion")]
    fn thinking_signature_roundtrips_through_json() {
        let part = ContentPart::thinking("reasoning...", Some("sig-abc".into()));
        let json = serde_json::to_value(&part).expect("serialize");
        let back: ContentPart = serde_json::from_value(json).expect("deserialize");
        match back {
            ContentPart::Thinking { signature, .. } => {
                assert_eq!(signature.as_deref(), Some("sig-abc"));
            }
            _ => panic!("expected thinking part"),
        }
    }

    #[test]
    fn text_extraction_ignores_non_text_parts() {
        let part = ContentPart::tool_use("call_1", "lookup", serde_json::json!({}));
        assert_eq!(part.as_text(), None);
        assert!(part.is_tool_use());
    }
}
