//! Outbound SSE event grammar.
//!
//! Each value here is one `data:` payload; the HTTP entrypoint (out of
//! scope) is responsible for wrapping it as `event: <type>\ndata: <json>\n\n`.
//! Every variant carries a non-empty type discriminator via `#[serde(tag)]`.

use serde::Deserialize;
use serde::Serialize;

/// An event emitted on the one-way event channel for a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InferenceEvent {
    /// Translated status line surfacing internal reasoning progress.
    Thinking {
        /// Translated content.
        content: String,
    },
    /// Append-only partial text.
    Text {
        /// Text chunk.
        content: String,
    },
    /// Rendered product markdown block.
    Products {
        /// Markdown content.
        content: String,
    },
    /// A single practical tip, unwrapped from its `[TIP]` tags.
    Tip {
        /// Tip body.
        content: String,
    },
    /// Ordered follow-up suggestions.
    QuickReplies {
        /// Suggested replies, in order.
        replies: Vec<String>,
    },
    /// Signals the client to discard prior `text`/`products` events from
    /// this request; emitted immediately before a fallback re-run.
    Retry {
        /// Human-readable reason.
        reason: String,
    },
    /// A terminal error.
    Error {
        /// Stable machine-readable error code.
        code: String,
        /// Human-readable message.
        message: String,
    },
    /// Terminal event for the request.
    Done {
        /// Canonical session id, stable across requests for this user.
        session_id: String,
        /// The model that actually produced the final response.
        model_used: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[expect(clippy::expect_used, reason = "test assertion")]
    fn every_event_serializes_with_a_type_tag() {
        let events = vec![
            InferenceEvent::Thinking {
                content: "thinking".into(),
            },
            InferenceEvent::Text {
                content: "hi".into(),
            },
            InferenceEvent::Retry {
                reason: "safety_block".into(),
            },
            InferenceEvent::Done {
                session_id: "session_deadbeefdeadbeef".into(),
                model_used: "primary".into(),
            },
        ];
        for event in events {
            let value = serde_json::to_value(&event).expect("serialize");
            assert!(value.get("type").is_some_and(serde_json::Value::is_string));
        }
    }
}
