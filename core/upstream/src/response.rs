//! Terminal markers and streamed chunks from a generation round.

use crate::content::ContentPart;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Terminal marker attached to the last streaming chunk of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of generation.
    Stop,
    /// Blocked for safety reasons.
    Safety,
    /// Blocked as recitation of training data.
    Recitation,
    /// Hit the model's max-output-tokens limit.
    MaxTokens,
    /// The model requested one or more tool calls.
    ToolCall,
    /// The round has not finished yet (an intermediate chunk).
    InProgress,
}

impl FinishReason {
    /// The reason as a stable lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Safety => "safety",
            FinishReason::Recitation => "recitation",
            FinishReason::MaxTokens => "max_tokens",
            FinishReason::ToolCall => "tool_call",
            FinishReason::InProgress => "in_progress",
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single tool call requested by the model in one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque id correlating this call with its eventual result.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Structured arguments, as the upstream serialized them.
    pub arguments: Value,
}

/// One chunk of a streamed generation round.
///
/// `content` may be absent or contain an empty vector even on an otherwise
/// successful chunk; callers must treat that as "no parts this chunk", never
/// as an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Content parts delivered in this chunk, if any.
    #[serde(default)]
    pub content: Vec<ContentPart>,
    /// Set on the final chunk of a round; `None` on intermediate chunks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl StreamChunk {
    /// Construct an intermediate chunk carrying the given parts.
    pub fn parts(content: Vec<ContentPart>) -> Self {
        Self {
            content,
            finish_reason: None,
        }
    }

    /// Construct the terminal chunk of a round.
    pub fn finished(content: Vec<ContentPart>, finish_reason: FinishReason) -> Self {
        Self {
            content,
            finish_reason: Some(finish_reason),
        }
    }

    /// Defensive accessor: never panics on a null/absent `content` field.
    pub fn parts_or_empty(&self) -> &[ContentPart] {
        &self.content
    }

    /// Extract any tool calls present in this chunk's content.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::ToolUse { id, name, input } => Some(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    arguments: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}
