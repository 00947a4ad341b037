//! Per-round and per-request state for the function-calling loop.

use crate::buffer::Product;
use hic_protocol::Message;
use hic_upstream::ContentPart;
use hic_upstream::FinishReason;
use hic_upstream::ToolCall;
use std::collections::HashSet;

/// How a single round was classified once its stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundResult {
    /// At least one function call was present; the loop continues.
    Continue,
    /// Non-empty text with no function call; the loop is done.
    Complete,
    /// No text and no function call; an empty round.
    Empty,
    /// The round raised an error.
    Error,
}

/// Everything accumulated while driving a single round to completion.
#[derive(Debug, Clone, Default)]
pub struct RoundOutput {
    /// How the round was classified.
    pub result: Option<RoundResult>,
    /// Text accumulated during this round (after prelude-discard rules).
    pub accumulated_text: String,
    /// Function calls requested by the model this round.
    pub function_calls: Vec<ToolCall>,
    /// Translated internal reasoning thoughts surfaced this round.
    pub thoughts: Vec<String>,
    /// The first raw `Thinking` part seen this round, signature intact, to
    /// be echoed back verbatim ahead of the next round's tool responses.
    pub thinking: Option<ContentPart>,
    /// The finish reason of the round's final chunk.
    pub finish_reason: Option<FinishReason>,
}

/// State threaded across rounds of one `execute_streaming` call.
#[derive(Debug, Clone, Default)]
pub struct LoopState {
    /// Outbound/inbound messages exchanged so far, oldest first.
    pub messages: Vec<Message>,
    /// Product lines recognized across every round.
    pub all_products: Vec<Product>,
    /// `(tool_name, args)` signatures already executed this request.
    pub executed_queries: HashSet<String>,
    /// Narrative text accumulated across every round.
    pub accumulated_text: String,
    /// Finish reason of the most recently completed round.
    pub last_finish_reason: Option<FinishReason>,
    /// Count of rounds driven so far, including the forced terminal round.
    pub round_index: u32,
}

impl LoopState {
    /// An empty state, ready for the first round.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stable signature for `(tool, args)` used for duplicate-call dedup.
    pub fn query_signature(tool: &str, args: &serde_json::Value) -> String {
        format!("{tool}({args})")
    }

    /// True if this exact `(tool, args)` pair was already executed.
    pub fn has_executed(&self, tool: &str, args: &serde_json::Value) -> bool {
        self.executed_queries.contains(&Self::query_signature(tool, args))
    }

    /// Record that `(tool, args)` has now been executed.
    pub fn mark_executed(&mut self, tool: &str, args: &serde_json::Value) {
        self.executed_queries.insert(Self::query_signature(tool, args));
    }
}
