//! The multi-round function-calling loop.

use crate::buffer::ResponseBuffer;
use crate::error::Result;
use crate::error::loop_error;
use crate::state::LoopState;
use crate::state::RoundOutput;
use crate::state::RoundResult;
use crate::translator::ThoughtTranslator;
use futures::StreamExt;
use hic_protocol::InferenceEvent;
use hic_protocol::Message;
use hic_protocol::Part;
use hic_tools::ToolRegistry;
use hic_upstream::ChatSession;
use hic_upstream::ContentPart;
use hic_upstream::ToolCall;
use serde_json::json;
use snafu::ResultExt;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

/// Maximum number of ordinary rounds before one forced terminal round.
const DEFAULT_MAX_ROUNDS: u32 = 5;

/// Text a prelude must exceed to be forwarded alongside a function call.
const PRELUDE_DISCARD_THRESHOLD: usize = 50;

/// Wall-clock budget for one round's upstream call and stream, absent an
/// explicit override.
const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives a bound chat session through successive rounds of text and tool
/// calls, forwarding narrative text through a `ResponseBuffer` and emitting
/// events on a channel.
pub struct FunctionCallingLoop {
    session: Box<dyn ChatSession>,
    tools: Arc<dyn ToolRegistry>,
    events: mpsc::Sender<InferenceEvent>,
    translator: Arc<dyn ThoughtTranslator>,
    cancel: CancellationToken,
    max_rounds: u32,
    round_timeout: Duration,
}

impl FunctionCallingLoop {
    /// Construct a loop bound to `session`, dispatching tool calls through
    /// `tools`, translating reasoning traces through `translator`, and
    /// emitting events on `events`.
    pub fn new(
        session: Box<dyn ChatSession>,
        tools: Arc<dyn ToolRegistry>,
        events: mpsc::Sender<InferenceEvent>,
        translator: Arc<dyn ThoughtTranslator>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            tools,
            events,
            translator,
            cancel,
            max_rounds: DEFAULT_MAX_ROUNDS,
            round_timeout: DEFAULT_ROUND_TIMEOUT,
        }
    }

    /// Override the round bound (the teacher's default is almost always right).
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Override the per-round wall-clock budget.
    pub fn with_round_timeout(mut self, round_timeout: Duration) -> Self {
        self.round_timeout = round_timeout;
        self
    }

    /// Drive the loop to completion, sending the initial `message`.
    ///
    /// Returns the terminal `LoopState`, raising [`LoopError::EmptyResponse`]
    /// if every round produced neither text nor a function call.
    pub async fn execute_streaming(&mut self, message: Vec<ContentPart>) -> Result<LoopState> {
        let mut state = LoopState::new();
        let mut buffer = ResponseBuffer::new();
        let mut outbound = message;
        let mut forced_round_used = false;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let round = self.run_round(&outbound, &mut buffer, &mut state).await?;
            state.round_index += 1;
            state.last_finish_reason = round.finish_reason;

            match round.result {
                Some(RoundResult::Complete) => break,
                Some(RoundResult::Error) | None => {
                    return loop_error::EmptyResponseSnafu.fail();
                }
                Some(result) => {
                    if forced_round_used {
                        // The forced terminal round itself produced neither
                        // COMPLETE text nor gave up; stop to avoid unbounded
                        // recursion and surface whatever was accumulated.
                        break;
                    }
                    if state.round_index >= self.max_rounds {
                        debug!(round = state.round_index, "forcing terminal round");
                        forced_round_used = true;
                        outbound = forced_text_round();
                        continue;
                    }
                    outbound = match result {
                        RoundResult::Continue => {
                            let mut responses = self.build_tool_responses(&round.function_calls, &mut state).await;
                            if let Some(thinking) = round.thinking {
                                responses.insert(0, thinking);
                            }
                            responses
                        }
                        // An empty round gets one retry with the same outbound.
                        _ => outbound,
                    };
                }
            }
        }

        if state.accumulated_text.is_empty() && state.all_products.is_empty() {
            return loop_error::EmptyResponseSnafu.fail();
        }

        Ok(state)
    }

    async fn run_round(
        &mut self,
        outbound: &[ContentPart],
        buffer: &mut ResponseBuffer,
        state: &mut LoopState,
    ) -> Result<RoundOutput> {
        let started = Instant::now();
        match tokio::time::timeout(self.round_timeout, self.drive_round(outbound, buffer, state)).await {
            Ok(result) => result,
            Err(_elapsed) => loop_error::TimeoutSnafu {
                elapsed_ms: started.elapsed().as_millis() as u64,
            }
            .fail(),
        }
    }

    async fn drive_round(
        &mut self,
        outbound: &[ContentPart],
        buffer: &mut ResponseBuffer,
        state: &mut LoopState,
    ) -> Result<RoundOutput> {
        let mut output = RoundOutput::default();
        let mut stream = self
            .session
            .send(outbound.to_vec())
            .await
            .context(loop_error::UpstreamSnafu)?;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context(loop_error::UpstreamSnafu)?;
            for part in chunk.parts_or_empty() {
                match part {
                    ContentPart::Text { text } => {
                        output.accumulated_text.push_str(text);
                    }
                    ContentPart::Thinking { content, signature } => {
                        if output.thinking.is_none() {
                            output.thinking = Some(ContentPart::Thinking {
                                content: content.clone(),
                                signature: signature.clone(),
                            });
                        }
                        let translated = self
                            .translator
                            .translate(content)
                            .await
                            .unwrap_or_else(|_| content.clone());
                        output.thoughts.push(translated.clone());
                        let _ = self.events.send(InferenceEvent::Thinking { content: translated }).await;
                    }
                    ContentPart::ToolUse { id, name, input } => {
                        output.function_calls.push(ToolCall {
                            id: id.clone(),
                            name: name.clone(),
                            arguments: input.clone(),
                        });
                    }
                    ContentPart::ToolResult { .. } => {}
                }
            }
            if let Some(reason) = chunk.finish_reason {
                output.finish_reason = Some(reason);
            }
        }

        let text_len = output.accumulated_text.trim().chars().count();
        if !output.function_calls.is_empty() {
            output.result = Some(RoundResult::Continue);
            if text_len <= PRELUDE_DISCARD_THRESHOLD {
                debug!(text_len, "discarding interrupted prelude before function call");
                output.accumulated_text.clear();
            } else {
                self.forward_text(&output.accumulated_text, buffer, state).await;
            }
        } else if text_len > 0 {
            output.result = Some(RoundResult::Complete);
            self.forward_text(&output.accumulated_text, buffer, state).await;
        } else {
            output.result = Some(RoundResult::Empty);
        }

        Ok(output)
    }

    async fn forward_text(&self, text: &str, buffer: &mut ResponseBuffer, state: &mut LoopState) {
        buffer.append_chunk(text);
        state.accumulated_text.push_str(text);
        let snapshot = buffer.snapshot();
        if !snapshot.text.is_empty() {
            let _ = self
                .events
                .send(InferenceEvent::Text { content: snapshot.text.clone() })
                .await;
        }
        for product in &snapshot.products {
            if !state.all_products.iter().any(|p| p.name == product.name) {
                state.all_products.push(product.clone());
            }
        }
        if !snapshot.products.is_empty() {
            let markdown = snapshot
                .products
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{}. {} — {}₾", i + 1, p.name, p.price))
                .collect::<Vec<_>>()
                .join("\n");
            let _ = self.events.send(InferenceEvent::Products { content: markdown }).await;
        }
        if let Some(tip) = snapshot.tip {
            let _ = self.events.send(InferenceEvent::Tip { content: tip }).await;
        }
        if !snapshot.quick_replies.is_empty() {
            let _ = self
                .events
                .send(InferenceEvent::QuickReplies { replies: snapshot.quick_replies })
                .await;
        }
    }

    async fn build_tool_responses(
        &self,
        calls: &[ToolCall],
        state: &mut LoopState,
    ) -> Vec<ContentPart> {
        let mut responses = Vec::with_capacity(calls.len());
        for call in calls {
            if state.has_executed(&call.name, &call.arguments) {
                warn!(tool = %call.name, "duplicate tool call suppressed");
                responses.push(ContentPart::ToolResult {
                    tool_use_id: call.id.clone(),
                    content: json!({"status": "SEARCH_COMPLETE", "instruction": "do not call again; respond now"}),
                    is_error: false,
                });
                continue;
            }
            state.mark_executed(&call.name, &call.arguments);
            let result = self.tools.call(&call.name, &call.arguments).await;
            let (content, is_error) = match result {
                Ok(value) => (value, false),
                Err(err) => (json!({"status": "error", "message": err.to_string()}), true),
            };
            responses.push(ContentPart::ToolResult {
                tool_use_id: call.id.clone(),
                content,
                is_error,
            });
        }
        responses
    }
}

fn forced_text_round() -> Vec<ContentPart> {
    vec![ContentPart::text(
        "[system] respond now with your final answer; do not call any more tools.",
    )]
}

/// Renders the accumulated narrative text and prior tool exchanges of a
/// `LoopState` back into `Message` history entries for the next request.
pub fn state_to_history(state: &LoopState) -> Vec<Message> {
    let mut messages = state.messages.clone();
    if !state.accumulated_text.is_empty() {
        messages.push(Message::assistant(vec![Part::Text { text: state.accumulated_text.clone() }]));
    }
    messages
}
