//! Top-level request orchestrator.

use crate::compaction;
use crate::error::Result;
use crate::error::engine_error;
use crate::prompt::render_system_prompt;
use crate::search::PreSearchClassifier;
use crate::session;
use crate::traits::HistoryStore;
use crate::traits::MemoryHooks;
use crate::traits::ProfileStore;
use hic_error::ErrorExt;
use hic_inference::HybridInferenceManager;
use hic_loop::FunctionCallingLoop;
use hic_loop::ThoughtTranslator;
use hic_protocol::FallbackReason;
use hic_protocol::HybridInferenceConfig;
use hic_protocol::InferenceEvent;
use hic_protocol::Message;
use hic_protocol::UserMessage;
use hic_tools::ToolRegistry;
use hic_upstream::ChatSessionFactory;
use hic_upstream::ContentPart;
use hic_upstream::FinishReason;
use snafu::IntoError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::warn;

/// Everything `ConversationEngine` needs beyond the hybrid inference
/// manager: its external collaborators, referenced only by trait.
pub struct ConversationEngineDeps {
    /// Persistent conversation history.
    pub history: Arc<dyn HistoryStore>,
    /// Persistent user profile record.
    pub profile: Arc<dyn ProfileStore>,
    /// Fact extraction hook, invoked before compaction discards messages.
    pub memory: Arc<dyn MemoryHooks>,
    /// Thought localization for the `thinking` event.
    pub thoughts: Arc<dyn ThoughtTranslator>,
    /// Opens a streaming chat session against a chosen model.
    pub sessions: Arc<dyn ChatSessionFactory>,
    /// Product catalog / tool dispatch.
    pub tools: Arc<dyn ToolRegistry>,
}

/// Drives one request end-to-end: load context, optionally pre-search,
/// route to a model, run the function-calling loop, and apply the
/// single-retry fallback policy.
pub struct ConversationEngine {
    manager: HybridInferenceManager,
    deps: ConversationEngineDeps,
    pre_search: PreSearchClassifier,
    system_prompt_template: String,
    config: HybridInferenceConfig,
}

impl ConversationEngine {
    /// Construct an engine bound to the given config and collaborators.
    pub fn new(
        config: HybridInferenceConfig,
        deps: ConversationEngineDeps,
        pre_search: PreSearchClassifier,
        system_prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            manager: HybridInferenceManager::new(&config),
            deps,
            pre_search,
            system_prompt_template: system_prompt_template.into(),
            config,
        }
    }

    /// Run one request to completion, forwarding every SSE-shaped event to
    /// `events` and finishing with exactly one `done` (success) or `error`
    /// + `done` (failure) pair.
    pub async fn stream_message(
        &self,
        message: UserMessage,
        events: mpsc::Sender<InferenceEvent>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let user_id = message.user_id.clone().unwrap_or_default();

        // 1. Load context.
        let session_id = match self
            .deps
            .history
            .resolve_session(&user_id, message.session_hint.as_deref())
            .await?
        {
            Some(existing) => existing,
            None => session::mint_session_id(),
        };
        let mut history = self
            .deps
            .history
            .fetch_recent(&session_id, self.config.history_keep)
            .await?;
        let profile = self.deps.profile.fetch(&user_id).await?;

        // 2. Pre-search.
        let mut outbound_text = message.text.clone();
        if self.pre_search.should_search(&message.text, history.len())
            && let Ok(result) = self.deps.tools.call("search_products", &serde_json::json!({"query": message.text})).await
            && let Some(items) = result.get("items").and_then(|v| v.as_array())
        {
            let catalog_items: Vec<crate::search::CatalogItem> = items
                .iter()
                .filter_map(|item| {
                    Some(crate::search::CatalogItem {
                        name: item.get("name")?.as_str()?.to_string(),
                        detail: item.get("detail").and_then(|d| d.as_str()).unwrap_or("").to_string(),
                    })
                })
                .collect();
            if !catalog_items.is_empty() {
                let block = self.pre_search.render_context_block(&catalog_items);
                outbound_text = format!("{}\n\n{block}", message.text);
            }
        }

        // 3. Route.
        let mut decision = self.manager.route_request(&outbound_text, &history);
        info!(model = %decision.model, reason = %decision.reason, "routed request");

        // 4. Compaction gate.
        let token_count = self.manager.estimate_tokens(&outbound_text, &history);
        if compaction::should_compact(token_count, self.config.extended_context_threshold, self.config.compaction_ratio) {
            let keep_recent = (self.config.history_keep as f64 * self.config.compaction_ratio) as usize;
            let dropped = compaction::dropped_messages(&history, keep_recent);
            if !dropped.is_empty() {
                let _ = self.deps.memory.pre_flush(&user_id, dropped).await;
            }
            history = compaction::compact_history(&history, keep_recent, "Earlier conversation summarized.".into());
        }

        let system_prompt = render_system_prompt(&self.system_prompt_template, &profile);
        let mut model_used = decision.model.clone();

        let outcome = self
            .run_once(&decision.model, &system_prompt, &history, &outbound_text, events.clone(), cancel.clone())
            .await;

        let mut fallback_attempted = false;
        let final_state: std::result::Result<hic_loop::LoopState, hic_loop::LoopError> = match outcome {
            Ok((state, finish_reason)) => {
                let reason = self.needs_fallback(finish_reason, &state.accumulated_text);
                if let Some(reason) = reason
                    && decision.next_fallback.is_some()
                {
                    fallback_attempted = true;
                    self.manager.record_failure(&decision.model);
                    warn!(model = %decision.model, reason = %reason, "finish reason warrants fallback, retrying once");
                    let _ = events
                        .send(InferenceEvent::Retry { reason: reason.to_string() })
                        .await;
                    #[expect(clippy::unwrap_used, reason = "next_fallback.is_some() checked above")]
                    let fallback_model = decision.next_fallback.clone().unwrap();
                    decision.model = fallback_model.clone();
                    model_used = fallback_model.clone();
                    self.run_once(&fallback_model, &system_prompt, &history, &outbound_text, events.clone(), cancel.clone())
                        .await
                        .map(|(state, _)| state)
                } else {
                    self.manager.record_success(&decision.model);
                    Ok(state)
                }
            }
            Err(err) => {
                if let Some(fallback_model) = self.manager.get_fallback_model(&decision.model) {
                    fallback_attempted = true;
                    self.manager.record_failure(&decision.model);
                    let reason = self.manager.analyze_exception(err.status_code()).reason;
                    warn!(model = %decision.model, %reason, "loop failed, retrying once with fallback");
                    let _ = events
                        .send(InferenceEvent::Retry { reason: reason.to_string() })
                        .await;
                    model_used = fallback_model.clone();
                    self.run_once(&fallback_model, &system_prompt, &history, &outbound_text, events.clone(), cancel.clone())
                        .await
                        .map(|(state, _)| state)
                } else {
                    Err(err)
                }
            }
        };

        match final_state {
            Ok(state) => {
                let mut to_persist = history;
                to_persist.push(Message::user_text(outbound_text));
                if !state.accumulated_text.is_empty() {
                    to_persist.push(Message::assistant(vec![hic_protocol::Part::Text {
                        text: state.accumulated_text,
                    }]));
                }
                let _ = self.deps.history.append(&session_id, &to_persist).await;
                let _ = events
                    .send(InferenceEvent::Done {
                        session_id,
                        model_used,
                    })
                    .await;
                Ok(())
            }
            Err(err) => {
                let code = match &err {
                    hic_loop::LoopError::EmptyResponse { .. } => "empty_response",
                    hic_loop::LoopError::Timeout { .. } => "upstream",
                    hic_loop::LoopError::Upstream { .. } => "upstream",
                };
                let _ = events
                    .send(InferenceEvent::Error {
                        code: code.into(),
                        message: err.to_string(),
                    })
                    .await;
                let _ = events
                    .send(InferenceEvent::Done {
                        session_id,
                        model_used,
                    })
                    .await;
                if fallback_attempted {
                    Err(engine_error::ExhaustedFallbackSnafu.into_error(err))
                } else {
                    Err(engine_error::LoopSnafu.into_error(err))
                }
            }
        }
    }

    async fn run_once(
        &self,
        model: &str,
        system_prompt: &str,
        history: &[Message],
        outbound_text: &str,
        events: mpsc::Sender<InferenceEvent>,
        cancel: CancellationToken,
    ) -> std::result::Result<(hic_loop::LoopState, Option<FinishReason>), hic_loop::LoopError> {
        let session = self
            .deps
            .sessions
            .create(model, system_prompt, history)
            .await
            .map_err(|source| hic_loop::LoopError::Upstream { source, location: snafu::Location::new(file!(), line!(), column!()) })?;

        let mut function_loop = FunctionCallingLoop::new(
            session,
            Arc::clone(&self.deps.tools),
            events,
            Arc::clone(&self.deps.thoughts),
            cancel,
        )
        .with_round_timeout(Duration::from_secs(self.config.round_timeout_seconds));
        let state = function_loop.execute_streaming(vec![ContentPart::text(outbound_text)]).await?;
        let finish_reason = state.last_finish_reason;
        Ok((state, finish_reason))
    }

    /// The fallback reason warranted by a terminal `finish_reason`, if any.
    fn needs_fallback(&self, finish_reason: Option<FinishReason>, accumulated_text: &str) -> Option<FallbackReason> {
        let finish_reason = finish_reason?;
        if !matches!(finish_reason, FinishReason::Safety | FinishReason::Stop) {
            return None;
        }
        let decision = self.manager.analyze_response(finish_reason, accumulated_text);
        decision.should_fallback.then_some(decision.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hic_protocol::Profile;
    use hic_upstream::ChatSession;
    use hic_upstream::ChunkStream;
    use hic_upstream::StreamChunk;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct InMemoryHistory {
        sessions: Mutex<std::collections::HashMap<String, Vec<Message>>>,
    }

    #[async_trait]
    impl HistoryStore for InMemoryHistory {
        async fn resolve_session(&self, _user_id: &str, session_hint: Option<&str>) -> Result<Option<String>> {
            #[expect(clippy::unwrap_used, reason = "test fixture, poisoned lock is a test bug")]
            let sessions = self.sessions.lock().unwrap();
            Ok(session_hint
                .filter(|hint| sessions.contains_key(*hint))
                .map(str::to_string))
        }

        async fn fetch_recent(&self, session_id: &str, limit: usize) -> Result<Vec<Message>> {
            #[expect(clippy::unwrap_used, reason = "test fixture, poisoned lock is a test bug")]
            let sessions = self.sessions.lock().unwrap();
            let history = sessions.get(session_id).cloned().unwrap_or_default();
            let start = history.len().saturating_sub(limit);
            Ok(history[start..].to_vec())
        }

        async fn append(&self, session_id: &str, messages: &[Message]) -> Result<()> {
            #[expect(clippy::unwrap_used, reason = "test fixture, poisoned lock is a test bug")]
            let mut sessions = self.sessions.lock().unwrap();
            sessions.entry(session_id.to_string()).or_default().extend(messages.to_vec());
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct StubProfileStore;

    #[async_trait]
    impl ProfileStore for StubProfileStore {
        async fn fetch(&self, _user_id: &str) -> Result<Profile> {
            Ok(Profile::default())
        }
    }

    #[derive(Debug, Default)]
    struct NoopMemoryHooks;

    #[async_trait]
    impl MemoryHooks for NoopMemoryHooks {
        async fn pre_flush(&self, _user_id: &str, _dropped: &[Message]) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct PassthroughTranslator;

    #[async_trait]
    impl ThoughtTranslator for PassthroughTranslator {
        async fn translate(&self, thought: &str) -> hic_loop::error::Result<String> {
            Ok(thought.to_string())
        }
    }

    #[derive(Debug, Default)]
    struct EmptyRegistry;

    #[async_trait]
    impl ToolRegistry for EmptyRegistry {
        async fn call(&self, _name: &str, _args: &serde_json::Value) -> hic_tools::error::Result<serde_json::Value> {
            Ok(serde_json::json!({}))
        }
    }

    /// Scripts a fixed sequence of finish reasons/texts, one per model that
    /// calls it, keyed by call order (first call = primary, etc.).
    #[derive(Debug)]
    struct ScriptedSession {
        model: String,
        chunks: Vec<StreamChunk>,
    }

    #[async_trait]
    impl ChatSession for ScriptedSession {
        fn model(&self) -> &str {
            &self.model
        }

        async fn send(&mut self, _parts: Vec<ContentPart>) -> hic_upstream::error::Result<ChunkStream> {
            Ok(Box::pin(futures::stream::iter(self.chunks.clone().into_iter().map(Ok))))
        }
    }

    #[derive(Debug)]
    struct ScriptedFactory {
        rounds: Mutex<std::collections::VecDeque<Vec<StreamChunk>>>,
    }

    #[async_trait]
    impl ChatSessionFactory for ScriptedFactory {
        async fn create(
            &self,
            model: &str,
            _system_prompt: &str,
            _history: &[Message],
        ) -> hic_upstream::error::Result<Box<dyn ChatSession>> {
            #[expect(clippy::unwrap_used, reason = "test fixture, poisoned lock is a test bug")]
            let chunks = self.rounds.lock().unwrap().pop_front().unwrap_or_default();
            Ok(Box::new(ScriptedSession {
                model: model.to_string(),
                chunks,
            }))
        }
    }

    fn deps(factory: ScriptedFactory) -> ConversationEngineDeps {
        ConversationEngineDeps {
            history: Arc::new(InMemoryHistory::default()),
            profile: Arc::new(StubProfileStore),
            memory: Arc::new(NoopMemoryHooks),
            thoughts: Arc::new(PassthroughTranslator),
            sessions: Arc::new(factory),
            tools: Arc::new(EmptyRegistry),
        }
    }

    fn config() -> HybridInferenceConfig {
        HybridInferenceConfig::new("primary-v1", "extended-v1", "fallback-v1")
    }

    async fn collect_events(mut rx: mpsc::Receiver<InferenceEvent>) -> Vec<InferenceEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "test assertion")]
    async fn s1_healthy_primary_greets_and_completes() {
        let factory = ScriptedFactory {
            rounds: Mutex::new(
                vec![vec![StreamChunk {
                    content: vec![ContentPart::text("Hello! How can I help?")],
                    finish_reason: Some(FinishReason::Stop),
                }]]
                .into(),
            ),
        };
        let engine = ConversationEngine::new(
            config(),
            deps(factory),
            PreSearchClassifier::new(vec![], vec![]),
            "You are a helpful assistant.".to_string(),
        );
        let (tx, rx) = mpsc::channel(32);
        engine
            .stream_message(UserMessage::new("hi"), tx, CancellationToken::new())
            .await
            .expect("request succeeds");

        let events = collect_events(rx).await;
        let texts: String = events
            .iter()
            .filter_map(|e| match e {
                InferenceEvent::Text { content } => Some(content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, "Hello! How can I help?");
        match events.last() {
            Some(InferenceEvent::Done { session_id, model_used }) => {
                assert!(session::is_valid_session_id(session_id));
                assert_eq!(model_used, "primary-v1");
            }
            other => panic!("expected a terminal done event, got {other:?}"),
        }
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "test assertion")]
    async fn s2_short_safety_block_falls_back_to_extended() {
        let factory = ScriptedFactory {
            rounds: Mutex::new(
                vec![
                    vec![StreamChunk {
                        content: vec![ContentPart::text("a".repeat(79))],
                        finish_reason: Some(FinishReason::Safety),
                    }],
                    vec![StreamChunk {
                        content: vec![ContentPart::text("b".repeat(900))],
                        finish_reason: Some(FinishReason::Stop),
                    }],
                ]
                .into(),
            ),
        };
        let engine = ConversationEngine::new(
            config(),
            deps(factory),
            PreSearchClassifier::new(vec![], vec![]),
            "You are a helpful assistant.".to_string(),
        );
        let (tx, rx) = mpsc::channel(32);
        engine
            .stream_message(UserMessage::new("tell me about nutrition"), tx, CancellationToken::new())
            .await
            .expect("request succeeds after fallback");

        let events = collect_events(rx).await;
        assert!(events.iter().any(|e| matches!(e, InferenceEvent::Retry { reason } if reason == "safety_block")));
        match events.last() {
            Some(InferenceEvent::Done { model_used, .. }) => assert_eq!(model_used, "extended-v1"),
            other => panic!("expected a terminal done event, got {other:?}"),
        }
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "test assertion")]
    async fn s4_open_circuit_routes_new_requests_straight_to_extended() {
        let mut cfg = config();
        cfg.circuit_failure_threshold = 1;
        let factory = ScriptedFactory {
            rounds: Mutex::new(
                vec![
                    vec![StreamChunk {
                        content: vec![],
                        finish_reason: Some(FinishReason::Stop),
                    }],
                    vec![StreamChunk {
                        content: vec![ContentPart::text("Recovered via extended.")],
                        finish_reason: Some(FinishReason::Stop),
                    }],
                    vec![StreamChunk {
                        content: vec![ContentPart::text("Still on extended.")],
                        finish_reason: Some(FinishReason::Stop),
                    }],
                ]
                .into(),
            ),
        };
        let engine = ConversationEngine::new(
            cfg,
            deps(factory),
            PreSearchClassifier::new(vec![], vec![]),
            "You are a helpful assistant.".to_string(),
        );

        let (tx, rx) = mpsc::channel(32);
        engine
            .stream_message(UserMessage::new("first request"), tx, CancellationToken::new())
            .await
            .expect("first request recovers via fallback");
        match collect_events(rx).await.last() {
            Some(InferenceEvent::Done { model_used, .. }) => assert_eq!(model_used, "extended-v1"),
            other => panic!("expected a terminal done event, got {other:?}"),
        }

        let (tx, rx) = mpsc::channel(32);
        engine
            .stream_message(UserMessage::new("second request"), tx, CancellationToken::new())
            .await
            .expect("second request succeeds directly on extended");
        match collect_events(rx).await.last() {
            Some(InferenceEvent::Done { model_used, .. }) => assert_eq!(
                model_used, "extended-v1",
                "primary's open breaker should route the next request straight to extended"
            ),
            other => panic!("expected a terminal done event, got {other:?}"),
        }
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "test assertion")]
    async fn s6_session_hint_rebinds_to_the_stored_session() {
        let history = Arc::new(InMemoryHistory::default());
        history
            .append("session_existing123", &[Message::assistant(vec![hic_protocol::Part::Text {
                text: "previous chat".into(),
            }])])
            .await
            .expect("seed history");
        let factory = ScriptedFactory {
            rounds: Mutex::new(
                vec![vec![StreamChunk {
                    content: vec![ContentPart::text("Welcome back.")],
                    finish_reason: Some(FinishReason::Stop),
                }]]
                .into(),
            ),
        };
        let engine = ConversationEngine::new(
            config(),
            ConversationEngineDeps {
                history,
                profile: Arc::new(StubProfileStore),
                memory: Arc::new(NoopMemoryHooks),
                thoughts: Arc::new(PassthroughTranslator),
                sessions: Arc::new(factory),
                tools: Arc::new(EmptyRegistry),
            },
            PreSearchClassifier::new(vec![], vec![]),
            "You are a helpful assistant.".to_string(),
        );

        let (tx, rx) = mpsc::channel(32);
        engine
            .stream_message(
                UserMessage {
                    text: "hi again".into(),
                    user_id: Some("user1".into()),
                    session_hint: Some("session_existing123".into()),
                },
                tx,
                CancellationToken::new(),
            )
            .await
            .expect("request succeeds");

        match collect_events(rx).await.last() {
            Some(InferenceEvent::Done { session_id, .. }) => {
                assert_eq!(session_id, "session_existing123", "matching hint should rebind rather than mint a new session");
            }
            other => panic!("expected a terminal done event, got {other:?}"),
        }
    }

    #[tokio::test]
    #[expect(clippy::expect_used, reason = "test assertion")]
    async fn s3_long_safety_block_passes_through_without_retry() {
        let factory = ScriptedFactory {
            rounds: Mutex::new(
                vec![vec![StreamChunk {
                    content: vec![ContentPart::text("c".repeat(1400))],
                    finish_reason: Some(FinishReason::Safety),
                }]]
                .into(),
            ),
        };
        let engine = ConversationEngine::new(
            config(),
            deps(factory),
            PreSearchClassifier::new(vec![], vec![]),
            "You are a helpful assistant.".to_string(),
        );
        let (tx, rx) = mpsc::channel(32);
        engine
            .stream_message(UserMessage::new("tell me about nutrition"), tx, CancellationToken::new())
            .await
            .expect("request succeeds without retry");

        let events = collect_events(rx).await;
        assert!(!events.iter().any(|e| matches!(e, InferenceEvent::Retry { .. })));
        match events.last() {
            Some(InferenceEvent::Done { model_used, .. }) => assert_eq!(model_used, "primary-v1"),
            other => panic!("expected a terminal done event, got {other:?}"),
        }
    }
}
