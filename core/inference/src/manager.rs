//! Orchestrates the breaker, token counter, router, and fallback trigger
//! behind a single façade.

use crate::breaker::CircuitBreaker;
use crate::breaker::CircuitState;
use crate::fallback::FallbackTrigger;
use crate::router::ModelRouter;
use crate::tokens::TokenCounter;
use hic_protocol::FallbackDecision;
use hic_protocol::HybridInferenceConfig;
use hic_protocol::Message;
use hic_protocol::ModelDescriptor;
use hic_protocol::ModelRole;
use hic_protocol::RoutingDecision;
use hic_upstream::FinishReason;
use std::time::Duration;

/// Top-level façade over routing, circuit breaking, and fallback
/// classification.
///
/// Shared across concurrent requests as process-wide state (the breaker is
/// the only mutable part, and it is lock-protected internally). The manager
/// does not interpret failure semantics itself — that is the
/// `FallbackTrigger`'s job, exposed here as a pass-through so callers have
/// one façade for routing and classification.
#[derive(Debug)]
pub struct HybridInferenceManager {
    breaker: CircuitBreaker,
    router: ModelRouter,
    tokens: TokenCounter,
    trigger: FallbackTrigger,
}

impl HybridInferenceManager {
    /// Build a manager from a `HybridInferenceConfig`.
    pub fn new(config: &HybridInferenceConfig) -> Self {
        let primary = ModelDescriptor::new(config.primary_model.clone(), 0, ModelRole::Primary);
        let extended = ModelDescriptor::new(config.extended_model.clone(), 0, ModelRole::Extended);
        let fallback = ModelDescriptor::new(config.fallback_model.clone(), 0, ModelRole::Fallback);
        Self {
            breaker: CircuitBreaker::new(
                config.circuit_failure_threshold,
                Duration::from_secs(config.circuit_recovery_seconds),
            ),
            router: ModelRouter::new(primary, extended, fallback, config.extended_context_threshold),
            tokens: TokenCounter::default(),
            trigger: FallbackTrigger::new(config.safety_fallback_text_threshold),
        }
    }

    /// Estimate the combined token count of `message` plus `history`.
    ///
    /// Exposed alongside `route_request` (which computes the same figure
    /// internally) so callers can reuse it for the compaction gate without
    /// re-deriving it.
    pub fn estimate_tokens(&self, message: &str, history: &[Message]) -> i32 {
        self.tokens.count(message) + self.tokens.count_history(history)
    }

    /// Estimate the prompt's token count and route to a model.
    pub fn route_request(&self, message: &str, history: &[Message]) -> RoutingDecision {
        let token_count = self.estimate_tokens(message, history);
        self.router.select(token_count, &self.breaker)
    }

    /// Record a successful call against `model`.
    pub fn record_success(&self, model: &str) {
        self.breaker.record_success(model);
    }

    /// Record a failed call against `model`.
    pub fn record_failure(&self, model: &str) {
        self.breaker.record_failure(model);
    }

    /// The model that should be tried next after `model`, fixed hierarchy
    /// primary → extended → fallback → none.
    pub fn get_fallback_model(&self, current: &str) -> Option<String> {
        self.router.next_fallback(current)
    }

    /// Classify a terminal `(finish_reason, text)` pair.
    pub fn analyze_response(&self, finish_reason: FinishReason, text: &str) -> FallbackDecision {
        self.trigger.analyze_response(finish_reason, text)
    }

    /// Classify an exception by status code.
    pub fn analyze_exception(&self, status_code: hic_error::StatusCode) -> FallbackDecision {
        self.trigger.analyze_exception(status_code)
    }

    /// Current breaker status for a model, for observability.
    pub fn breaker_status(&self, model: &str) -> CircuitState {
        self.breaker.status(model)
    }
}
