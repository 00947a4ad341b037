//! Picks a model given context size and breaker health.

use crate::breaker::CircuitBreaker;
use hic_protocol::ModelDescriptor;
use hic_protocol::RoutingDecision;
use hic_protocol::RoutingReason;
use tracing::info;

/// Routes a request to one of the three configured models.
#[derive(Debug, Clone)]
pub struct ModelRouter {
    primary: ModelDescriptor,
    extended: ModelDescriptor,
    fallback: ModelDescriptor,
    extended_context_threshold: i32,
}

impl ModelRouter {
    /// Construct a router over the fixed three-model hierarchy.
    pub fn new(
        primary: ModelDescriptor,
        extended: ModelDescriptor,
        fallback: ModelDescriptor,
        extended_context_threshold: i32,
    ) -> Self {
        Self {
            primary,
            extended,
            fallback,
            extended_context_threshold,
        }
    }

    /// The model that would follow `model` in the fixed fallback hierarchy,
    /// `None` past the last resort.
    pub fn next_fallback(&self, model: &str) -> Option<String> {
        if model == self.primary.id {
            Some(self.extended.id.clone())
        } else if model == self.extended.id {
            Some(self.fallback.id.clone())
        } else {
            None
        }
    }

    /// Select a model for a request of the given estimated token count,
    /// consulting `breaker` for health.
    pub fn select(&self, token_count: i32, breaker: &CircuitBreaker) -> RoutingDecision {
        let decision = if token_count >= self.extended_context_threshold {
            RoutingDecision {
                model: self.extended.id.clone(),
                reason: RoutingReason::OversizeContext,
                can_retry: true,
                next_fallback: self.next_fallback(&self.extended.id),
            }
        } else if breaker.is_allowed(&self.primary.id) {
            RoutingDecision {
                model: self.primary.id.clone(),
                reason: RoutingReason::PrimaryHealthy,
                can_retry: true,
                next_fallback: self.next_fallback(&self.primary.id),
            }
        } else if breaker.is_allowed(&self.extended.id) {
            RoutingDecision {
                model: self.extended.id.clone(),
                reason: RoutingReason::PrimaryOpen,
                can_retry: true,
                next_fallback: self.next_fallback(&self.extended.id),
            }
        } else {
            RoutingDecision {
                model: self.fallback.id.clone(),
                reason: RoutingReason::PrimaryOpen,
                can_retry: false,
                next_fallback: None,
            }
        };
        info!(
            model = %decision.model,
            reason = %decision.reason,
            "routed request"
        );
        decision
    }
}
