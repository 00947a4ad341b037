//! Routing decisions produced by the model router.

use serde::Deserialize;
use serde::Serialize;

/// Why the router picked the model it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingReason {
    /// Primary model is healthy and context fits within it.
    PrimaryHealthy,
    /// Primary model's breaker is open.
    PrimaryOpen,
    /// Context size exceeds the primary model's practical window.
    OversizeContext,
    /// An explicit fallback was forced (e.g. mid-request retry).
    ForcedFallback,
}

impl RoutingReason {
    /// The reason as a stable string, for observability.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingReason::PrimaryHealthy => "primary_healthy",
            RoutingReason::PrimaryOpen => "primary_open",
            RoutingReason::OversizeContext => "oversize_context",
            RoutingReason::ForcedFallback => "forced_fallback",
        }
    }
}

impl std::fmt::Display for RoutingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The outcome of a single routing decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// The model id selected for this attempt.
    pub model: String,
    /// Why this model was selected.
    pub reason: RoutingReason,
    /// Whether a fallback retry remains available after this attempt.
    pub can_retry: bool,
    /// The model id that would be tried next, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_fallback: Option<String>,
}
