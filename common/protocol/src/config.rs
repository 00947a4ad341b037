//! Tunables for the hybrid inference core.

use serde::Deserialize;
use serde::Serialize;

fn default_max_function_calls() -> u32 {
    5
}

fn default_circuit_failure_threshold() -> u32 {
    5
}

fn default_circuit_recovery_seconds() -> u64 {
    60
}

fn default_extended_context_threshold() -> i32 {
    150_000
}

fn default_safety_fallback_text_threshold() -> usize {
    800
}

fn default_history_keep() -> usize {
    30
}

fn default_compaction_ratio() -> f64 {
    0.75
}

fn default_round_timeout_seconds() -> u64 {
    30
}

/// Configuration for one `HybridInferenceManager` instance.
///
/// Deserializable from the deployment's config file with every field
/// optional; missing fields fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridInferenceConfig {
    /// Primary model id, tried first whenever the primary breaker is closed
    /// and the context fits its window.
    pub primary_model: String,
    /// Large-context model id, used for oversize prompts and as the first
    /// fallback after the primary.
    pub extended_model: String,
    /// Last-resort model id.
    pub fallback_model: String,
    /// Maximum number of function-calling rounds per request before the
    /// loop forces a text-only terminal round.
    #[serde(default = "default_max_function_calls")]
    pub max_function_calls: u32,
    /// Consecutive-failure count that trips a model's circuit breaker open.
    #[serde(default = "default_circuit_failure_threshold")]
    pub circuit_failure_threshold: u32,
    /// Seconds an open breaker stays open before allowing one half-open probe.
    #[serde(default = "default_circuit_recovery_seconds")]
    pub circuit_recovery_seconds: u64,
    /// Token count above which routing prefers the extended model over the
    /// primary regardless of breaker state.
    #[serde(default = "default_extended_context_threshold")]
    pub extended_context_threshold: i32,
    /// Response byte length below which an upstream safety block triggers a
    /// fallback retry (short blocks are assumed to be refusals, not content).
    #[serde(default = "default_safety_fallback_text_threshold")]
    pub safety_fallback_text_threshold: usize,
    /// Number of most recent turns retained verbatim before compaction.
    #[serde(default = "default_history_keep")]
    pub history_keep: usize,
    /// Fraction of `history_keep` retained after compaction collapses the
    /// older portion of the window.
    #[serde(default = "default_compaction_ratio")]
    pub compaction_ratio: f64,
    /// Wall-clock budget for a single round's upstream stream before it is
    /// abandoned as timed out.
    #[serde(default = "default_round_timeout_seconds")]
    pub round_timeout_seconds: u64,
}

impl HybridInferenceConfig {
    /// Construct a config for the three required model ids, with every
    /// other field at its default.
    pub fn new(
        primary_model: impl Into<String>,
        extended_model: impl Into<String>,
        fallback_model: impl Into<String>,
    ) -> Self {
        Self {
            primary_model: primary_model.into(),
            extended_model: extended_model.into(),
            fallback_model: fallback_model.into(),
            max_function_calls: default_max_function_calls(),
            circuit_failure_threshold: default_circuit_failure_threshold(),
            circuit_recovery_seconds: default_circuit_recovery_seconds(),
            extended_context_threshold: default_extended_context_threshold(),
            safety_fallback_text_threshold: default_safety_fallback_text_threshold(),
            history_keep: default_history_keep(),
            compaction_ratio: default_compaction_ratio(),
            round_timeout_seconds: default_round_timeout_seconds(),
        }
    }
}
