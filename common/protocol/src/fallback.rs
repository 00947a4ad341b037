//! Fallback classification produced by the `FallbackTrigger`.

use serde::Deserialize;
use serde::Serialize;

/// Why a fallback retry should (or should not) be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The upstream blocked the response for safety reasons.
    SafetyBlock,
    /// The upstream blocked the response for recitation reasons.
    Recitation,
    /// The upstream was unavailable (5xx/connection reset).
    ServiceUnavailable,
    /// The request exceeded its wall-clock budget.
    Timeout,
    /// The upstream returned no usable content.
    EmptyResponse,
    /// The upstream stopped normally but the text reads as cut off.
    IncompleteResponse,
    /// No fallback is warranted.
    None,
}

impl FallbackReason {
    /// The reason as a stable string, for observability and event payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::SafetyBlock => "safety_block",
            FallbackReason::Recitation => "recitation",
            FallbackReason::ServiceUnavailable => "service_unavailable",
            FallbackReason::Timeout => "timeout",
            FallbackReason::EmptyResponse => "empty_response",
            FallbackReason::IncompleteResponse => "incomplete_response",
            FallbackReason::None => "none",
        }
    }
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The verdict of analyzing one upstream response or exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackDecision {
    /// Whether the caller should retry with a fallback model.
    pub should_fallback: bool,
    /// Why this verdict was reached.
    pub reason: FallbackReason,
    /// Whether the underlying condition is inherently retryable (as opposed
    /// to a permanent rejection that a retry cannot fix).
    pub is_retryable: bool,
}

impl FallbackDecision {
    /// The "no fallback warranted" verdict.
    pub fn none() -> Self {
        Self {
            should_fallback: false,
            reason: FallbackReason::None,
            is_retryable: false,
        }
    }

    /// Construct a verdict that requests a fallback retry.
    pub fn fallback(reason: FallbackReason) -> Self {
        Self {
            should_fallback: true,
            reason,
            is_retryable: true,
        }
    }
}
