//! Classifies upstream responses and exceptions into fallback decisions.

use hic_protocol::FallbackDecision;
use hic_protocol::FallbackReason;
use hic_upstream::FinishReason;

/// Suffix patterns (case-insensitive, after trimming trailing whitespace)
/// that mark a `STOP`-terminated response as an interrupted sentence rather
/// than a complete one.
///
/// Empirically tuned; the open question of whether to extend this set is
/// left to the operator, not guessed at here (see DESIGN.md).
const INCOMPLETE_SUFFIXES: &[&str] = &[":", "და", "მაგრამ", "შემდეგი:", "ვარიანტები:"];

/// Suffix characters that mark a response as a complete sentence even if it
/// would otherwise look truncated.
const COMPLETE_SUFFIXES: &[char] = &['.', '!', '?', ')', '₾'];

/// A response shorter than this is never flagged incomplete; short replies
/// are legitimate.
const MIN_LENGTH_FOR_INCOMPLETE_CHECK: usize = 50;

/// Classifies terminal responses and exceptions, deciding whether a
/// fallback retry is warranted.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackTrigger {
    /// Byte length below which a SAFETY block is treated as a refusal
    /// rather than a legitimate truncation.
    pub safety_fallback_text_threshold: usize,
}

impl FallbackTrigger {
    /// Construct a trigger with the configured safety-block threshold.
    pub fn new(safety_fallback_text_threshold: usize) -> Self {
        Self {
            safety_fallback_text_threshold,
        }
    }

    /// Classify a terminal `(finish_reason, accumulated_text)` pair.
    pub fn analyze_response(&self, finish_reason: FinishReason, text: &str) -> FallbackDecision {
        let stripped = text.trim();
        if matches!(finish_reason, FinishReason::Safety) {
            if stripped.len() < self.safety_fallback_text_threshold {
                return FallbackDecision::fallback(FallbackReason::SafetyBlock);
            }
            return FallbackDecision::none();
        }
        if matches!(finish_reason, FinishReason::Recitation) {
            return FallbackDecision::fallback(FallbackReason::Recitation);
        }
        if stripped.is_empty() {
            return FallbackDecision::fallback(FallbackReason::EmptyResponse);
        }
        if matches!(finish_reason, FinishReason::Stop) {
            return self.analyze_text_completeness(text);
        }
        FallbackDecision::none()
    }

    /// Classify an upstream-raised exception via its status code.
    pub fn analyze_exception(&self, status_code: hic_error::StatusCode) -> FallbackDecision {
        match status_code {
            hic_error::StatusCode::ServiceUnavailable
            | hic_error::StatusCode::ConnectionFailed
            | hic_error::StatusCode::Timeout
            | hic_error::StatusCode::DeadlineExceeded => {
                FallbackDecision::fallback(FallbackReason::ServiceUnavailable)
            }
            _ => FallbackDecision::none(),
        }
    }

    /// Decide whether `STOP`-terminated text reads as an interrupted
    /// sentence.
    pub fn analyze_text_completeness(&self, text: &str) -> FallbackDecision {
        let stripped = text.trim_end();
        if stripped.chars().count() < MIN_LENGTH_FOR_INCOMPLETE_CHECK {
            return FallbackDecision::none();
        }
        if stripped.ends_with(COMPLETE_SUFFIXES) {
            return FallbackDecision::none();
        }
        let lowered = stripped.to_lowercase();
        if INCOMPLETE_SUFFIXES.iter().any(|pattern| lowered.ends_with(pattern)) {
            return FallbackDecision::fallback(FallbackReason::IncompleteResponse);
        }
        FallbackDecision::none()
    }
}
