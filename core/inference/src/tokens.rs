//! Token estimation used for routing decisions.
//!
//! Not billing-accurate: a `ceil(bytes/4)` heuristic with a Georgian-script
//! multiplier and a fixed safety factor, used only to decide which model can
//! hold a given context.

use hic_protocol::Message;
use std::collections::HashMap;

const SAFETY_MULTIPLIER: f64 = 1.1;
const GEORGIAN_SCRIPT_MULTIPLIER: f64 = 2.5;
const DEFAULT_SCRIPT_MULTIPLIER: f64 = 1.0;
/// Flat overhead charged per message in `count_history`, covering role/part
/// framing that isn't in the message text itself.
const PER_MESSAGE_OVERHEAD_TOKENS: i32 = 4;

fn is_georgian(c: char) -> bool {
    matches!(c as u32, 0x10A0..=0x10FF | 0x2D00..=0x2D2F)
}

fn script_multiplier(text: &str) -> f64 {
    if text.chars().any(is_georgian) {
        GEORGIAN_SCRIPT_MULTIPLIER
    } else {
        DEFAULT_SCRIPT_MULTIPLIER
    }
}

/// Estimates prompt tokens with a script-aware multiplier.
#[derive(Debug, Clone, Default)]
pub struct TokenCounter {
    model_limits: HashMap<String, i32>,
}

impl TokenCounter {
    /// Construct a counter with per-model limits configured up front
    /// (limits are configured, never probed at runtime).
    pub fn new(model_limits: HashMap<String, i32>) -> Self {
        Self { model_limits }
    }

    /// Estimate the token count of one text segment.
    pub fn count(&self, text: &str) -> i32 {
        if text.is_empty() {
            return 0;
        }
        let bytes = text.len() as f64;
        let estimate = (bytes / 4.0).ceil() * script_multiplier(text) * SAFETY_MULTIPLIER;
        estimate.ceil() as i32
    }

    /// Estimate the total token count of a conversation history, including
    /// a fixed per-message overhead.
    pub fn count_history(&self, messages: &[Message]) -> i32 {
        messages
            .iter()
            .map(|message| self.count(&message.text()) + PER_MESSAGE_OVERHEAD_TOKENS)
            .sum()
    }

    /// The configured token limit for `model`, or `0` if unconfigured.
    pub fn model_limit(&self, model: &str) -> i32 {
        self.model_limits.get(model).copied().unwrap_or(0)
    }
}
