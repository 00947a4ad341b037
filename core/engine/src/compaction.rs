//! Synchronous on-the-hot-path compaction gate.

use hic_protocol::Message;
use hic_protocol::Part;

/// Whether the estimated token count warrants compacting before this
/// request proceeds.
pub fn should_compact(token_count: i32, model_limit: i32, compaction_ratio: f64) -> bool {
    let gate = f64::from(model_limit) * compaction_ratio;
    f64::from(token_count) >= gate
}

/// Replace the older portion of `history` with a single synthetic summary
/// message, keeping the most recent `keep_recent` messages verbatim.
///
/// Callers are responsible for extracting facts from the dropped messages
/// (via `MemoryHooks::pre_flush`) before calling this, since the dropped
/// text itself is discarded here.
pub fn compact_history(history: &[Message], keep_recent: usize, summary_text: String) -> Vec<Message> {
    if history.len() <= keep_recent {
        return history.to_vec();
    }
    let split_at = history.len() - keep_recent;
    let recent = history[split_at..].to_vec();
    let summary = Message::assistant(vec![Part::Text { text: summary_text }]);
    let mut compacted = Vec::with_capacity(1 + recent.len());
    compacted.push(summary);
    compacted.extend(recent);
    compacted
}

/// The messages a compaction pass is about to drop, for `MemoryHooks::pre_flush`.
pub fn dropped_messages(history: &[Message], keep_recent: usize) -> &[Message] {
    if history.len() <= keep_recent {
        return &[];
    }
    &history[..history.len() - keep_recent]
}

#[cfg(test)]
mod tests {
    use super::*;
    use hic_protocol::Role;

    fn history(n: usize) -> Vec<Message> {
        (0..n).map(|i| Message::user_text(format!("message {i}"))).collect()
    }

    #[test]
    fn gate_triggers_at_or_above_ratio() {
        assert!(should_compact(750, 1000, 0.75));
        assert!(!should_compact(749, 1000, 0.75));
    }

    #[test]
    fn compaction_keeps_only_recent_messages_verbatim() {
        let compacted = compact_history(&history(10), 3, "summary".into());
        assert_eq!(compacted.len(), 4);
        assert_eq!(compacted[0].role, Role::Assistant);
        assert_eq!(compacted[0].text(), "summary");
        assert_eq!(compacted[1].text(), "message 7");
        assert_eq!(compacted[3].text(), "message 9");
    }

    #[test]
    fn short_history_is_untouched() {
        let compacted = compact_history(&history(2), 3, "summary".into());
        assert_eq!(compacted.len(), 2);
    }

    #[test]
    fn dropped_messages_are_exactly_the_older_portion() {
        let h = history(10);
        let dropped = dropped_messages(&h, 3);
        assert_eq!(dropped.len(), 7);
        assert_eq!(dropped[0].text(), "message 0");
    }
}
