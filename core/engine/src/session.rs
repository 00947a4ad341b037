//! Canonical session identifier minting and validation.

use once_cell::sync::Lazy;
use regex::Regex;

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant, failure is a test-caught bug")]
static SESSION_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^session_[0-9a-f]{16}$").expect("valid regex"));

/// Mint a fresh session id in the engine's canonical form, `session_<hex16>`.
pub fn mint_session_id() -> String {
    let bytes: [u8; 8] = rand::random();
    let hex = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();
    format!("session_{hex}")
}

/// Whether `candidate` is a well-formed canonical session id.
pub fn is_valid_session_id(candidate: &str) -> bool {
    SESSION_ID_PATTERN.is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_match_the_canonical_pattern() {
        for _ in 0..20 {
            let id = mint_session_id();
            assert!(is_valid_session_id(&id), "{id} did not match canonical pattern");
        }
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(!is_valid_session_id("session_short"));
        assert!(!is_valid_session_id("not_a_session_id"));
        assert!(!is_valid_session_id("session_DEADBEEFDEADBEEF"));
    }
}
