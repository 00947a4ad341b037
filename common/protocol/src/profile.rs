//! User profile record injected into the system prompt template.

use serde::Deserialize;
use serde::Serialize;

/// Small record of user attributes used to personalize the system prompt.
///
/// Ownership of the canonical record belongs to the (out-of-scope)
/// `ProfileStore`; the engine only ever holds a snapshot for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Display name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Physical/health attributes relevant to personalization (e.g. "height_cm").
    #[serde(default)]
    pub physical_stats: std::collections::BTreeMap<String, String>,
    /// Long-lived curated facts about the user.
    #[serde(default)]
    pub curated_facts: Vec<String>,
    /// Short-lived facts extracted from recent conversations.
    #[serde(default)]
    pub daily_facts: Vec<String>,
}

impl Profile {
    /// Render a compact bullet-list suitable for system-prompt substitution.
    pub fn render_facts(&self) -> String {
        self.curated_facts
            .iter()
            .chain(self.daily_facts.iter())
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_facts_combines_curated_and_daily() {
        let profile = Profile {
            name: Some("Nino".into()),
            physical_stats: Default::default(),
            curated_facts: vec!["vegetarian".into()],
            daily_facts: vec!["asked about protein yesterday".into()],
        };
        assert_eq!(
            profile.render_facts(),
            "- vegetarian\n- asked about protein yesterday"
        );
    }

    #[test]
    fn default_profile_has_no_facts() {
        let profile = Profile::default();
        assert!(profile.render_facts().is_empty());
    }
}
