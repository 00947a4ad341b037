//! Pre-search classifier: runs a catalog search before the model is
//! invoked at all, on the narrow first-touch case where it reliably saves
//! one function-calling round.

/// Maximum number of catalog lines inlined into the context block.
const MAX_CONTEXT_ITEMS: usize = 5;
/// Maximum rendered length of a single context line.
const MAX_LINE_CHARS: usize = 120;
/// History length at or below which a pre-search is still worth the cost.
const MAX_HISTORY_FOR_PRESEARCH: usize = 4;

/// One catalog result line available for inlining into the context block.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    /// Item name.
    pub name: String,
    /// Free-form detail (price, unit, etc.), already formatted.
    pub detail: String,
}

/// Decides whether a message is a good candidate for an eager catalog
/// search before the model is ever invoked.
#[derive(Debug, Clone)]
pub struct PreSearchClassifier {
    domain_keywords: Vec<String>,
    negative_markers: Vec<String>,
}

impl PreSearchClassifier {
    /// Construct a classifier over the given lowercase keyword lists.
    pub fn new(domain_keywords: Vec<String>, negative_markers: Vec<String>) -> Self {
        Self {
            domain_keywords,
            negative_markers,
        }
    }

    /// Whether `text` warrants an eager pre-search given `history_len`.
    pub fn should_search(&self, text: &str, history_len: usize) -> bool {
        if history_len > MAX_HISTORY_FOR_PRESEARCH {
            return false;
        }
        let lowered = text.to_lowercase();
        let has_domain_keyword = self.domain_keywords.iter().any(|k| lowered.contains(k.as_str()));
        let has_negative_marker = self.negative_markers.iter().any(|m| lowered.contains(m.as_str()));
        has_domain_keyword && !has_negative_marker
    }

    /// Render up to [`MAX_CONTEXT_ITEMS`] results into a bounded "catalog
    /// context" block suitable for inlining into the outbound message.
    pub fn render_context_block(&self, items: &[CatalogItem]) -> String {
        let lines: Vec<String> = items
            .iter()
            .take(MAX_CONTEXT_ITEMS)
            .map(|item| {
                let line = format!("- {} ({})", item.name, item.detail);
                if line.chars().count() > MAX_LINE_CHARS {
                    line.chars().take(MAX_LINE_CHARS).collect()
                } else {
                    line
                }
            })
            .collect();
        format!("[catalog context]\n{}", lines.join("\n"))
    }
}
