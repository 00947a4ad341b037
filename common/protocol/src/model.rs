//! Model descriptors.

use serde::Deserialize;
use serde::Serialize;

/// The role a configured model plays in the fallback hierarchy.
///
/// Exactly three descriptors exist system-wide; no more, no fewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    /// Default model for ordinary context sizes.
    Primary,
    /// Large-context model, used for oversize prompts or as first fallback.
    Extended,
    /// Last-resort model.
    Fallback,
}

impl ModelRole {
    /// The role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Primary => "primary",
            ModelRole::Extended => "extended",
            ModelRole::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static description of one configured upstream model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Opaque upstream model identifier.
    pub id: String,
    /// Token limit used for routing decisions (not billing-accurate).
    pub token_limit: i32,
    /// The role this model plays in the fallback hierarchy.
    pub role: ModelRole,
}

impl ModelDescriptor {
    /// Construct a new descriptor.
    pub fn new(id: impl Into<String>, token_limit: i32, role: ModelRole) -> Self {
        Self {
            id: id.into(),
            token_limit,
            role,
        }
    }
}
