//! Engine configuration.

use serde::Deserialize;

/// Default upper bound on expression text, in bytes.
pub const DEFAULT_MAX_EXPRESSION_LENGTH: usize = 64 * 1024;

/// Default component name of the repeating construct whose own parameters
/// are hidden from itself.
pub const DEFAULT_COLLECTION_COMPONENT: &str = "Collection";

/// Configuration shared by scope resolution and the variable operations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Instance kind that declares per-item parameters.
    pub collection_component: String,
    /// Expressions longer than this many bytes are rejected.
    pub max_expression_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collection_component: DEFAULT_COLLECTION_COMPONENT.to_owned(),
            max_expression_length: DEFAULT_MAX_EXPRESSION_LENGTH,
        }
    }
}

impl EngineConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collection component kind (builder).
    pub fn with_collection_component(mut self, component: impl Into<String>) -> Self {
        self.collection_component = component.into();
        self
    }

    /// Set the expression length limit (builder).
    pub fn with_max_expression_length(mut self, max: usize) -> Self {
        self.max_expression_length = max;
        self
    }

    /// Whether `kind` is the configured collection component.
    pub fn is_collection(&self, kind: &str) -> bool {
        self.collection_component == kind
    }
}
