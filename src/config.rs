//! Interpreter configuration.

use datagen_generator::PrimaryKey;

/// Settings applied to every entity a script declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Key used by root entities that do not declare their own
    pub default_primary_key: PrimaryKey,
    /// Whether entities carry `$type` / `$extends`
    pub metadata_enabled: bool,
}

impl InterpreterConfig {
    pub fn with_primary_key(mut self, primary_key: PrimaryKey) -> Self {
        self.default_primary_key = primary_key;
        self
    }

    pub fn with_metadata(mut self, enabled: bool) -> Self {
        self.metadata_enabled = enabled;
        self
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            default_primary_key: PrimaryKey::default(),
            metadata_enabled: true,
        }
    }
}
