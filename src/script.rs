//! Loading serialized scripts.

use datagen_core::Node;
use std::fs;
use std::path::Path;

/// Error type for script loading.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Error reading the script file
    #[error("Failed to read script file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing a JSON script
    #[error("Failed to parse JSON script: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error parsing a YAML script
    #[error("Failed to parse YAML script: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Load a script tree from a file.
///
/// `.yaml` and `.yml` files are read as YAML, anything else as JSON.
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Node, ScriptError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        from_yaml(&content)
    } else {
        from_json(&content)
    }
}

pub fn from_json(json: &str) -> Result<Node, ScriptError> {
    Ok(serde_json::from_str(json)?)
}

pub fn from_yaml(yaml: &str) -> Result<Node, ScriptError> {
    Ok(serde_yaml::from_str(yaml)?)
}
