//! Generator configuration
//!
//! Configuration only decides which operators run; the operators themselves
//! take no settings.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MutationError, Result};

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub operators: OperatorSelection,
}

/// Which operators of the catalog run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorSelection {
    /// Operator ids to run; empty means all of them
    #[serde(default)]
    pub enabled: Vec<String>,
    /// Operator ids to skip, applied after `enabled`
    #[serde(default)]
    pub disabled: Vec<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl OperatorSelection {
    /// Whether the operator with `id` is selected
    pub fn includes(&self, id: &str) -> bool {
        let enabled = self.enabled.is_empty() || self.enabled.iter().any(|e| e == id);
        enabled && !self.disabled.iter().any(|d| d == id)
    }

    /// Every id the selection mentions, enabled ones first
    pub fn mentioned(&self) -> impl Iterator<Item = &str> {
        self.enabled.iter().chain(&self.disabled).map(String::as_str)
    }
}

impl GeneratorConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MutationError::ConfigError {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        Self::from_yaml(&content).map_err(|e| MutationError::ConfigError {
            message: format!("Failed to parse config file '{}': {}", path.display(), e),
        })
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Example configuration printed by the CLI
    pub fn example() -> &'static str {
        r#"# Example solmut configuration
version: "1.0"

operators:
  # Run only these operators (omit or leave empty to run the whole catalog)
  enabled: []

  # Skip these operators
  disabled:
    - GB   # gas bomb
    - VUR  # unit replacement
"#
    }
}
