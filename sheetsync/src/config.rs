//! Host conventions and matching knobs.
//!
//! The defaults describe the schematic tool this crate was built against.
//! A JSON file can override any subset of fields.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::geometry::DEFAULT_TOLERANCE;
use crate::host::WireStyle;

/// Settings shared by the resolver, the extractor and the interchange codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Label texts starting with any of these are host auto-names.
    pub placeholder_prefixes: Vec<String>,

    /// Point-on-segment tolerance in grid units.
    pub tolerance: i32,

    /// Upper bound for nearest-segment matching; `None` keeps it unbounded.
    pub nearest_max_distance: Option<f64>,

    /// Attribute names that carry a component's value, in probe order.
    pub value_attribute_aliases: Vec<String>,

    /// Attribute properties that hold a value, in probe order.
    pub value_accessors: Vec<String>,

    /// Wire style tag passed to every net creation call.
    pub wire_style: WireStyle,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            placeholder_prefixes: vec!["$".to_string()],
            tolerance: DEFAULT_TOLERANCE,
            nearest_max_distance: None,
            value_attribute_aliases: vec!["Value".to_string(), "VALUE".to_string()],
            value_accessors: vec![
                "EitherValue".to_string(),
                "InstanceValue".to_string(),
                "Value".to_string(),
            ],
            wire_style: WireStyle::Wire,
        }
    }
}

impl SyncConfig {
    /// Read a config file; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: SyncConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tolerance < 0 {
            return Err(ConfigError::Invalid(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        if let Some(max) = self.nearest_max_distance {
            if !max.is_finite() || max < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "nearest_max_distance must be a non-negative number, got {}",
                    max
                )));
            }
        }
        if self.value_accessors.is_empty() {
            return Err(ConfigError::Invalid("value_accessors is empty".to_string()));
        }
        Ok(())
    }

    /// True for host auto-generated names such as `$1N42`.
    pub fn is_placeholder(&self, text: &str) -> bool {
        let text = text.trim();
        self.placeholder_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && text.starts_with(prefix.as_str()))
    }

    /// Trimmed text when it is a real, user-meaningful name.
    pub fn meaningful_name(&self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() || self.is_placeholder(text) {
            None
        } else {
            Some(text.to_string())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
