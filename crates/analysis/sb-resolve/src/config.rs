//! Engine configuration

use anyhow::{Context, Result};
use sb_diagnostics::DiagnosticsConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Tunables of the resolution engine
///
/// ```toml
/// max_depth = 256
/// discard_closed_scopes = true
///
/// [diagnostics]
/// max_errors = 100
/// warnings_as_errors = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Error budget of the diagnostic sink
    pub diagnostics: DiagnosticsConfig,
    /// Maximum nesting of qualified-name, base-class and using recursion
    pub max_depth: usize,
    /// Release function and block tables when their scope closes
    pub discard_closed_scopes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            diagnostics: DiagnosticsConfig::default(),
            max_depth: 256,
            discard_closed_scopes: true,
        }
    }
}

/// A configuration document could not be used
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Not valid TOML, or unknown keys
    #[error("invalid engine configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// `max_depth` must allow at least one level
    #[error("max_depth must be at least 1")]
    ZeroDepth,
}

impl EngineConfig {
    /// Parse a TOML document; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed TOML, unknown keys or a zero depth.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        if config.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine configuration: {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse engine configuration: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.diagnostics.max_errors, 100);
        assert_eq!(config.max_depth, 256);
        assert!(config.discard_closed_scopes);
    }

    #[test]
    fn test_partial_document() {
        let config = EngineConfig::from_toml_str(
            "max_depth = 8\n[diagnostics]\nwarnings_as_errors = true\n",
        )
        .unwrap();
        assert_eq!(config.max_depth, 8);
        assert!(config.diagnostics.warnings_as_errors);
        assert_eq!(config.diagnostics.max_errors, 100);
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(matches!(
            EngineConfig::from_toml_str("max_depht = 3"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("max_depth = 0"),
            Err(ConfigError::ZeroDepth)
        ));
    }
}
