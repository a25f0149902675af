//! Engine configuration file parsing.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Policy knobs of the call-dispatch core.
///
/// Expected format:
/// ```toml
/// [dispatch]
/// function_cache_limit = 4
/// multi_context = false
/// ```
/// Keys may also be given at the top level. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Specialized nodes per call site before promotion to the generic node.
    pub function_cache_limit: usize,
    /// Prototypes remembered per constructor before allocation stops caching shapes.
    pub property_cache_limit: usize,
    /// Several realms run the same code; instance caching is off.
    pub multi_context: bool,
    pub function_cache_on_instance: bool,
    pub inline_trivial_builtins: bool,
    /// Host classes, methods and packages are callable through the fallback node.
    pub host_interop: bool,
    /// Member calls of a missing property go to `__noSuchMethod__` when the receiver has one.
    pub no_such_method: bool,
    pub max_call_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            function_cache_limit: 4,
            property_cache_limit: 5,
            multi_context: false,
            function_cache_on_instance: true,
            inline_trivial_builtins: true,
            host_interop: true,
            no_such_method: true,
            max_call_depth: 512,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    dispatch: Option<EngineConfig>,
    #[serde(flatten)]
    top_level: EngineConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string. A `[dispatch]` table wins over top-level keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.dispatch.unwrap_or(file.top_level))
    }

    /// Whether call sites may install nodes keyed on a single function object.
    pub fn instance_caching(&self) -> bool {
        self.function_cache_on_instance && !self.multi_context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.instance_caching());
    }

    #[test]
    fn test_parse_dispatch_table() {
        let config = EngineConfig::from_toml_str(
            r#"
            [dispatch]
            function_cache_limit = 2
            multi_context = true
            "#,
        )
        .unwrap();
        assert_eq!(config.function_cache_limit, 2);
        assert!(config.multi_context);
        assert!(!config.instance_caching());
        assert_eq!(config.property_cache_limit, 5);
    }

    #[test]
    fn test_parse_top_level_keys() {
        let config = EngineConfig::from_toml_str("inline_trivial_builtins = false").unwrap();
        assert!(!config.inline_trivial_builtins);
        assert_eq!(config.max_call_depth, 512);
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        assert!(matches!(
            EngineConfig::from_toml_str("function_cache_limit = \"four\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
