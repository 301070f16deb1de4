use crate::error::{InstrumentError, Result};
use gocov_extents::DiscoveryConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Import path of the runtime registry package
pub const DEFAULT_REGISTRY_IMPORT: &str = "github.com/axw/gocov";

/// Configuration for source instrumentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Insert `Enter`/`Leave` calls at function entry
    pub track_functions: bool,

    /// Import path of the registry package the generated code calls
    pub registry_import: String,

    /// Name the registry import is bound to when it has to be added
    pub registry_alias: String,

    /// Imports of other instrumented packages, old path to new path
    pub rewrite_imports: BTreeMap<String, String>,

    pub discovery: DiscoveryConfig,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            track_functions: true,
            registry_import: DEFAULT_REGISTRY_IMPORT.to_string(),
            registry_alias: "gocov".to_string(),
            rewrite_imports: BTreeMap::new(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl InstrumentConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.registry_import.is_empty() {
            return Err(InstrumentError::invalid_config("registry_import must not be empty"));
        }
        if self.registry_import.contains(['"', '`', '\n']) {
            return Err(InstrumentError::invalid_config(format!(
                "registry_import is not an import path: {:?}",
                self.registry_import
            )));
        }
        if !is_identifier(&self.registry_alias) {
            return Err(InstrumentError::invalid_config(format!(
                "registry_alias is not a Go identifier: {:?}",
                self.registry_alias
            )));
        }
        self.discovery
            .validate()
            .map_err(|e| InstrumentError::invalid_config(e.to_string()))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && name != "_"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(InstrumentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = InstrumentConfig::default();

        config.registry_alias = "_".into();
        assert!(config.validate().is_err());

        config.registry_alias = "9lives".into();
        assert!(config.validate().is_err());

        config.registry_alias = "cov".into();
        config.registry_import = String::new();
        assert!(config.validate().is_err());

        config.registry_import = "example.com/\"x".into();
        assert!(config.validate().is_err());

        config.registry_import = "example.com/cov".into();
        assert!(config.validate().is_ok());

        config.discovery.max_file_bytes = 0;
        assert!(matches!(config.validate(), Err(InstrumentError::InvalidConfig(_))));
    }
}
