use crate::error::{ExtentError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for extent discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Register function literals outside any function as `@line:col`
    pub top_level_literals: bool,

    /// Return no extents for files marked `// Code generated ... DO NOT EDIT.`
    pub skip_generated: bool,

    /// Largest source accepted, in bytes
    pub max_file_bytes: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            top_level_literals: true,
            skip_generated: false,
            max_file_bytes: 16 * 1024 * 1024,
        }
    }
}

impl DiscoveryConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_file_bytes == 0 {
            return Err(ExtentError::invalid_config("max_file_bytes must be > 0"));
        }
        Ok(())
    }
}
