use crate::error::{ExtentError, Result};
use std::path::Path;

/// Source language handled by the discoverer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    #[default]
    Go,
}

impl SourceLanguage {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "go" => Ok(Self::Go),
            other => Err(ExtentError::unsupported_language(format!(".{other}"))),
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| ExtentError::unsupported_language(path.display().to_string()))
            .and_then(Self::from_extension)
    }

    /// Get Tree-sitter language instance
    #[must_use]
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            Self::Go => tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Fresh parser for this language
    pub fn parser(self) -> Result<tree_sitter::Parser> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.tree_sitter_language())
            .map_err(|e| ExtentError::tree_sitter(format!("Failed to set language: {e}")))?;
        Ok(parser)
    }
}
