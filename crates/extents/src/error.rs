use thiserror::Error;

/// Result type for extent discovery
pub type Result<T> = std::result::Result<T, ExtentError>;

/// Errors that can occur while discovering extents
#[derive(Error, Debug)]
pub enum ExtentError {
    /// The source does not parse; discovery never guesses around errors
    #[error("syntax error at {line}:{column}")]
    Syntax { line: usize, column: usize },

    /// Unsupported language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// File exceeds the configured size limit
    #[error("source is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl ExtentError {
    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }
}
