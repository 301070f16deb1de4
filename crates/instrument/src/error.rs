use gocov_extents::ExtentError;
use thiserror::Error;

/// Result type for instrumentation
pub type Result<T> = std::result::Result<T, InstrumentError>;

/// Errors that can occur while instrumenting a file
#[derive(Error, Debug)]
pub enum InstrumentError {
    /// The file could not be analyzed
    #[error(transparent)]
    Extent(#[from] ExtentError),

    /// The file already declares coverage handles
    #[error("{0} is already instrumented")]
    AlreadyInstrumented(String),

    /// The registry itself depends on this package
    #[error("package {0:?} cannot be instrumented")]
    NotInstrumentable(String),

    /// An import path literal that does not unquote
    #[error("invalid import path {literal}: {reason}")]
    InvalidImport { literal: String, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl InstrumentError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
