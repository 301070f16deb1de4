use gocov_extents::ExtentError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for profile parsing and ingestion
pub type Result<T> = std::result::Result<T, ProfileError>;

/// Errors that can occur while reading or ingesting cover profiles
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The first line is not `mode: <mode>`
    #[error("bad mode line: {0:?}")]
    BadModeLine(String),

    #[error("unknown profile mode: {0:?}")]
    UnknownMode(String),

    /// A block line does not have the `file:l.c,l.c stmts count` shape
    #[error("line {line}: {text:?} doesn't match expected format")]
    Malformed { line: usize, text: String },

    /// The same block was reported with different statement counts
    #[error("{file}: inconsistent NumStmt: changed from {before} to {after}")]
    InconsistentNumStmt {
        file: String,
        before: usize,
        after: usize,
    },

    /// The source a profile refers to could not be analyzed
    #[error("{file}: {source}")]
    Source {
        file: String,
        #[source]
        source: ExtentError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("thread pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("pattern: {0}")]
    Pattern(#[from] regex::Error),
}
