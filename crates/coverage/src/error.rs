use crate::model::SourceRange;
use crate::registry::ObjectKind;
use gocov_protocol::{ObjectRef, ProtocolError};
use std::path::PathBuf;
use thiserror::Error;

/// Two coverage entities disagree on structure and cannot be accumulated.
///
/// Every variant carries both conflicting values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("names do not match: {0:?} != {1:?}")]
    NameMismatch(String, String),

    #[error("files do not match: {0:?} != {1:?}")]
    FileMismatch(String, String),

    #[error("source ranges do not match: {left} != {right}")]
    RangeMismatch { left: SourceRange, right: SourceRange },

    #[error("function counts do not match: {0} != {1}")]
    FunctionCountMismatch(usize, usize),

    #[error("statement counts do not match: {0} != {1}")]
    StatementCountMismatch(usize, usize),
}

/// Errors raised by [`crate::Report`]
#[derive(Error, Debug)]
pub enum ReportError {
    /// Package already present and no merge was requested
    #[error("package already exists: {0:?}")]
    DuplicatePackage(String),

    /// Merge into an existing package failed; the report is unchanged
    #[error("cannot merge package {package:?}: {source}")]
    Merge {
        package: String,
        #[source]
        source: MergeError,
    },

    #[error("invalid report JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while replaying a trace log
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The log is not valid protocol text
    #[error("malformed trace: {0}")]
    Malformed(#[from] ProtocolError),

    /// A call on an object no registration produced
    #[error("line {line}: invalid object uid: {object}")]
    UnknownObject { line: usize, object: ObjectRef },

    /// A call that the referenced object kind does not support
    #[error("line {line}: {object} is a {found}, expected a {expected}")]
    WrongKind {
        line: usize,
        object: ObjectRef,
        expected: ObjectKind,
        found: ObjectKind,
    },

    /// The replaying registry assigned a different uid than the log recorded.
    /// The producer and this registry have drifted apart.
    #[error("line {line}: uid differs, {object} was replayed as uid {actual}: source must have changed")]
    IdentityViolation {
        line: usize,
        object: ObjectRef,
        actual: usize,
    },

    /// The same package was registered twice with different structure
    #[error("package {package:?} registered twice with different structure: {source}")]
    Merge {
        package: String,
        #[source]
        source: MergeError,
    },
}

impl TraceError {
    /// Whether the error means the whole run is untrustworthy rather than
    /// just this one source.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::IdentityViolation { .. })
    }
}
