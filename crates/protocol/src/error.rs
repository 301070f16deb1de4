use thiserror::Error;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while reading a trace log
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A token other than the one the grammar requires
    #[error("{line}:{column}: expected {expected}, found {found}")]
    Unexpected {
        line: usize,
        column: usize,
        expected: &'static str,
        found: String,
    },

    /// A character that starts no token
    #[error("{line}:{column}: unexpected character {ch:?}")]
    UnexpectedChar { line: usize, column: usize, ch: char },

    /// Malformed string literal
    #[error("{line}:{column}: invalid string literal: {reason}")]
    InvalidString {
        line: usize,
        column: usize,
        reason: String,
    },

    /// Integer literal that does not fit an offset
    #[error("{line}:{column}: invalid integer literal {literal:?}")]
    InvalidInt {
        line: usize,
        column: usize,
        literal: String,
    },

    /// Identifier in object position that is not `gocovObject<uid>`
    #[error("expected gocov object name, found {0:?}")]
    InvalidObjectRef(String),

    /// Method name the protocol does not define
    #[error("{line}: unknown method {method:?}")]
    UnknownMethod { line: usize, method: String },
}

impl ProtocolError {
    pub(crate) fn unexpected(
        line: usize,
        column: usize,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        Self::Unexpected {
            line,
            column,
            expected,
            found: found.into(),
        }
    }
}
