use crate::error::{ProtocolError, Result};
use std::fmt;

/// Fixed tag every object reference starts with
pub const OBJECT_PREFIX: &str = "gocovObject";

/// Reference to a registered object as it appears in a trace (`gocovObject7`).
///
/// The number is the uid the producing registry assigned. It is only
/// meaningful inside the log that contains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(usize);

impl ObjectRef {
    #[must_use]
    pub const fn new(uid: usize) -> Self {
        Self(uid)
    }

    #[must_use]
    pub const fn uid(self) -> usize {
        self.0
    }

    /// Parse an identifier of the form `gocovObject<uid>`.
    pub fn parse(ident: &str) -> Result<Self> {
        let digits = ident
            .strip_prefix(OBJECT_PREFIX)
            .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| ProtocolError::InvalidObjectRef(ident.to_string()))?;
        digits
            .parse()
            .map(Self)
            .map_err(|_| ProtocolError::InvalidObjectRef(ident.to_string()))
    }

    /// Encoded form of a zero-argument call on this object, newline included.
    ///
    /// Registries compute these once per object so that the counting path can
    /// write them without allocating.
    #[must_use]
    pub fn call_line(self, method: &str) -> Box<[u8]> {
        format!("{self}.{method}()\n").into_bytes().into_boxed_slice()
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{OBJECT_PREFIX}{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_with_prefix() {
        assert_eq!(ObjectRef::new(7).to_string(), "gocovObject7");
    }

    #[test]
    fn parses_valid_reference() {
        assert_eq!(ObjectRef::parse("gocovObject42").unwrap().uid(), 42);
    }

    #[test]
    fn rejects_foreign_identifiers() {
        for bad in ["gocovObject", "gocovObjectX", "object1", "gocovObject-1", "gocovObject1a"] {
            assert!(
                matches!(ObjectRef::parse(bad), Err(ProtocolError::InvalidObjectRef(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn call_line_is_newline_terminated() {
        assert_eq!(&*ObjectRef::new(3).call_line("At"), b"gocovObject3.At()\n");
    }
}
