use crate::error::MergeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Byte range `[start, end)` used as structural identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Coverage of one simple statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatementCoverage {
    /// Start byte offset of the statement
    pub start: usize,

    /// End byte offset of the statement (exclusive)
    pub end: usize,

    /// Number of times the statement was reached
    pub reached: i64,
}

/// Coverage of one function.
///
/// `name` is `T.Method` for methods and `@line:col` for top-level function
/// literals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionCoverage {
    pub name: String,

    /// Path of the file defining the function
    pub file: String,

    /// Start byte offset of the declaration
    pub start: usize,

    /// End byte offset of the declaration (exclusive)
    pub end: usize,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub statements: Vec<StatementCoverage>,

    /// Number of times the function was entered
    #[serde(default)]
    pub entered: i64,

    /// Number of times the function was left
    #[serde(default)]
    pub left: i64,
}

/// Coverage of one package, keyed by its import path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageCoverage {
    pub name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub functions: Vec<FunctionCoverage>,
}

// Go marshals empty slices as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl StatementCoverage {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            reached: 0,
        }
    }

    #[must_use]
    pub const fn range(&self) -> SourceRange {
        SourceRange {
            start: self.start,
            end: self.end,
        }
    }

    /// Verify that `other` describes the same statement.
    pub fn check_compatible(&self, other: &Self) -> Result<(), MergeError> {
        if self.range() != other.range() {
            return Err(MergeError::RangeMismatch {
                left: self.range(),
                right: other.range(),
            });
        }
        Ok(())
    }

    /// Add the counters of `other` into `self`.
    ///
    /// Nothing is modified when the statements differ.
    pub fn accumulate(&mut self, other: &Self) -> Result<(), MergeError> {
        self.check_compatible(other)?;
        self.reached = self.reached.saturating_add(other.reached);
        Ok(())
    }
}

impl FunctionCoverage {
    #[must_use]
    pub fn new(name: impl Into<String>, file: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            start,
            end,
            statements: Vec::new(),
            entered: 0,
            left: 0,
        }
    }

    #[must_use]
    pub const fn range(&self) -> SourceRange {
        SourceRange {
            start: self.start,
            end: self.end,
        }
    }

    /// Number of statements reached at least once
    #[must_use]
    pub fn statements_reached(&self) -> usize {
        self.statements.iter().filter(|s| s.reached > 0).count()
    }

    /// Verify that `other` describes the same function, statements included.
    pub fn check_compatible(&self, other: &Self) -> Result<(), MergeError> {
        if self.name != other.name {
            return Err(MergeError::NameMismatch(self.name.clone(), other.name.clone()));
        }
        if self.file != other.file {
            return Err(MergeError::FileMismatch(self.file.clone(), other.file.clone()));
        }
        if self.range() != other.range() {
            return Err(MergeError::RangeMismatch {
                left: self.range(),
                right: other.range(),
            });
        }
        if self.statements.len() != other.statements.len() {
            return Err(MergeError::StatementCountMismatch(
                self.statements.len(),
                other.statements.len(),
            ));
        }
        self.statements
            .iter()
            .zip(&other.statements)
            .try_for_each(|(a, b)| a.check_compatible(b))
    }

    /// Add the counters of `other` into `self`.
    ///
    /// The whole structure is validated before any counter changes, so a
    /// mismatch anywhere leaves `self` untouched.
    pub fn accumulate(&mut self, other: &Self) -> Result<(), MergeError> {
        self.check_compatible(other)?;
        self.add_counts(other);
        Ok(())
    }

    fn add_counts(&mut self, other: &Self) {
        self.entered = self.entered.saturating_add(other.entered);
        self.left = self.left.saturating_add(other.left);
        for (a, b) in self.statements.iter_mut().zip(&other.statements) {
            a.reached = a.reached.saturating_add(b.reached);
        }
    }
}

impl PackageCoverage {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    /// Verify that `other` describes the same package, recursively.
    pub fn check_compatible(&self, other: &Self) -> Result<(), MergeError> {
        if self.name != other.name {
            return Err(MergeError::NameMismatch(self.name.clone(), other.name.clone()));
        }
        if self.functions.len() != other.functions.len() {
            return Err(MergeError::FunctionCountMismatch(
                self.functions.len(),
                other.functions.len(),
            ));
        }
        self.functions
            .iter()
            .zip(&other.functions)
            .try_for_each(|(a, b)| a.check_compatible(b))
    }

    /// Add the counters of `other` into `self`; check-then-commit.
    pub fn accumulate(&mut self, other: &Self) -> Result<(), MergeError> {
        self.check_compatible(other)?;
        for (a, b) in self.functions.iter_mut().zip(&other.functions) {
            a.add_counts(b);
        }
        Ok(())
    }
}
