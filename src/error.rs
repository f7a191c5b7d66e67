//! Error taxonomy shared by the record codec, the file store and the
//! collection operations.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A record line (or one of its fields) could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("expected {expected} fields separated by ' | ', found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("{field} must be an integer, got {value:?}")]
    InvalidInteger { field: &'static str, value: String },

    #[error("borrowed books are not valid JSON: {0}")]
    BorrowedBooks(String),

    #[error("due date {value:?} is not a YYYY-MM-DD date")]
    InvalidDate { value: String },
}

/// What is wrong with a single user-supplied field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    NotAnInteger,
    Negative,
    /// Text that would corrupt the record line it is stored on.
    BreaksLine,
}

/// One offending field in a rejected add/edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub problem: FieldProblem,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.problem {
            FieldProblem::Missing => write!(f, "{} is required", self.field),
            FieldProblem::NotAnInteger => write!(f, "{} must be an integer", self.field),
            FieldProblem::Negative => write!(f, "{} must not be negative", self.field),
            FieldProblem::BreaksLine => write!(
                f,
                "{} must not contain line breaks or \" | \", nor start with \"| \" or end with \" |\"",
                self.field
            ),
        }
    }
}

/// User input rejected before any mutation took place. Every offending field
/// is listed, not just the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Names of the rejected fields, in form order.
    pub fn fields(&self) -> Vec<&'static str> {
        self.issues.iter().map(|issue| issue.field).collect()
    }

    pub fn has_issue(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Top-level error for library operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("index {index} is out of bounds for a collection of {len} records")]
    Bounds { index: usize, len: usize },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LibraryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LibraryError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
