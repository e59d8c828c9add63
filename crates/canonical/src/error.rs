use thiserror::Error;

/// Errors that can occur during canonicalization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("match refers to unknown keyword id {id}")]
    UnknownKeyword { id: usize },
    #[error("edit {start}..{end} out of bounds for text of {len} characters")]
    EditOutOfBounds { start: usize, end: usize, len: usize },
}
