use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid identity handle: {0:?}")]
    InvalidHandle(String),

    #[error("invalid identifier: {0:?}")]
    InvalidId(String),

    #[error("unknown time unit: {0:?}")]
    UnknownTimeUnit(String),
}
