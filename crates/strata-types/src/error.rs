use thiserror::Error;

/// Errors from parsing or encoding core types.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("encoding error: {0}")]
    Encode(String),
}
