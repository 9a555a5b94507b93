use thiserror::Error;

/// Errors returned by a registry client.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry rejected request: {0}")]
    Rejected(String),

    #[error("registry unreachable: {0}")]
    Unreachable(String),

    #[error("registry entry not found: {peername}/{name}")]
    NotFound { peername: String, name: String },
}

pub type RegistryResult<T> = Result<T, RegistryError>;
