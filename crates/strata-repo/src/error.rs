use thiserror::Error;

/// Errors from repository collaborators.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Missing ref or content path.
    #[error("not found")]
    NotFound,

    /// A partial ref matched more than one stored entry.
    #[error("ambiguous reference: {0}")]
    Conflict(String),

    /// The content store does not support pinning. A recognized condition,
    /// not a programming error: the delete path treats it as success.
    #[error("store is not a pinner")]
    NotPinner,

    /// No active profile is configured.
    #[error("no active profile")]
    NoProfile,

    /// Remote fetch failed.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Backend storage failure.
    #[error("store error: {0}")]
    Store(String),

    /// Dataset encoding failure.
    #[error("encoding error: {0}")]
    Encode(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl From<strata_types::TypeError> for RepoError {
    fn from(e: strata_types::TypeError) -> Self {
        RepoError::Encode(e.to_string())
    }
}
