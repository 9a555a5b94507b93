use thiserror::Error;

use crate::transform::TransformError;

/// Errors from the action engines.
///
/// Capability, configuration, permission, and protocol failures are
/// returned synchronously and never retried here. Retry policy belongs to
/// the caller.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Repo(#[from] strata_repo::RepoError),

    #[error(transparent)]
    Registry(#[from] strata_registry::RegistryError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The content store lacks the fetch-from-remote capability.
    #[error("this store cannot fetch from remote sources")]
    CannotFetch,

    /// A dataset declares a transform but no engine is configured.
    #[error("no transform engine configured")]
    NoTransformEngine,

    #[error("no content store configured")]
    NoStore,

    #[error("no configured registry")]
    NoRegistry,

    #[error("repo has no configured private key")]
    NoKey,

    /// The active peername does not own the ref being published.
    #[error("peername mismatch: '{caller}' doesn't have permission to publish a dataset created by '{owner}'")]
    Permission { caller: String, owner: String },

    #[error("encoding error: {0}")]
    Encode(String),

    /// Both a local repo and a remote client were supplied.
    #[error("both a repo and a client supplied")]
    DualMode,

    /// Neither a local repo nor a remote client was supplied.
    #[error("neither a repo nor a client supplied")]
    NoBackend,
}

pub type ActionResult<T> = Result<T, ActionError>;

impl From<strata_types::TypeError> for ActionError {
    fn from(e: strata_types::TypeError) -> Self {
        ActionError::Encode(e.to_string())
    }
}
