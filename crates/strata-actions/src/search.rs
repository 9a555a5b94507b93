//! Registry search front-end.
//!
//! [`SearchRequests`] runs over exactly one backend: a local repo whose
//! configured registry serves the query, or a remote service that proxies
//! it. Construction with both or neither fails instead of deferring the
//! problem to call time.

use std::sync::Arc;

use async_trait::async_trait;

use strata_registry::{SearchParams, SearchResult};
use strata_repo::Repo;

use crate::error::{ActionError, ActionResult};

/// A remote service capable of serving search queries on our behalf.
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, params: &SearchParams) -> ActionResult<Vec<SearchResult>>;
}

/// Search entry point over one backend.
pub struct SearchRequests {
    repo: Option<Arc<dyn Repo>>,
    client: Option<Arc<dyn SearchService>>,
}

impl std::fmt::Debug for SearchRequests {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchRequests")
            .field("repo", &self.repo.is_some())
            .field("client", &self.client.is_some())
            .finish()
    }
}

impl SearchRequests {
    /// Build over exactly one backend.
    ///
    /// Both supplied is a wiring mistake and fails with `DualMode`;
    /// neither fails with `NoBackend`.
    pub fn new(
        repo: Option<Arc<dyn Repo>>,
        client: Option<Arc<dyn SearchService>>,
    ) -> ActionResult<Self> {
        match (&repo, &client) {
            (Some(_), Some(_)) => Err(ActionError::DualMode),
            (None, None) => Err(ActionError::NoBackend),
            _ => Ok(Self { repo, client }),
        }
    }

    /// Run a query against the backend's registry.
    pub async fn search(&self, params: &SearchParams) -> ActionResult<Vec<SearchResult>> {
        if let Some(client) = &self.client {
            return client.search(params).await;
        }
        let Some(repo) = &self.repo else {
            return Err(ActionError::NoBackend);
        };
        let registry = repo.registry().ok_or(ActionError::NoRegistry)?;
        Ok(registry.search(params).await?)
    }
}
