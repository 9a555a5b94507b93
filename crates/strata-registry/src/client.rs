use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strata_crypto::VerifyingKey;

use crate::error::RegistryResult;

/// Parameters for a registry search.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub limit: usize,
    pub offset: usize,
}

/// One registry search hit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    /// Kind of indexed object (currently always "dataset").
    pub kind: String,
    /// Registry-side identifier, `peername/name`.
    pub id: String,
    /// The indexed value, as the registry stored it.
    pub value: Value,
}

/// Client contract for a dataset registry.
///
/// The registry verifies signatures itself; callers only pass the public
/// key through. None of these calls are retried by the engines; retry
/// policy belongs to the caller.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Query the registry's search index.
    async fn search(&self, params: &SearchParams) -> RegistryResult<Vec<SearchResult>>;

    /// Publish (or re-publish) a dataset under `peername/name`.
    async fn put_dataset(
        &self,
        peername: &str,
        name: &str,
        dataset: &Value,
        pubkey: &VerifyingKey,
    ) -> RegistryResult<()>;

    /// Remove a dataset entry from the registry.
    async fn delete_dataset(
        &self,
        peername: &str,
        name: &str,
        dataset: &Value,
        pubkey: &VerifyingKey,
    ) -> RegistryResult<()>;
}
