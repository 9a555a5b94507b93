//! The [`ContentStore`] contract and its optional capabilities.
//!
//! A content store is immutable blob storage where the path is a function
//! of the content. Fetching from remote sources and pinning are optional
//! capabilities a backend may or may not provide; their absence is a
//! normal, expected condition. Query with [`ContentStore::as_fetcher`] /
//! [`ContentStore::as_pinner`], never assume.

use async_trait::async_trait;
use strata_types::{ContentPath, Dataset};

use crate::error::RepoResult;

/// Where a fetch should pull content from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchSource {
    /// Any source the store knows about.
    Any,
    /// A specific named peer.
    Peer(String),
}

/// Immutable content-addressed dataset storage.
///
/// Identical content always yields the identical path, so writes are
/// idempotent and dedup is automatic.
pub trait ContentStore: Send + Sync {
    /// Persist a dataset plus its body, returning the content path.
    fn put(&self, dataset: &Dataset, body: &[u8]) -> RepoResult<ContentPath>;

    /// Load a dataset by path. The returned dataset carries its own path.
    fn get(&self, path: &ContentPath) -> RepoResult<Dataset>;

    /// Whether content exists at `path`.
    fn has(&self, path: &ContentPath) -> RepoResult<bool>;

    /// The fetch-from-remote capability, if this store has it.
    fn as_fetcher(&self) -> Option<&dyn Fetcher> {
        None
    }

    /// The pinning capability, if this store has it.
    fn as_pinner(&self) -> Option<&dyn Pinner> {
        None
    }
}

/// Optional capability: pull content from a remote source into the store.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the package at `key` from `source`, making it locally
    /// readable, and return its body bytes.
    async fn fetch(&self, source: FetchSource, key: &ContentPath) -> RepoResult<Vec<u8>>;
}

/// Optional capability: retain content against garbage collection.
pub trait Pinner: Send + Sync {
    fn pin(&self, path: &ContentPath, recursive: bool) -> RepoResult<()>;
    fn unpin(&self, path: &ContentPath, recursive: bool) -> RepoResult<()>;
}
