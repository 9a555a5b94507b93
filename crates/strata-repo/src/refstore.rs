use strata_types::DatasetRef;

use crate::error::RepoResult;

/// Mutable `(peername, name)` → content path mapping.
///
/// At most one live ref exists per `(peername, name)` pair; `put_ref`
/// replaces any existing entry for the pair. The store provides its own
/// concurrency safety per operation but no transactions across operations:
/// callers racing mutations on the same name can lose updates and must
/// serialize externally.
pub trait RefStore: Send + Sync {
    /// Insert or replace the ref for its `(peername, name)` pair.
    fn put_ref(&self, r: &DatasetRef) -> RepoResult<()>;

    /// Resolve a possibly partial ref (e.g. name only) into its full,
    /// currently authoritative form.
    ///
    /// Returns `NotFound` if nothing matches and `Conflict` if the partial
    /// ref is ambiguous.
    fn get_ref(&self, partial: &DatasetRef) -> RepoResult<DatasetRef>;

    /// Remove the ref for this `(peername, name)` pair.
    ///
    /// Returns `NotFound` if no such ref exists.
    fn delete_ref(&self, r: &DatasetRef) -> RepoResult<()>;

    /// List stored refs in stable order, `offset` in and at most `limit`.
    fn references(&self, limit: usize, offset: usize) -> RepoResult<Vec<DatasetRef>>;
}
