use strata_registry::RegistryClient;
use strata_types::{DatasetRef, Profile};

use crate::error::{RepoError, RepoResult};
use crate::eventlog::EventLog;
use crate::refstore::RefStore;
use crate::store::ContentStore;

/// The composite repository contract engines decorate.
///
/// A repo wires together the ref store, the (optional) content store, the
/// event log, the active profile, and the (optional) registry client.
/// Engines hold a `Repo` and add operations on top, forwarding these
/// accessors unchanged.
pub trait Repo: Send + Sync {
    /// The name → content path mapping.
    fn refs(&self) -> &dyn RefStore;

    /// The content store, if one is configured.
    fn store(&self) -> Option<&dyn ContentStore>;

    /// The registry client, if one is configured. The registry is a
    /// secondary index, never authoritative.
    fn registry(&self) -> Option<&dyn RegistryClient>;

    /// The lifecycle event log.
    fn events(&self) -> &dyn EventLog;

    /// The active profile. Exactly one per repo; read-only to engines.
    fn profile(&self) -> RepoResult<Profile>;
}

/// Resolve a partially specified ref into its full, current form.
///
/// Fills a blank or `me` peername from the active profile, then resolves
/// the path through the ref store when missing. Fails with `NotFound` when
/// nothing matches and `Conflict` when the partial ref is ambiguous.
pub fn canonicalize_ref(repo: &dyn Repo, r: &mut DatasetRef) -> RepoResult<()> {
    if r.peername.is_empty() || r.peername == "me" {
        let pro = repo.profile()?;
        r.peername = pro.peername.clone();
        r.profile_id = Some(pro.id.clone());
    }
    if r.name.is_empty() {
        return Err(RepoError::NotFound);
    }
    if r.needs_resolution() {
        *r = repo.refs().get_ref(r)?;
    }
    Ok(())
}
