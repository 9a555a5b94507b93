//! The dataset action engine.
//!
//! Wraps a [`Repo`], adding the lifecycle operations that keep the ref
//! store, content store, and event log consistent with one another. The
//! stores offer no cross-operation transactions, so each operation orders
//! its steps to keep observable state sane and classifies every step as
//! fatal or best-effort.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use strata_repo::{canonicalize_ref, FetchSource, Repo, RepoError};
use strata_types::{Author, Dataset, DatasetRef, EventKind};

use crate::error::{ActionError, ActionResult};
use crate::transform::TransformEngine;

/// Lifecycle operations over one repo.
pub struct DatasetActions<R> {
    repo: R,
    transformer: Option<Arc<dyn TransformEngine>>,
}

impl<R: Repo> DatasetActions<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            transformer: None,
        }
    }

    /// Attach a transform engine for datasets that declare transforms.
    pub fn with_transformer(mut self, transformer: Arc<dyn TransformEngine>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Create a new dataset version under `name`.
    ///
    /// Explicit user-supplied fields are captured in an overlay before any
    /// transform runs and re-applied afterwards, so they always win over
    /// transform output. A non-root `previous_path` retires the superseded
    /// ref best-effort; writing the new ref is fatal, though by then the
    /// content is already durably stored.
    pub fn create(
        &self,
        name: &str,
        mut ds: Dataset,
        body: &[u8],
        secrets: &BTreeMap<String, String>,
        pin: bool,
    ) -> ActionResult<DatasetRef> {
        debug!(%name, "creating dataset");
        let pro = self.repo.profile()?;

        let mut user_set = Dataset::skeleton();
        user_set.assign(&ds);

        if let Some(commit) = &mut ds.commit {
            // The author stamp is the only identity the dataset itself
            // carries; everything else stays with the profile.
            commit.author = Some(Author {
                id: pro.id.to_hex(),
            });
            if commit.timestamp.is_none() {
                commit.timestamp = Some(chrono::Utc::now());
            }
        }

        let mut body = body.to_vec();
        if ds.transform.is_some() {
            let engine = self
                .transformer
                .as_deref()
                .ok_or(ActionError::NoTransformEngine)?;
            info!(%name, "running transform");
            body = engine.exec(&mut ds, &body, secrets)?;
            info!(%name, "transform done");
            // Merge precedence: transform output < original user input.
            ds.assign(&user_set);
        }

        let store = self.repo.store().ok_or(ActionError::NoStore)?;
        let path = store.put(&ds, &body)?;
        if pin {
            if let Some(pinner) = store.as_pinner() {
                pinner.pin(&path, true)?;
            }
        }

        if let Some(prev) = &ds.previous_path {
            if !prev.is_empty() && !prev.is_root() {
                let stale =
                    DatasetRef::new(pro.id.clone(), pro.peername.clone(), name, prev.clone());
                if let Err(e) = self.repo.refs().delete_ref(&stale) {
                    // Best-effort: a failed cleanup never aborts the create.
                    warn!(r#ref = %stale, error = %e, "removing superseded ref");
                }
            }
        }

        let r = DatasetRef::new(pro.id, pro.peername, name, path);
        if let Err(e) = self.repo.refs().put_ref(&r) {
            error!(r#ref = %r, error = %e, "writing ref");
            return Err(e.into());
        }

        self.repo.events().log_event(EventKind::Created, &r)?;
        if pin && store.as_pinner().is_some() {
            self.repo.events().log_event(EventKind::Pinned, &r)?;
        }
        Ok(r)
    }

    /// Fetch a remote dataset package, pin it, and register the ref.
    ///
    /// Requires the store's fetch capability. Nothing is retried; any
    /// fetch, pin, or put failure is returned as-is. The dataset is
    /// reloaded from the store afterwards to confirm integrity, and its
    /// encoded form is attached to the ref.
    pub async fn add(&self, r: &mut DatasetRef) -> ActionResult<()> {
        debug!(r#ref = %r, "adding dataset");
        let store = self.repo.store().ok_or(ActionError::NoStore)?;
        let fetcher = store.as_fetcher().ok_or(ActionError::CannotFetch)?;
        let path = r.path.clone().ok_or(RepoError::NotFound)?;
        let key = path.base_key();

        fetcher.fetch(FetchSource::Any, &key).await?;
        self.pin(r)?;
        self.repo.refs().put_ref(r)?;

        let ds = store.get(&key.manifest())?;
        r.dataset = Some(ds);
        Ok(())
    }

    /// Load a dataset from the store and attach it to the ref.
    pub fn read(&self, r: &mut DatasetRef) -> ActionResult<()> {
        let Some(store) = self.repo.store() else {
            return Err(RepoError::NotFound.into());
        };
        let path = r.path.clone().ok_or(RepoError::NotFound)?;
        r.dataset = Some(store.get(&path)?);
        Ok(())
    }

    /// Move a ref from one name to another.
    ///
    /// Delete-then-insert with no rollback: if the insert fails after the
    /// delete succeeded, neither name is mapped.
    pub fn rename(&self, old: &DatasetRef, new: &DatasetRef) -> ActionResult<()> {
        self.repo.refs().delete_ref(old)?;
        self.repo.refs().put_ref(new)?;
        Ok(self.repo.events().log_event(EventKind::Renamed, new)?)
    }

    /// Mark a dataset for retention.
    ///
    /// Fails with `NotPinner` on a store without the pinning capability.
    pub fn pin(&self, r: &DatasetRef) -> ActionResult<()> {
        let store = self.repo.store().ok_or(ActionError::NoStore)?;
        let pinner = store.as_pinner().ok_or(RepoError::NotPinner)?;
        let path = r.path.clone().ok_or(RepoError::NotFound)?;
        pinner.pin(&path, true)?;
        Ok(self.repo.events().log_event(EventKind::Pinned, r)?)
    }

    /// Unmark a dataset for retention.
    pub fn unpin(&self, r: &DatasetRef) -> ActionResult<()> {
        let store = self.repo.store().ok_or(ActionError::NoStore)?;
        let pinner = store.as_pinner().ok_or(RepoError::NotPinner)?;
        let path = r.path.clone().ok_or(RepoError::NotFound)?;
        pinner.unpin(&path, true)?;
        Ok(self.repo.events().log_event(EventKind::Unpinned, r)?)
    }

    /// Remove a dataset: ref, registry entry (best-effort), pin, in that
    /// order.
    ///
    /// The content must load before anything mutates, because the registry
    /// cascade needs the decoded dataset. The ref is removed first so no
    /// listing can observe a ref pointing at content about to be unpinned.
    pub async fn delete(&self, r: &DatasetRef) -> ActionResult<()> {
        debug!(r#ref = %r, "deleting dataset");
        let pro = self.repo.profile()?;
        let store = self.repo.store().ok_or(ActionError::NoStore)?;
        let path = r.path.clone().ok_or(RepoError::NotFound)?;
        let ds = store.get(&path)?;

        self.repo.refs().delete_ref(r)?;

        if let Some(registry) = self.repo.registry() {
            // The registry is a secondary index, never authoritative:
            // failures here are logged and swallowed.
            match ds.encode() {
                Ok(encoded) => {
                    if let Err(e) = registry
                        .delete_dataset(&r.peername, &r.name, &encoded, &pro.public_key())
                        .await
                    {
                        warn!(r#ref = %r, error = %e, "removing registry entry");
                    }
                }
                Err(e) => {
                    warn!(r#ref = %r, error = %e, "encoding dataset for registry removal");
                }
            }
        }

        match self.unpin(r) {
            // A store that can't pin has nothing to unpin.
            Err(ActionError::Repo(RepoError::NotPinner)) => {}
            other => other?,
        }

        Ok(self.repo.events().log_event(EventKind::Deleted, r)?)
    }

    /// Resolve a partial ref against this repo.
    pub fn resolve(&self, r: &mut DatasetRef) -> ActionResult<()> {
        Ok(canonicalize_ref(&self.repo, r)?)
    }
}
