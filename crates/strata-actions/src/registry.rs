//! The registry sync engine.
//!
//! Publishing copies a dataset's encoded form into the configured registry
//! under `peername/name`; unpublishing removes it. Both resolve the ref
//! locally first and gate on ownership: only the active profile's own
//! datasets may be published. The registry verifies signatures on its own,
//! this engine just passes the public key through.

use serde_json::Value;

use tracing::debug;

use strata_repo::{canonicalize_ref, Repo, RepoError};
use strata_types::{DatasetRef, Profile};

use crate::error::{ActionError, ActionResult};

/// Publish/unpublish operations over one repo's configured registry.
pub struct RegistryActions<R> {
    repo: R,
}

struct PublishParams {
    profile: Profile,
    r: DatasetRef,
    encoded: Value,
}

impl<R: Repo> RegistryActions<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Copy the dataset named by `r` into the registry. Returns the
    /// resolved ref.
    pub async fn publish(&self, r: &DatasetRef) -> ActionResult<DatasetRef> {
        debug!(r#ref = %r, "publishing dataset");
        let params = self.publish_params(r)?;
        self.check_permission(&params.profile, &params.r)?;
        let registry = self.repo.registry().ok_or(ActionError::NoRegistry)?;
        registry
            .put_dataset(
                &params.r.peername,
                &params.r.name,
                &params.encoded,
                &params.profile.public_key(),
            )
            .await?;
        Ok(params.r)
    }

    /// Remove the dataset named by `r` from the registry. Returns the
    /// resolved ref.
    pub async fn unpublish(&self, r: &DatasetRef) -> ActionResult<DatasetRef> {
        debug!(r#ref = %r, "unpublishing dataset");
        let params = self.publish_params(r)?;
        self.check_permission(&params.profile, &params.r)?;
        let registry = self.repo.registry().ok_or(ActionError::NoRegistry)?;
        registry
            .delete_dataset(
                &params.r.peername,
                &params.r.name,
                &params.encoded,
                &params.profile.public_key(),
            )
            .await?;
        Ok(params.r)
    }

    /// Shared resolution for both directions: configuration checks, local
    /// ref canonicalization, content load, encoding.
    fn publish_params(&self, r: &DatasetRef) -> ActionResult<PublishParams> {
        if self.repo.registry().is_none() {
            return Err(ActionError::NoRegistry);
        }
        // Registry calls are key-attributed; a repo without a profile has
        // no key to attribute them to.
        let profile = self.repo.profile().map_err(|_| ActionError::NoKey)?;

        let mut resolved = r.clone();
        canonicalize_ref(&self.repo, &mut resolved)?;

        let store = self.repo.store().ok_or(ActionError::NoStore)?;
        let path = resolved.path.clone().ok_or(RepoError::NotFound)?;
        let encoded = store.get(&path)?.encode()?;

        Ok(PublishParams {
            profile,
            r: resolved,
            encoded,
        })
    }

    fn check_permission(&self, profile: &Profile, r: &DatasetRef) -> ActionResult<()> {
        if profile.peername != r.peername {
            return Err(ActionError::Permission {
                caller: profile.peername.clone(),
                owner: r.peername.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use strata_registry::MemRegistry;
    use strata_repo::MemRepo;
    use strata_types::{Dataset, Meta, Profile, ProfileId};

    fn repo_with_dataset(peername: &str, name: &str) -> (MemRepo, DatasetRef) {
        let repo = MemRepo::new(Profile::generate("nora"));
        let ds = Dataset {
            meta: Some(Meta {
                title: "City Schools".into(),
                ..Meta::default()
            }),
            ..Dataset::default()
        };
        let path = repo.store().unwrap().put(&ds, b"a,b\n").unwrap();
        let r = DatasetRef::new(ProfileId::from_raw([1u8; 32]), peername, name, path);
        repo.refs().put_ref(&r).unwrap();
        (repo, r)
    }

    #[tokio::test]
    async fn publish_copies_entry_to_registry() {
        let registry = Arc::new(MemRegistry::new());
        let (repo, r) = repo_with_dataset("nora", "schools");
        let actions = RegistryActions::new(repo.with_registry(registry.clone()));

        let resolved = actions.publish(&r).await.unwrap();
        assert_eq!(resolved.peername, "nora");
        assert!(registry.contains("nora", "schools"));
        assert_eq!(registry.put_count(), 1);
    }

    #[tokio::test]
    async fn publish_resolves_name_only_ref() {
        let registry = Arc::new(MemRegistry::new());
        let (repo, _) = repo_with_dataset("nora", "schools");
        let actions = RegistryActions::new(repo.with_registry(registry.clone()));

        let partial = DatasetRef {
            name: "schools".into(),
            ..DatasetRef::default()
        };
        let resolved = actions.publish(&partial).await.unwrap();
        assert_eq!(resolved.peername, "nora");
        assert!(resolved.path.is_some());
        assert!(registry.contains("nora", "schools"));
    }

    #[tokio::test]
    async fn publish_foreign_dataset_is_permission_error() {
        // Registry and key are both configured; only ownership fails.
        let registry = Arc::new(MemRegistry::new());
        let (repo, r) = repo_with_dataset("theo", "schools");
        let actions = RegistryActions::new(repo.with_registry(registry.clone()));

        let err = actions.publish(&r).await.unwrap_err();
        match err {
            ActionError::Permission { caller, owner } => {
                assert_eq!(caller, "nora");
                assert_eq!(owner, "theo");
            }
            other => panic!("expected permission error, got {other:?}"),
        }
        assert_eq!(registry.put_count(), 0);
    }

    #[tokio::test]
    async fn publish_without_registry_fails() {
        let (repo, r) = repo_with_dataset("nora", "schools");
        let actions = RegistryActions::new(repo);
        let err = actions.publish(&r).await.unwrap_err();
        assert!(matches!(err, ActionError::NoRegistry));
    }

    #[tokio::test]
    async fn publish_without_profile_fails() {
        let registry = Arc::new(MemRegistry::new());
        let (repo, r) = repo_with_dataset("nora", "schools");
        let actions = RegistryActions::new(repo.without_profile().with_registry(registry));
        let err = actions.publish(&r).await.unwrap_err();
        assert!(matches!(err, ActionError::NoKey));
    }

    #[tokio::test]
    async fn publish_unknown_ref_is_not_found() {
        let registry = Arc::new(MemRegistry::new());
        let (repo, _) = repo_with_dataset("nora", "schools");
        let actions = RegistryActions::new(repo.with_registry(registry));

        let ghost = DatasetRef::partial("nora", "ghost");
        let err = actions.publish(&ghost).await.unwrap_err();
        assert!(matches!(err, ActionError::Repo(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn unpublish_removes_entry() {
        let registry = Arc::new(MemRegistry::new());
        let (repo, r) = repo_with_dataset("nora", "schools");
        let actions = RegistryActions::new(repo.with_registry(registry.clone()));

        actions.publish(&r).await.unwrap();
        actions.unpublish(&r).await.unwrap();
        assert!(!registry.contains("nora", "schools"));
        assert_eq!(registry.delete_count(), 1);
    }

    #[tokio::test]
    async fn unpublish_foreign_dataset_is_permission_error() {
        let registry = Arc::new(MemRegistry::new());
        let (repo, r) = repo_with_dataset("theo", "schools");
        let actions = RegistryActions::new(repo.with_registry(registry.clone()));

        let err = actions.unpublish(&r).await.unwrap_err();
        assert!(matches!(err, ActionError::Permission { .. }));
        assert_eq!(registry.delete_count(), 0);
    }
}
