//! In-memory repository backends for testing and ephemeral use.
//!
//! [`MemContentStore`] is a blake3-addressed store whose optional
//! capabilities (pinning, remote fetch) are enabled per instance, which is
//! how capability-absence paths get exercised. [`MemRefStore`],
//! [`MemEventLog`], and [`MemRepo`] complete the set. All data lives behind
//! `RwLock`s and is lost on drop.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use strata_registry::RegistryClient;
use strata_types::{ContentPath, Dataset, DatasetRef, Event, EventKind, Profile};

use crate::error::{RepoError, RepoResult};
use crate::eventlog::EventLog;
use crate::refstore::RefStore;
use crate::repo::Repo;
use crate::store::{ContentStore, FetchSource, Fetcher, Pinner};

fn lock_err<T>(e: PoisonError<T>) -> RepoError {
    RepoError::Store(format!("lock poisoned: {e}"))
}

/// An in-memory implementation of [`ContentStore`].
///
/// Paths have the form `/mem/{hash}/dataset.json`. Pinning and fetching
/// are off by default; enable them with [`pinning`](Self::pinning) and
/// [`fetching`](Self::fetching).
#[derive(Debug, Default)]
pub struct MemContentStore {
    objects: RwLock<HashMap<String, (Dataset, Vec<u8>)>>,
    pins: Option<RwLock<HashSet<String>>>,
    remote: Option<RwLock<HashMap<String, (Dataset, Vec<u8>)>>>,
}

impl MemContentStore {
    /// A store with no optional capabilities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the pinning capability.
    pub fn pinning(mut self) -> Self {
        self.pins = Some(RwLock::new(HashSet::new()));
        self
    }

    /// Enable the remote-fetch capability, backed by a seedable source.
    pub fn fetching(mut self) -> Self {
        self.remote = Some(RwLock::new(HashMap::new()));
        self
    }

    /// Place a package in the simulated remote source, returning the base
    /// key a fetch would use.
    pub fn seed_remote(&self, dataset: &Dataset, body: &[u8]) -> RepoResult<ContentPath> {
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| RepoError::Fetch("store has no remote source".to_string()))?;
        let path = Self::address(dataset, body)?;
        let base = path.base_key();
        let mut remote = remote.write().map_err(lock_err)?;
        remote.insert(base.as_str().to_string(), (dataset.clone(), body.to_vec()));
        Ok(base)
    }

    /// Whether the package containing `path` is pinned.
    pub fn is_pinned(&self, path: &ContentPath) -> bool {
        self.pins
            .as_ref()
            .and_then(|p| p.read().ok())
            .map(|p| p.contains(path.base_key().as_str()))
            .unwrap_or(false)
    }

    fn address(dataset: &Dataset, body: &[u8]) -> RepoResult<ContentPath> {
        // The stored path is not part of the addressed content.
        let mut canonical = dataset.clone();
        canonical.path = None;
        let encoded =
            serde_json::to_vec(&canonical).map_err(|e| RepoError::Encode(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"strata-dataset-v1:");
        hasher.update(&encoded);
        hasher.update(body);
        let hash = hasher.finalize();
        let short = hex::encode(&hash.as_bytes()[..10]);
        Ok(ContentPath::new(format!("/mem/{short}")).manifest())
    }
}

impl ContentStore for MemContentStore {
    fn put(&self, dataset: &Dataset, body: &[u8]) -> RepoResult<ContentPath> {
        let path = Self::address(dataset, body)?;
        let mut objects = self.objects.write().map_err(lock_err)?;
        // Idempotent: identical content lands at the identical path.
        objects
            .entry(path.as_str().to_string())
            .or_insert_with(|| (dataset.clone(), body.to_vec()));
        Ok(path)
    }

    fn get(&self, path: &ContentPath) -> RepoResult<Dataset> {
        let manifest = path.manifest();
        let objects = self.objects.read().map_err(lock_err)?;
        let (dataset, _) = objects.get(manifest.as_str()).ok_or(RepoError::NotFound)?;
        let mut dataset = dataset.clone();
        dataset.path = Some(manifest);
        Ok(dataset)
    }

    fn has(&self, path: &ContentPath) -> RepoResult<bool> {
        let objects = self.objects.read().map_err(lock_err)?;
        Ok(objects.contains_key(path.manifest().as_str()))
    }

    fn as_fetcher(&self) -> Option<&dyn Fetcher> {
        self.remote.as_ref().map(|_| self as &dyn Fetcher)
    }

    fn as_pinner(&self) -> Option<&dyn Pinner> {
        self.pins.as_ref().map(|_| self as &dyn Pinner)
    }
}

#[async_trait]
impl Fetcher for MemContentStore {
    async fn fetch(&self, _source: FetchSource, key: &ContentPath) -> RepoResult<Vec<u8>> {
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| RepoError::Fetch("store has no remote source".to_string()))?;
        let base = key.base_key();
        let (dataset, body) = {
            let remote = remote.read().map_err(lock_err)?;
            remote
                .get(base.as_str())
                .cloned()
                .ok_or_else(|| RepoError::Fetch(format!("no remote content at {base}")))?
        };
        let mut objects = self.objects.write().map_err(lock_err)?;
        objects.insert(base.manifest().as_str().to_string(), (dataset, body.clone()));
        Ok(body)
    }
}

impl Pinner for MemContentStore {
    fn pin(&self, path: &ContentPath, _recursive: bool) -> RepoResult<()> {
        let pins = self.pins.as_ref().ok_or(RepoError::NotPinner)?;
        let mut pins = pins.write().map_err(lock_err)?;
        pins.insert(path.base_key().as_str().to_string());
        Ok(())
    }

    fn unpin(&self, path: &ContentPath, _recursive: bool) -> RepoResult<()> {
        let pins = self.pins.as_ref().ok_or(RepoError::NotPinner)?;
        let mut pins = pins.write().map_err(lock_err)?;
        pins.remove(path.base_key().as_str());
        Ok(())
    }
}

/// An in-memory implementation of [`RefStore`], keyed by `peername/name`.
#[derive(Debug, Default)]
pub struct MemRefStore {
    refs: RwLock<BTreeMap<String, DatasetRef>>,
}

impl MemRefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for MemRefStore {
    fn put_ref(&self, r: &DatasetRef) -> RepoResult<()> {
        if r.peername.is_empty() || r.name.is_empty() {
            return Err(RepoError::Store(
                "ref requires both a peername and a name".to_string(),
            ));
        }
        // Store the pointer only; inline snapshots don't belong in the map.
        let mut stored = r.clone();
        stored.dataset = None;
        let mut refs = self.refs.write().map_err(lock_err)?;
        refs.insert(r.alias(), stored);
        Ok(())
    }

    fn get_ref(&self, partial: &DatasetRef) -> RepoResult<DatasetRef> {
        let refs = self.refs.read().map_err(lock_err)?;
        if !partial.peername.is_empty() && !partial.name.is_empty() {
            return refs.get(&partial.alias()).cloned().ok_or(RepoError::NotFound);
        }
        if partial.name.is_empty() {
            return Err(RepoError::NotFound);
        }
        let mut matches = refs.values().filter(|r| r.name == partial.name);
        match (matches.next(), matches.next()) {
            (Some(found), None) => Ok(found.clone()),
            (Some(_), Some(_)) => Err(RepoError::Conflict(partial.name.clone())),
            _ => Err(RepoError::NotFound),
        }
    }

    fn delete_ref(&self, r: &DatasetRef) -> RepoResult<()> {
        let mut refs = self.refs.write().map_err(lock_err)?;
        refs.remove(&r.alias()).map(|_| ()).ok_or(RepoError::NotFound)
    }

    fn references(&self, limit: usize, offset: usize) -> RepoResult<Vec<DatasetRef>> {
        let refs = self.refs.read().map_err(lock_err)?;
        Ok(refs.values().skip(offset).take(limit).cloned().collect())
    }
}

/// An in-memory implementation of [`EventLog`] with a snapshot accessor.
#[derive(Debug, Default)]
pub struct MemEventLog {
    events: RwLock<Vec<Event>>,
}

impl MemEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all appended events, in append order.
    pub fn events(&self) -> Vec<Event> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }

    /// Kinds only, in append order. Convenient for ordering assertions.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }
}

impl EventLog for MemEventLog {
    fn log_event(&self, kind: EventKind, r: &DatasetRef) -> RepoResult<()> {
        let mut events = self.events.write().map_err(lock_err)?;
        events.push(Event::now(kind, r.clone()));
        Ok(())
    }
}

/// An in-memory [`Repo`] wiring the backends above together.
pub struct MemRepo {
    profile: Option<Profile>,
    refs: MemRefStore,
    store: Option<MemContentStore>,
    registry: Option<Arc<dyn RegistryClient>>,
    events: MemEventLog,
}

impl MemRepo {
    /// A repo with a profile and a plain (capability-free) content store.
    pub fn new(profile: Profile) -> Self {
        Self {
            profile: Some(profile),
            refs: MemRefStore::new(),
            store: Some(MemContentStore::new()),
            registry: None,
            events: MemEventLog::new(),
        }
    }

    /// Replace the content store (e.g. with a pinning or fetching one).
    pub fn with_store(mut self, store: MemContentStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Drop the content store entirely.
    pub fn without_store(mut self) -> Self {
        self.store = None;
        self
    }

    /// Drop the active profile.
    pub fn without_profile(mut self) -> Self {
        self.profile = None;
        self
    }

    /// Attach a registry client.
    pub fn with_registry(mut self, registry: Arc<dyn RegistryClient>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Concrete content store accessor, for capability checks in tests.
    pub fn content_store(&self) -> Option<&MemContentStore> {
        self.store.as_ref()
    }

    /// Concrete event log accessor, for assertions in tests.
    pub fn event_log(&self) -> &MemEventLog {
        &self.events
    }
}

impl Repo for MemRepo {
    fn refs(&self) -> &dyn RefStore {
        &self.refs
    }

    fn store(&self) -> Option<&dyn ContentStore> {
        self.store.as_ref().map(|s| s as &dyn ContentStore)
    }

    fn registry(&self) -> Option<&dyn RegistryClient> {
        self.registry.as_deref()
    }

    fn events(&self) -> &dyn EventLog {
        &self.events
    }

    fn profile(&self) -> RepoResult<Profile> {
        self.profile.clone().ok_or(RepoError::NoProfile)
    }
}
