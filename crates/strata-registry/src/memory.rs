//! In-memory registry for tests and ephemeral use.
//!
//! [`MemRegistry`] records every call and can be primed to fail deletes,
//! which is how the engines' best-effort registry cascade gets exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use strata_crypto::VerifyingKey;

use crate::client::{RegistryClient, SearchParams, SearchResult};
use crate::error::{RegistryError, RegistryResult};

/// An in-memory implementation of [`RegistryClient`].
#[derive(Debug, Default)]
pub struct MemRegistry {
    entries: RwLock<HashMap<String, Value>>,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    fail_deletes: AtomicBool,
}

impl MemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent delete fail, to exercise best-effort paths.
    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, peername: &str, name: &str) -> bool {
        self.entries
            .read()
            .map(|e| e.contains_key(&key(peername, name)))
            .unwrap_or(false)
    }

    fn lock_err<T>(e: std::sync::PoisonError<T>) -> RegistryError {
        RegistryError::Unreachable(format!("lock poisoned: {e}"))
    }
}

fn key(peername: &str, name: &str) -> String {
    format!("{peername}/{name}")
}

#[async_trait]
impl RegistryClient for MemRegistry {
    async fn search(&self, params: &SearchParams) -> RegistryResult<Vec<SearchResult>> {
        let entries = self.entries.read().map_err(Self::lock_err)?;
        let mut ids: Vec<&String> = entries
            .keys()
            .filter(|k| k.contains(&params.query))
            .collect();
        ids.sort();
        let results = ids
            .into_iter()
            .skip(params.offset)
            .take(if params.limit == 0 {
                usize::MAX
            } else {
                params.limit
            })
            .map(|id| SearchResult {
                kind: "dataset".to_string(),
                id: id.clone(),
                value: entries[id].clone(),
            })
            .collect();
        Ok(results)
    }

    async fn put_dataset(
        &self,
        peername: &str,
        name: &str,
        dataset: &Value,
        _pubkey: &VerifyingKey,
    ) -> RegistryResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.write().map_err(Self::lock_err)?;
        entries.insert(key(peername, name), dataset.clone());
        Ok(())
    }

    async fn delete_dataset(
        &self,
        peername: &str,
        name: &str,
        _dataset: &Value,
        _pubkey: &VerifyingKey,
    ) -> RegistryResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(RegistryError::Unreachable("primed to fail".to_string()));
        }
        let mut entries = self.entries.write().map_err(Self::lock_err)?;
        if entries.remove(&key(peername, name)).is_none() {
            return Err(RegistryError::NotFound {
                peername: peername.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
