//! Registry client contract.
//!
//! A registry is a centralized discovery index layered over the peer
//! network. It is a secondary index, never authoritative: peers remain the
//! source of truth for their own datasets. This crate only defines the
//! client contract the engines consume; the registry's own search index is
//! someone else's problem.

pub mod client;
pub mod error;
pub mod memory;

pub use client::{RegistryClient, SearchParams, SearchResult};
pub use error::{RegistryError, RegistryResult};
pub use memory::MemRegistry;
