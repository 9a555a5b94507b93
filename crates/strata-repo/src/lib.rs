//! Repository contracts for Strata.
//!
//! A repo bundles the collaborators every engine works against: a
//! content-addressed [`ContentStore`] (with optional fetch and pin
//! capabilities), a mutable [`RefStore`] mapping `(peername, name)` to
//! content paths, an append-only [`EventLog`], the active profile, and an
//! optional registry client. Engines decorate a [`Repo`] rather than owning
//! any of these directly.

pub mod error;
pub mod eventlog;
pub mod memory;
pub mod refstore;
pub mod repo;
pub mod store;

pub use error::{RepoError, RepoResult};
pub use eventlog::EventLog;
pub use memory::{MemContentStore, MemEventLog, MemRefStore, MemRepo};
pub use refstore::RefStore;
pub use repo::{canonicalize_ref, Repo};
pub use store::{ContentStore, FetchSource, Fetcher, Pinner};
