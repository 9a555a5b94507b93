//! Core types for Strata.
//!
//! A dataset is an immutable, content-addressed document; a [`DatasetRef`]
//! is the mutable `(peername, name)` pointer a peer maintains to its
//! current version. Profiles identify peers, and lifecycle [`Event`]s record
//! what happened to each ref over time.

pub mod dataset;
pub mod error;
pub mod event;
pub mod path;
pub mod profile;
pub mod refs;

pub use dataset::{Author, Commit, Dataset, Meta, Structure, Transform};
pub use error::TypeError;
pub use event::{Event, EventKind};
pub use path::ContentPath;
pub use profile::{Profile, ProfileId};
pub use refs::DatasetRef;
