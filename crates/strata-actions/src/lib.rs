//! Engines for the dataset lifecycle.
//!
//! [`DatasetActions`] decorates a repo with create/add/read/rename/pin/
//! unpin/delete, keeping the name→path ref mapping consistent with the
//! content store and the event log. [`RegistryActions`] adds the
//! permission-gated publish/unpublish cascade to a registry, and
//! [`SearchRequests`] fronts the registry's search index. None of these
//! hold locks: concurrent mutations of the same `(peername, name)` must be
//! serialized by the caller.

pub mod dataset;
pub mod error;
pub mod registry;
pub mod search;
pub mod transform;

pub use dataset::DatasetActions;
pub use error::{ActionError, ActionResult};
pub use registry::RegistryActions;
pub use search::{SearchRequests, SearchService};
pub use transform::{TransformEngine, TransformError};
