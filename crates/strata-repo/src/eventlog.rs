use strata_types::{DatasetRef, EventKind};

use crate::error::RepoResult;

/// Append-only record of dataset lifecycle events.
///
/// Appends are atomic per call but not transactionally tied to the store
/// mutation that preceded them: a crash between "ref updated" and "event
/// appended" leaves the log incomplete relative to state. Accepted and
/// documented, not hidden.
pub trait EventLog: Send + Sync {
    /// Append an event for `r`, stamped with the current time.
    fn log_event(&self, kind: EventKind, r: &DatasetRef) -> RepoResult<()>;
}
