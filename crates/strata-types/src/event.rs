use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::refs::DatasetRef;

/// Classification of dataset lifecycle events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Created,
    Renamed,
    Pinned,
    Unpinned,
    Deleted,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "Created",
            Self::Renamed => "Renamed",
            Self::Pinned => "Pinned",
            Self::Unpinned => "Unpinned",
            Self::Deleted => "Deleted",
        };
        write!(f, "{s}")
    }
}

/// One entry in the append-only lifecycle log.
///
/// Events are never mutated or deleted once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub r#ref: DatasetRef,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Build an event stamped with the current time.
    pub fn now(kind: EventKind, r#ref: DatasetRef) -> Self {
        Self {
            kind,
            r#ref,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(EventKind::Created.to_string(), "Created");
        assert_eq!(EventKind::Deleted.to_string(), "Deleted");
    }

    #[test]
    fn event_carries_ref() {
        let e = Event::now(EventKind::Pinned, DatasetRef::partial("nora", "schools"));
        assert_eq!(e.r#ref.alias(), "nora/schools");
        assert_eq!(e.kind, EventKind::Pinned);
    }
}
