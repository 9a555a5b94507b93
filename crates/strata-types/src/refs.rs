use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::path::ContentPath;
use crate::profile::ProfileId;

/// A named, mutable pointer to an immutable dataset version.
///
/// `(peername, name)` is the only mutable pointer a peer maintains; at most
/// one live ref exists per pair in a given ref store. `path` immutably
/// identifies the content it currently points at. A ref may carry an inline
/// dataset snapshot when it travels over the wire or back to a caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<ProfileId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub peername: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<ContentPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<Dataset>,
}

impl DatasetRef {
    /// A fully specified ref with no inline dataset.
    pub fn new(
        profile_id: ProfileId,
        peername: impl Into<String>,
        name: impl Into<String>,
        path: ContentPath,
    ) -> Self {
        Self {
            profile_id: Some(profile_id),
            peername: peername.into(),
            name: name.into(),
            path: Some(path),
            dataset: None,
        }
    }

    /// A partial ref carrying only `peername/name`, to be canonicalized
    /// against a ref store.
    pub fn partial(peername: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            peername: peername.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.peername.is_empty() && self.name.is_empty() && self.path.is_none()
    }

    /// Whether this ref still needs canonicalization to learn its path.
    pub fn needs_resolution(&self) -> bool {
        self.path.as_ref().map_or(true, |p| p.is_empty())
    }

    /// The `peername/name` alias for this ref.
    pub fn alias(&self) -> String {
        format!("{}/{}", self.peername, self.name)
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) if !path.is_empty() => write!(f, "{}@{path}", self.alias()),
            _ => write!(f, "{}", self.alias()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_and_without_path() {
        let mut r = DatasetRef::partial("nora", "schools");
        assert_eq!(r.to_string(), "nora/schools");
        r.path = Some(ContentPath::new("/mem/abc"));
        assert_eq!(r.to_string(), "nora/schools@/mem/abc");
    }

    #[test]
    fn partial_refs_need_resolution() {
        let r = DatasetRef::partial("nora", "schools");
        assert!(r.needs_resolution());
        let full = DatasetRef::new(
            ProfileId::from_raw([1u8; 32]),
            "nora",
            "schools",
            ContentPath::new("/mem/abc"),
        );
        assert!(!full.needs_resolution());
    }

    #[test]
    fn empty_ref() {
        assert!(DatasetRef::default().is_empty());
        assert!(!DatasetRef::partial("a", "b").is_empty());
    }
}
