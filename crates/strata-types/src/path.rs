use std::fmt;

use serde::{Deserialize, Serialize};

/// File name of the dataset manifest inside a stored package.
///
/// A full content path for a dataset version points at this file; the path
/// with the suffix stripped is the package's base key, which is what gets
/// fetched and pinned as a unit.
pub const MANIFEST_FILE: &str = "dataset.json";

/// An immutable content-addressed path issued by a content store.
///
/// The same content always yields the same path, so a path uniquely and
/// permanently identifies one dataset version. The root sentinel `/` marks
/// "no predecessor" in a dataset's `previous_path`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentPath(String);

impl ContentPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The root sentinel, used as a "no previous version" marker.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// The package base key: this path with a trailing manifest file name
    /// removed, if present.
    pub fn base_key(&self) -> ContentPath {
        let suffix = format!("/{MANIFEST_FILE}");
        match self.0.strip_suffix(&suffix) {
            Some(base) => ContentPath(base.to_string()),
            None => self.clone(),
        }
    }

    /// The manifest path for this package: base key plus the manifest file.
    pub fn manifest(&self) -> ContentPath {
        ContentPath(format!("{}/{MANIFEST_FILE}", self.base_key().0))
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContentPath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
