//! The dataset document model.
//!
//! A dataset is a bundle of components: a commit (authorship + message),
//! descriptive metadata, a structure (format + schema), and an optional
//! transform declaration. Components merge field-by-field with `assign`,
//! where only explicitly set fields of the argument overwrite the receiver.
//! This is what lets user-supplied fields win over transform output: capture
//! the user's fields in an overlay before the transform runs, then assign
//! the overlay back afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;
use crate::path::ContentPath;

/// Identity stamp on a commit, set from the active profile at create time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
}

/// Versioning information for one dataset snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Commit {
    /// Copy set fields of `other` over this commit.
    pub fn assign(&mut self, other: &Commit) {
        if other.author.is_some() {
            self.author = other.author.clone();
        }
        if !other.title.is_empty() {
            self.title = other.title.clone();
        }
        if !other.message.is_empty() {
            self.message = other.message.clone();
        }
        if other.timestamp.is_some() {
            self.timestamp = other.timestamp;
        }
    }
}

/// Human-facing descriptive metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl Meta {
    pub fn assign(&mut self, other: &Meta) {
        if !other.title.is_empty() {
            self.title = other.title.clone();
        }
        if !other.description.is_empty() {
            self.description = other.description.clone();
        }
        if !other.keywords.is_empty() {
            self.keywords = other.keywords.clone();
        }
    }
}

/// Shape of the dataset body: serialization format plus an open-ended
/// schema document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Map<String, Value>>,
}

impl Structure {
    pub fn assign(&mut self, other: &Structure) {
        if !other.format.is_empty() {
            self.format = other.format.clone();
        }
        if other.schema.is_some() {
            self.schema = other.schema.clone();
        }
    }

    /// Replace the schema with an empty object.
    ///
    /// The legacy RPC transport cannot faithfully serialize arbitrarily
    /// nested open-ended maps, so the schema is dropped for that transport.
    pub fn clear_schema(&mut self) {
        if self.schema.is_some() {
            self.schema = Some(Map::new());
        }
    }
}

/// Declaration of a transform script to run at create time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub script: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub config: Map<String, Value>,
}

impl Transform {
    pub fn assign(&mut self, other: &Transform) {
        if !other.script.is_empty() {
            self.script = other.script.clone();
        }
        if !other.config.is_empty() {
            self.config = other.config.clone();
        }
    }
}

/// One immutable dataset version.
///
/// `previous_path` links a new version to its predecessor. It is consumed
/// exactly once at create time, to retire the superseded ref, and never
/// re-derived afterwards. The root sentinel `/` means "no predecessor".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<Commit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<Structure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<ContentPath>,
    /// Set when loading from a store; not part of the addressed content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<ContentPath>,
}

impl Dataset {
    /// An overlay skeleton with every component pre-initialized, so a
    /// field-by-field merge never needs to allocate a missing component.
    pub fn skeleton() -> Self {
        Self {
            commit: Some(Commit::default()),
            meta: Some(Meta::default()),
            structure: Some(Structure::default()),
            transform: Some(Transform::default()),
            previous_path: None,
            path: None,
        }
    }

    /// Copy set components and fields of `other` over this dataset.
    ///
    /// Present components merge field-by-field; absent components are left
    /// untouched. An all-default component in `other` is a no-op.
    pub fn assign(&mut self, other: &Dataset) {
        if let Some(theirs) = &other.commit {
            match &mut self.commit {
                Some(ours) => ours.assign(theirs),
                None => self.commit = Some(theirs.clone()),
            }
        }
        if let Some(theirs) = &other.meta {
            match &mut self.meta {
                Some(ours) => ours.assign(theirs),
                None => self.meta = Some(theirs.clone()),
            }
        }
        if let Some(theirs) = &other.structure {
            match &mut self.structure {
                Some(ours) => ours.assign(theirs),
                None => self.structure = Some(theirs.clone()),
            }
        }
        if let Some(theirs) = &other.transform {
            match &mut self.transform {
                Some(ours) => ours.assign(theirs),
                None => self.transform = Some(theirs.clone()),
            }
        }
        if other.previous_path.is_some() {
            self.previous_path = other.previous_path.clone();
        }
        if other.path.is_some() {
            self.path = other.path.clone();
        }
    }

    /// Encode this dataset as a JSON value, the form attached to refs and
    /// sent to registries.
    pub fn encode(&self) -> Result<Value, TypeError> {
        serde_json::to_value(self).map_err(|e| TypeError::Encode(e.to_string()))
    }
}
