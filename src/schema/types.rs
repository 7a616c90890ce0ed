//! Schema model types
//!
//! Attributes, classes and attribute paths are global, reusable entities
//! keyed by URI (or, for paths, by the ordered URI sequence); schemas and
//! data models reference them.

use crate::mint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Joins attribute URIs into a path identity key. The unit separator can't
/// occur in a URI, so the concatenation is unambiguous.
const PATH_KEY_SEPARATOR: char = '\u{1f}';

/// Identifier of a logical data model.
///
/// Serializes as a plain string; callers choose the format (UUID or a
/// semantic id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataModelId(String);

impl DataModelId {
    /// Create a new random id (UUID-based).
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DataModelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DataModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DataModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DataModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A named attribute, identified by its URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub uri: String,
    pub name: String,
}

impl Attribute {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
        }
    }

    /// Build an attribute whose name is derived from the URI's last segment.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let name = mint::last_uri_segment(&uri).to_string();
        Self { uri, name }
    }
}

/// An ordered, non-empty sequence of attributes: one root-to-leaf
/// traversal of a record's shape. Identity is the ordered URI sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePath {
    pub attributes: Vec<Attribute>,
}

impl AttributePath {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    /// The order-sensitive identity key of this path.
    pub fn path_key(&self) -> String {
        join_path_key(self.attributes.iter().map(|a| a.uri.as_str()))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// A candidate path shape observed while encoding: the ordered attribute
/// URIs of one traversal, before any attribute entity exists for them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttributePathShape(Vec<String>);

impl AttributePathShape {
    /// Build a shape from ordered attribute URIs; `None` if the sequence
    /// is empty.
    pub fn new(segments: Vec<String>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self(segments))
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Identity key matching [`AttributePath::path_key`] for the same URIs.
    pub fn path_key(&self) -> String {
        join_path_key(self.0.iter().map(String::as_str))
    }
}

fn join_path_key<'a>(uris: impl Iterator<Item = &'a str>) -> String {
    let mut key = String::new();
    for (i, uri) in uris.enumerate() {
        if i > 0 {
            key.push(PATH_KEY_SEPARATOR);
        }
        key.push_str(uri);
    }
    key
}

/// The type assigned to the root node of every record of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordClass {
    pub uri: String,
    pub name: String,
}

impl RecordClass {
    pub fn new(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
        }
    }

    /// Build a class whose name is derived from the URI's last segment.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let name = mint::last_uri_segment(&uri).to_string();
        Self { uri, name }
    }
}

/// A record class plus the set of unique attribute paths describing one
/// data model's records. The path set only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub id: String,
    pub name: Option<String>,
    pub record_class: Option<RecordClass>,
    /// Unique paths in insertion order.
    pub attribute_paths: Vec<AttributePath>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Schema {
    /// Create an empty schema with a fresh id.
    pub fn new() -> Self {
        Self {
            id: format!("Schema-{}", Uuid::new_v4()),
            name: None,
            record_class: None,
            attribute_paths: Vec::new(),
            created_at: Some(Utc::now()),
        }
    }

    /// Whether a path with this identity key is already part of the schema.
    pub fn contains_path(&self, path_key: &str) -> bool {
        self.attribute_paths.iter().any(|p| p.path_key() == path_key)
    }

    /// Add a path if absent. Returns whether the schema changed.
    pub fn add_attribute_path(&mut self, path: AttributePath) -> bool {
        if self.contains_path(&path.path_key()) {
            return false;
        }
        self.attribute_paths.push(path);
        true
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// Associates one ingested source with its inferred schema. The id doubles
/// as the namespace key for the stored graphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataModel {
    pub id: DataModelId,
    pub schema_id: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DataModel {
    pub fn new(id: DataModelId) -> Self {
        Self {
            id,
            schema_id: None,
            updated_at: None,
        }
    }
}
