//! Node and predicate representation in the graph data model

use serde::{Deserialize, Serialize};

/// A node of the graph data model.
///
/// Nodes are immutable once constructed and compare by variant and payload,
/// never by allocation identity. Resources carry an absolute URI, blank
/// nodes a run-local numeric id, literals a value with an optional datatype.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    /// A resource identified by an absolute URI.
    Resource { uri: String },
    /// An anonymous node; the id is only meaningful within one run.
    Blank { id: u64 },
    /// A literal value.
    Literal {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
    },
}

impl Node {
    /// Create a resource node.
    pub fn resource(uri: impl Into<String>) -> Self {
        Node::Resource { uri: uri.into() }
    }

    /// Create a blank node with a run-local id.
    pub fn blank(id: u64) -> Self {
        Node::Blank { id }
    }

    /// Create a plain literal node.
    pub fn literal(value: impl Into<String>) -> Self {
        Node::Literal {
            value: value.into(),
            datatype: None,
        }
    }

    /// Create a literal node with a datatype URI.
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Node::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
        }
    }

    /// The URI, if this is a resource node.
    pub fn uri(&self) -> Option<&str> {
        match self {
            Node::Resource { uri } => Some(uri),
            _ => None,
        }
    }

    /// The literal value, if this is a literal node.
    pub fn literal_value(&self) -> Option<&str> {
        match self {
            Node::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Whether this node can stand as a statement subject.
    pub fn is_subject(&self) -> bool {
        !matches!(self, Node::Literal { .. })
    }

    /// Stable key grouping statements by subject: the URI for resources,
    /// `_:<id>` for blank nodes. Literals have no subject key.
    pub fn subject_key(&self) -> Option<String> {
        match self {
            Node::Resource { uri } => Some(uri.clone()),
            Node::Blank { id } => Some(format!("_:{}", id)),
            Node::Literal { .. } => None,
        }
    }
}

/// A resolved, absolute identifier for a relation name.
///
/// Predicates are interned per encoding run: the encoder session hands out
/// one value per resolved URI, so repeated field names compare cheaply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predicate(String);

impl Predicate {
    /// Wrap a resolved absolute URI.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The predicate URI.
    pub fn uri(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
