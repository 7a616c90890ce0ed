//! The graph produced for exactly one source record

use super::resource::Resource;
use super::statement::Statement;
use serde::{Deserialize, Serialize};

/// An ordered set of resources encoded from a single source record.
///
/// Carries the record's root identifier and, once known, the record-class
/// URI used for the root's rdf:type statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphModel {
    /// Absolute identifier of the record root. Never relative, never empty.
    pub record_uri: String,
    /// Record-class URI, once determined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_class_uri: Option<String>,
    /// Resources in encoding order; the root comes first.
    pub resources: Vec<Resource>,
}

impl GraphModel {
    /// Create an empty model for a record root URI.
    pub fn new(record_uri: impl Into<String>) -> Self {
        Self {
            record_uri: record_uri.into(),
            record_class_uri: None,
            resources: Vec::new(),
        }
    }

    /// Look up a resource by its subject key.
    pub fn resource(&self, subject_key: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|r| r.subject_key().as_deref() == Some(subject_key))
    }

    /// The record root's resource.
    pub fn root(&self) -> Option<&Resource> {
        self.resource(&self.record_uri)
    }

    /// All statements of the model, in resource order.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.resources.iter().flat_map(|r| r.statements.iter())
    }

    /// Total number of statements across all resources.
    pub fn statement_count(&self) -> usize {
        self.resources.iter().map(|r| r.statements.len()).sum()
    }
}
