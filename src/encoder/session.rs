//! Run-scoped encoder state
//!
//! The session owns every cache that outlives a single record: interned
//! predicates, resolved term URIs, the run's record class, the blank-node
//! counter, and the accumulated attribute-path set. It is an explicit
//! value owned by the run driver — one session per ingestion run, never
//! shared across concurrent runs.

use crate::graph::Predicate;
use crate::mint;
use crate::schema::{AttributePathShape, DataModelId};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Local name the provisional record class is minted from.
const RECORD_TYPE_NAME: &str = "RecordType";

/// Namespace configuration for one encoding run.
///
/// An explicitly supplied base namespace is used verbatim for term
/// minting; without one, a data-model run mints terms under the data
/// model's schema namespace, and a bare run under the crate default.
#[derive(Debug, Clone, Default)]
pub struct EncoderConfig {
    base_uri: Option<String>,
    data_model: Option<DataModelId>,
}

impl EncoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base namespace for minted identifiers.
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Scope the run to a data model (record URIs, schema namespace).
    pub fn with_data_model(mut self, data_model: DataModelId) -> Self {
        self.data_model = Some(data_model);
        self
    }

    pub fn data_model(&self) -> Option<&DataModelId> {
        self.data_model.as_ref()
    }

    /// Namespace for minted record URIs.
    pub(crate) fn record_base(&self) -> &str {
        self.base_uri.as_deref().unwrap_or(mint::DEFAULT_BASE_URI)
    }

    /// Namespace for minted term URIs.
    pub(crate) fn term_base(&self) -> String {
        match (&self.base_uri, &self.data_model) {
            (Some(base), _) => base.clone(),
            (None, Some(dm)) => mint::data_model_schema_uri(dm, mint::DEFAULT_BASE_URI),
            (None, None) => mint::DEFAULT_BASE_URI.to_string(),
        }
    }
}

/// Per-run caches and observations, reused across all records of a run.
pub struct EncoderSession {
    config: EncoderConfig,
    /// resolved predicate URI → interned predicate
    predicates: HashMap<String, Predicate>,
    /// raw term name → resolved URI
    term_uris: HashMap<String, String>,
    /// record class shared by all records of the run, seeded on first use
    record_class: Option<String>,
    /// run-scoped blank-node counter; never reset between records
    next_blank_id: u64,
    attribute_paths: BTreeSet<AttributePathShape>,
}

impl EncoderSession {
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            predicates: HashMap::new(),
            term_uris: HashMap::new(),
            record_class: None,
            next_blank_id: 0,
            attribute_paths: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Resolve a raw term name to its URI, minting one if the name is not
    /// already absolute. Resolutions are cached for the run.
    pub(crate) fn resolve_term(&mut self, name: &str) -> String {
        if let Some(uri) = self.term_uris.get(name) {
            return uri.clone();
        }

        let uri = if mint::is_absolute_uri(name) {
            name.to_string()
        } else {
            let minted = mint::mint_term_uri(name, &self.config.term_base());
            debug!(name, uri = %minted, "minted term uri for non-absolute name");
            minted
        };

        self.term_uris.insert(name.to_string(), uri.clone());
        uri
    }

    /// The interned predicate for a raw term name.
    pub(crate) fn predicate(&mut self, name: &str) -> Predicate {
        let uri = self.resolve_term(name);
        self.predicates
            .entry(uri.clone())
            .or_insert_with(|| Predicate::new(uri))
            .clone()
    }

    /// The run's record class URI, seeded on first use.
    pub(crate) fn record_class(&mut self) -> String {
        if let Some(class) = &self.record_class {
            return class.clone();
        }

        let uri = mint::mint_term_uri(RECORD_TYPE_NAME, &self.config.term_base());
        self.record_class = Some(uri.clone());
        uri
    }

    /// The record class, if any record has been started yet.
    pub fn record_class_uri(&self) -> Option<&str> {
        self.record_class.as_deref()
    }

    pub(crate) fn next_blank_id(&mut self) -> u64 {
        self.next_blank_id += 1;
        self.next_blank_id
    }

    /// Record one observed root-to-current predicate path.
    pub(crate) fn add_attribute_path(&mut self, segments: &[String]) {
        if let Some(shape) = AttributePathShape::new(segments.to_vec()) {
            self.attribute_paths.insert(shape);
        }
    }

    /// Every distinct attribute path observed so far in this run.
    pub fn attribute_paths(&self) -> &BTreeSet<AttributePathShape> {
        &self.attribute_paths
    }

    /// Consume the session, yielding the observed paths.
    pub fn into_attribute_paths(self) -> BTreeSet<AttributePathShape> {
        self.attribute_paths
    }
}
