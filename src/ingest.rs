//! Ingestion run driver
//!
//! Single entry point for one ingestion run: drives the encoder over the
//! event stream, writes every completed model to the graph store, and
//! reconciles the observed shapes into the data model's schema afterwards.
//! Graph and schema persistence are keyed by the same data-model id.

use crate::encoder::{EncoderConfig, EncodingError, Event, GraphEncoder};
use crate::schema::{DataModelId, ReconcileError, Schema, SchemaReconciler, SchemaStore};
use crate::store::{GraphStore, StoreError};
use thiserror::Error;
use tracing::debug;

/// Errors of an ingestion run.
///
/// All propagate to the caller unmodified; the pipeline performs no
/// retries. An encoding error ends the run — callers wanting per-record
/// continuation drive a [`GraphEncoder`] themselves.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("schema reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("graph store failed: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of one ingestion run.
#[derive(Debug)]
pub struct IngestReport {
    /// Number of records written to the graph store.
    pub records: usize,
    /// The reconciled schema; `None` when the stream held no records.
    pub schema: Option<Schema>,
}

/// Drives encoder, graph store and schema reconciliation for one source.
pub struct IngestPipeline<'a, G: GraphStore, S: SchemaStore> {
    graph_store: &'a G,
    schema_store: &'a S,
    base_uri: Option<String>,
}

impl<'a, G: GraphStore, S: SchemaStore> IngestPipeline<'a, G, S> {
    pub fn new(graph_store: &'a G, schema_store: &'a S) -> Self {
        Self {
            graph_store,
            schema_store,
            base_uri: None,
        }
    }

    /// Override the base namespace for minted identifiers.
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Ingest one event stream into the given data model.
    ///
    /// Each completed record is written to the graph store as it closes;
    /// the schema is reconciled once, after the stream ends.
    pub fn ingest(
        &self,
        data_model: &DataModelId,
        events: impl IntoIterator<Item = Event>,
    ) -> Result<IngestReport, IngestError> {
        let mut config = EncoderConfig::new().with_data_model(data_model.clone());
        if let Some(base_uri) = &self.base_uri {
            config = config.with_base_uri(base_uri.clone());
        }

        let mut encoder = GraphEncoder::with_config(config);
        let mut records = 0usize;
        let mut record_class: Option<String> = None;

        for event in events {
            if let Some(model) = encoder.push(event)? {
                // the first record settles the class used for reconciliation
                if record_class.is_none() {
                    record_class = model.record_class_uri.clone();
                }
                self.graph_store.write(data_model, &model)?;
                records += 1;
            }
        }

        let session = encoder.into_session();
        let record_class =
            record_class.or_else(|| session.record_class_uri().map(str::to_string));

        let schema = match record_class {
            Some(class) => {
                let reconciler = SchemaReconciler::new(self.schema_store);
                Some(reconciler.reconcile(data_model, &class, session.attribute_paths())?)
            }
            None => None,
        };

        debug!(data_model = %data_model, records, "ingestion run complete");

        Ok(IngestReport { records, schema })
    }
}
