//! Schema persistence boundary

use super::types::{Attribute, AttributePath, DataModel, DataModelId, RecordClass, Schema};
use thiserror::Error;

/// Errors raised while reconciling or persisting schema entities.
///
/// Any failure aborts the whole reconciliation batch; no partial schema
/// update becomes visible.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("attribute path must contain at least one attribute")]
    EmptyAttributePath,
}

/// Result type for schema persistence operations.
pub type SchemaResult<T> = Result<T, ReconcileError>;

/// Persistence contract for schema entities.
///
/// Every `get_or_create_*` is an atomic insert-or-fetch against a unique
/// key: when two reconciliations of the same data model race, one writer
/// wins and the other adopts the winner's entity instead of erroring.
/// Implementations must be thread-safe (Send + Sync).
pub trait SchemaStore: Send + Sync {
    /// Fetch or create the attribute with this URI. A created attribute's
    /// name is derived from the URI's last segment.
    fn get_or_create_attribute(&self, uri: &str) -> SchemaResult<Attribute>;

    /// Fetch or create the record class with this URI.
    fn get_or_create_class(&self, uri: &str) -> SchemaResult<RecordClass>;

    /// Fetch or create the path for this ordered attribute sequence.
    fn get_or_create_attribute_path(&self, attributes: &[Attribute]) -> SchemaResult<AttributePath>;

    /// Load the schema associated with a data model, if any.
    fn load_schema(&self, data_model: &DataModelId) -> SchemaResult<Option<Schema>>;

    /// Persist a schema and its association with the data model in one
    /// transaction. Path membership never shrinks: rows absent from
    /// `schema` but already persisted stay untouched.
    fn save_schema(&self, data_model: &DataModelId, schema: &Schema) -> SchemaResult<()>;

    /// Load the data-model bookkeeping row, if any.
    fn load_data_model(&self, data_model: &DataModelId) -> SchemaResult<Option<DataModel>>;
}
