//! Graph store trait definitions

use crate::graph::GraphModel;
use crate::mint;
use crate::schema::DataModelId;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during graph store operations.
///
/// "Not found" is a distinguishable outcome of `read`, not a generic
/// failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no stored records for namespace '{namespace}' and class '{record_class}'")]
    NotFound {
        namespace: String,
        record_class: String,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for graph store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Namespace key under which a data model's graphs are stored.
pub fn namespace_key(data_model: &DataModelId) -> String {
    mint::data_model_graph_uri(data_model, mint::DEFAULT_BASE_URI)
}

/// Trait for graph storage backends.
///
/// Implementations must be thread-safe (Send + Sync). Operations are
/// synchronous and fail fast: no retries, no backoff, no timeouts —
/// callers needing resilience wrap them.
pub trait GraphStore: Send + Sync {
    /// Store one record's model under the data model's namespace.
    ///
    /// Append semantics: a previous version of the same record is
    /// replaced, records already stored for the namespace are preserved.
    fn write(&self, data_model: &DataModelId, model: &GraphModel) -> StoreResult<()>;

    /// All stored records of the given class, keyed by record URI,
    /// optionally capped to the first `at_most` in store-defined order.
    ///
    /// Fails with [`StoreError::NotFound`] when the namespace is absent or
    /// holds no record of the class.
    fn read(
        &self,
        data_model: &DataModelId,
        record_class_uri: &str,
        at_most: Option<usize>,
    ) -> StoreResult<BTreeMap<String, GraphModel>>;

    /// Remove the whole namespace. Returns whether anything was removed.
    fn delete(&self, data_model: &DataModelId) -> StoreResult<bool>;
}

/// Extension trait for opening stores from paths.
pub trait OpenStore: GraphStore + Sized {
    /// Open or create a store at the given path.
    fn open(path: impl AsRef<Path>) -> StoreResult<Self>;

    /// Create an in-memory store (useful for testing).
    fn open_in_memory() -> StoreResult<Self>;
}
