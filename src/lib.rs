//! Weft: record-to-graph encoding with schema inference
//!
//! Converts heterogeneous source records — delivered as a flat event
//! stream by format decoders — into canonical, uniquely identified
//! property graphs, while inferring a persistent schema (record class +
//! attribute paths) describing each source's shape. Encoded graphs are
//! stored under a namespace keyed by the logical data model, so records
//! can later be retrieved by class or removed wholesale.
//!
//! # Core Concepts
//!
//! - **Events**: the record protocol (record/entity boundaries, literals)
//!   decoders emit, one source record at a time
//! - **Graph models**: one per record — resources, ordered statements,
//!   minted absolute identifiers
//! - **Schemas**: the growing set of attribute paths observed for a data
//!   model, reconciled idempotently after every run
//!
//! # Example
//!
//! ```
//! use weft::{DataModelId, Event, IngestPipeline, MemoryGraphStore, MemorySchemaStore};
//!
//! let graphs = MemoryGraphStore::new();
//! let schemas = MemorySchemaStore::new();
//! let pipeline = IngestPipeline::new(&graphs, &schemas).with_base_uri("http://x/");
//!
//! let report = pipeline
//!     .ingest(
//!         &DataModelId::from("dm-1"),
//!         vec![
//!             Event::start_record("42"),
//!             Event::literal("title", "Hello"),
//!             Event::EndRecord,
//!         ],
//!     )
//!     .unwrap();
//!
//! assert_eq!(report.records, 1);
//! ```

pub mod encoder;
mod graph;
pub mod ingest;
pub mod mint;
pub mod schema;
pub mod store;

pub use encoder::{EncoderConfig, EncoderSession, EncodingError, Event, GraphEncoder};
pub use graph::{GraphModel, Node, Predicate, Resource, Statement};
pub use ingest::{IngestError, IngestPipeline, IngestReport};
pub use schema::{
    Attribute, AttributePath, AttributePathShape, DataModel, DataModelId, MemorySchemaStore,
    ReconcileError, RecordClass, Schema, SchemaReconciler, SchemaResult, SchemaStore,
    SqliteSchemaStore,
};
pub use store::{
    GraphStore, MemoryGraphStore, OpenStore, SqliteGraphStore, StoreError, StoreResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
