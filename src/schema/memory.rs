//! In-memory schema store

use super::store::{ReconcileError, SchemaResult, SchemaStore};
use super::types::{Attribute, AttributePath, DataModel, DataModelId, RecordClass, Schema};
use chrono::Utc;
use dashmap::DashMap;

/// In-memory schema store backed by concurrent maps.
///
/// The entry API gives the same atomic insert-or-fetch semantics as the
/// SQLite store's unique indexes, so racing reconciliations of one data
/// model converge on a single entity per key.
#[derive(Debug, Default)]
pub struct MemorySchemaStore {
    attributes: DashMap<String, Attribute>,
    classes: DashMap<String, RecordClass>,
    paths: DashMap<String, AttributePath>,
    schemas: DashMap<String, Schema>,
    data_models: DashMap<String, DataModel>,
}

impl MemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct attributes ever created.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Number of distinct attribute paths ever created.
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }
}

impl SchemaStore for MemorySchemaStore {
    fn get_or_create_attribute(&self, uri: &str) -> SchemaResult<Attribute> {
        let attribute = self
            .attributes
            .entry(uri.to_string())
            .or_insert_with(|| Attribute::from_uri(uri))
            .clone();
        Ok(attribute)
    }

    fn get_or_create_class(&self, uri: &str) -> SchemaResult<RecordClass> {
        let class = self
            .classes
            .entry(uri.to_string())
            .or_insert_with(|| RecordClass::from_uri(uri))
            .clone();
        Ok(class)
    }

    fn get_or_create_attribute_path(&self, attributes: &[Attribute]) -> SchemaResult<AttributePath> {
        if attributes.is_empty() {
            return Err(ReconcileError::EmptyAttributePath);
        }

        let path = AttributePath::new(attributes.to_vec());
        let stored = self
            .paths
            .entry(path.path_key())
            .or_insert(path)
            .clone();
        Ok(stored)
    }

    fn load_schema(&self, data_model: &DataModelId) -> SchemaResult<Option<Schema>> {
        let schema_id = self
            .data_models
            .get(data_model.as_str())
            .and_then(|dm| dm.schema_id.clone());

        Ok(schema_id.and_then(|id| self.schemas.get(&id).map(|s| s.clone())))
    }

    fn save_schema(&self, data_model: &DataModelId, schema: &Schema) -> SchemaResult<()> {
        self.schemas
            .entry(schema.id.clone())
            .and_modify(|existing| {
                existing.name = schema.name.clone();
                existing.record_class = schema.record_class.clone();
                // membership only grows
                for path in &schema.attribute_paths {
                    existing.add_attribute_path(path.clone());
                }
            })
            .or_insert_with(|| schema.clone());

        self.data_models.insert(
            data_model.as_str().to_string(),
            DataModel {
                id: data_model.clone(),
                schema_id: Some(schema.id.clone()),
                updated_at: Some(Utc::now()),
            },
        );

        Ok(())
    }

    fn load_data_model(&self, data_model: &DataModelId) -> SchemaResult<Option<DataModel>> {
        Ok(self.data_models.get(data_model.as_str()).map(|dm| dm.clone()))
    }
}
