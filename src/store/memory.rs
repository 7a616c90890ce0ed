//! In-memory graph store

use super::traits::{namespace_key, GraphStore, StoreError, StoreResult};
use crate::graph::GraphModel;
use crate::schema::DataModelId;
use dashmap::DashMap;
use std::collections::BTreeMap;

/// In-memory graph store backed by a concurrent namespace map.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    namespaces: DashMap<String, BTreeMap<String, GraphModel>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored across all namespaces.
    pub fn record_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.len()).sum()
    }
}

impl GraphStore for MemoryGraphStore {
    fn write(&self, data_model: &DataModelId, model: &GraphModel) -> StoreResult<()> {
        self.namespaces
            .entry(namespace_key(data_model))
            .or_default()
            .insert(model.record_uri.clone(), model.clone());
        Ok(())
    }

    fn read(
        &self,
        data_model: &DataModelId,
        record_class_uri: &str,
        at_most: Option<usize>,
    ) -> StoreResult<BTreeMap<String, GraphModel>> {
        let namespace = namespace_key(data_model);

        let records: BTreeMap<String, GraphModel> = self
            .namespaces
            .get(&namespace)
            .map(|ns| {
                ns.iter()
                    .filter(|(_, model)| {
                        model.record_class_uri.as_deref() == Some(record_class_uri)
                    })
                    .take(at_most.unwrap_or(usize::MAX))
                    .map(|(uri, model)| (uri.clone(), model.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if records.is_empty() {
            return Err(StoreError::NotFound {
                namespace,
                record_class: record_class_uri.to_string(),
            });
        }

        Ok(records)
    }

    fn delete(&self, data_model: &DataModelId) -> StoreResult<bool> {
        Ok(self.namespaces.remove(&namespace_key(data_model)).is_some())
    }
}
