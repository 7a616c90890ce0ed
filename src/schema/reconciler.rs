//! Schema reconciliation
//!
//! Merges the attribute paths and record class observed during one
//! encoding run into the data model's persisted schema. Reconciliation is
//! idempotent: re-running with identical inputs creates no new entities
//! and the schema's path set only ever grows.

use super::store::{SchemaResult, SchemaStore};
use super::types::{AttributePathShape, DataModelId, Schema};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Merges observed record shapes into persisted schemas.
pub struct SchemaReconciler<'a, S: SchemaStore> {
    store: &'a S,
}

impl<'a, S: SchemaStore> SchemaReconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Reconcile one run's observations into the data model's schema.
    ///
    /// Loads the schema (creating an empty one on first contact), settles
    /// the record class, adds every path shape not yet present, and
    /// persists schema and data-model association together. Any store
    /// failure aborts the whole batch before `save_schema` runs, so no
    /// partial schema mutation becomes visible.
    pub fn reconcile(
        &self,
        data_model: &DataModelId,
        record_class_uri: &str,
        shapes: &BTreeSet<AttributePathShape>,
    ) -> SchemaResult<Schema> {
        let mut schema = match self.store.load_schema(data_model)? {
            Some(schema) => schema,
            None => {
                debug!(data_model = %data_model, "creating schema on first contact");
                Schema::new()
            }
        };

        match &schema.record_class {
            Some(existing) if existing.uri != record_class_uri => {
                // an established schema keeps its class; conflicting
                // records never rewrite it
                warn!(
                    data_model = %data_model,
                    established = %existing.uri,
                    observed = record_class_uri,
                    "record class mismatch, keeping established class"
                );
            }
            Some(_) => {}
            None => {
                schema.record_class = Some(self.store.get_or_create_class(record_class_uri)?);
            }
        }

        let mut added = 0usize;
        for shape in shapes {
            if schema.contains_path(&shape.path_key()) {
                continue;
            }

            let mut attributes = Vec::with_capacity(shape.segments().len());
            for uri in shape.segments() {
                attributes.push(self.store.get_or_create_attribute(uri)?);
            }

            let path = self.store.get_or_create_attribute_path(&attributes)?;
            if schema.add_attribute_path(path) {
                added += 1;
            }
        }

        self.store.save_schema(data_model, &schema)?;

        debug!(
            data_model = %data_model,
            schema = %schema.id,
            added,
            total = schema.attribute_paths.len(),
            "reconciled schema"
        );

        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MemorySchemaStore;

    fn shapes(paths: &[&[&str]]) -> BTreeSet<AttributePathShape> {
        paths
            .iter()
            .map(|segments| {
                AttributePathShape::new(segments.iter().map(|s| s.to_string()).collect()).unwrap()
            })
            .collect()
    }

    #[test]
    fn reconcile_creates_schema_on_first_contact() {
        let store = MemorySchemaStore::new();
        let reconciler = SchemaReconciler::new(&store);
        let dm = DataModelId::from("dm-1");

        let schema = reconciler
            .reconcile(&dm, "http://x/Document", &shapes(&[&["http://x/a"]]))
            .unwrap();

        assert_eq!(schema.record_class.as_ref().unwrap().uri, "http://x/Document");
        assert_eq!(schema.attribute_paths.len(), 1);
        assert!(store.load_data_model(&dm).unwrap().is_some());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let store = MemorySchemaStore::new();
        let reconciler = SchemaReconciler::new(&store);
        let dm = DataModelId::from("dm-1");
        let observed = shapes(&[&["http://x/a"], &["http://x/a", "http://x/b"]]);

        let first = reconciler.reconcile(&dm, "http://x/Document", &observed).unwrap();
        let second = reconciler.reconcile(&dm, "http://x/Document", &observed).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.attribute_paths.len(), 2);
        assert_eq!(second.attribute_paths.len(), 2);
        assert_eq!(store.attribute_count(), 2);
        assert_eq!(store.path_count(), 2);
    }

    #[test]
    fn schema_growth_is_monotonic() {
        let store = MemorySchemaStore::new();
        let reconciler = SchemaReconciler::new(&store);
        let dm = DataModelId::from("dm-1");

        let narrow = shapes(&[&["http://x/a"]]);
        let wide = shapes(&[&["http://x/a"], &["http://x/a", "http://x/b"]]);

        reconciler.reconcile(&dm, "http://x/Document", &narrow).unwrap();
        let grown = reconciler.reconcile(&dm, "http://x/Document", &wide).unwrap();
        assert_eq!(grown.attribute_paths.len(), 2);

        // a narrower batch never shrinks the schema
        let after = reconciler.reconcile(&dm, "http://x/Document", &narrow).unwrap();
        assert_eq!(after.attribute_paths.len(), 2);
    }

    #[test]
    fn overlapping_batches_accumulate_distinct_paths() {
        let store = MemorySchemaStore::new();
        let reconciler = SchemaReconciler::new(&store);
        let dm = DataModelId::from("dm-1");

        reconciler
            .reconcile(
                &dm,
                "http://x/Document",
                &shapes(&[&["http://x/a"], &["http://x/a", "http://x/b"]]),
            )
            .unwrap();
        let schema = reconciler
            .reconcile(
                &dm,
                "http://x/Document",
                &shapes(&[&["http://x/a"], &["http://x/c"]]),
            )
            .unwrap();

        let keys: Vec<String> = schema.attribute_paths.iter().map(|p| p.path_key()).collect();
        assert_eq!(schema.attribute_paths.len(), 3);
        assert_eq!(store.path_count(), 3);
        assert!(keys.iter().any(|k| k == "http://x/a"));
    }

    #[test]
    fn established_record_class_wins() {
        let store = MemorySchemaStore::new();
        let reconciler = SchemaReconciler::new(&store);
        let dm = DataModelId::from("dm-1");
        let observed = shapes(&[&["http://x/a"]]);

        reconciler.reconcile(&dm, "http://x/Document", &observed).unwrap();
        let schema = reconciler.reconcile(&dm, "http://x/Other", &observed).unwrap();

        assert_eq!(schema.record_class.as_ref().unwrap().uri, "http://x/Document");
    }
}
