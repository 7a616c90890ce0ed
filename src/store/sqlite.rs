//! SQLite graph store backend

use super::traits::{namespace_key, GraphStore, OpenStore, StoreError, StoreResult};
use crate::graph::GraphModel;
use crate::schema::DataModelId;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed graph store.
///
/// One row per stored record, keyed (namespace, record URI), with the
/// serialized model as a JSON column. Thread-safe via internal mutex on
/// the connection.
pub struct SqliteGraphStore {
    conn: Mutex<Connection>,
}

impl SqliteGraphStore {
    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS graph_records (
                namespace TEXT NOT NULL,
                record_uri TEXT NOT NULL,
                record_class TEXT,
                model_json TEXT NOT NULL,
                written_at TEXT NOT NULL,
                PRIMARY KEY (namespace, record_uri)
            );

            CREATE INDEX IF NOT EXISTS idx_graph_records_class
                ON graph_records(namespace, record_class);

            -- WAL keeps reads of one namespace available while another is written
            PRAGMA journal_mode = WAL;
            "#,
        )?;

        Ok(())
    }
}

impl OpenStore for SqliteGraphStore {
    fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl GraphStore for SqliteGraphStore {
    fn write(&self, data_model: &DataModelId, model: &GraphModel) -> StoreResult<()> {
        let namespace = namespace_key(data_model);
        let model_json = serde_json::to_string(model)?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO graph_records (namespace, record_uri, record_class, model_json, written_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(namespace, record_uri) DO UPDATE SET
                record_class = excluded.record_class,
                model_json = excluded.model_json,
                written_at = excluded.written_at
            "#,
            params![
                namespace,
                model.record_uri,
                model.record_class_uri,
                model_json,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn read(
        &self,
        data_model: &DataModelId,
        record_class_uri: &str,
        at_most: Option<usize>,
    ) -> StoreResult<BTreeMap<String, GraphModel>> {
        let namespace = namespace_key(data_model);

        let conn = self.conn.lock().unwrap();

        let mut sql = String::from(
            "SELECT record_uri, model_json FROM graph_records
             WHERE namespace = ?1 AND record_class = ?2",
        );
        if let Some(limit) = at_most {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![namespace, record_class_uri], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = BTreeMap::new();
        for row in rows {
            let (record_uri, model_json) = row?;
            let model: GraphModel = serde_json::from_str(&model_json)?;
            records.insert(record_uri, model);
        }

        if records.is_empty() {
            return Err(StoreError::NotFound {
                namespace,
                record_class: record_class_uri.to_string(),
            });
        }

        Ok(records)
    }

    fn delete(&self, data_model: &DataModelId) -> StoreResult<bool> {
        let namespace = namespace_key(data_model);

        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "DELETE FROM graph_records WHERE namespace = ?1",
            params![namespace],
        )?;

        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Node, Predicate, Resource};

    fn test_model(record_uri: &str, class_uri: &str, title: &str) -> GraphModel {
        let mut model = GraphModel::new(record_uri);
        model.record_class_uri = Some(class_uri.to_string());

        let mut root = Resource::new(Node::resource(record_uri));
        root.add_statement(
            Predicate::new(crate::mint::RDF_TYPE),
            Node::resource(class_uri),
            1,
        );
        root.add_statement(
            Predicate::new("http://x/title"),
            Node::literal(title),
            1,
        );
        model.resources.push(root);

        model
    }

    #[test]
    fn write_then_read_round_trips_statements() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        let dm = DataModelId::from("dm-1");
        let model = test_model("http://x/records/1", "http://x/RecordType", "Hello");

        store.write(&dm, &model).unwrap();

        let records = store.read(&dm, "http://x/RecordType", None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records["http://x/records/1"], model);
    }

    #[test]
    fn writes_append_per_record() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        let dm = DataModelId::from("dm-1");

        store
            .write(&dm, &test_model("http://x/records/1", "http://x/T", "a"))
            .unwrap();
        store
            .write(&dm, &test_model("http://x/records/2", "http://x/T", "b"))
            .unwrap();
        // re-writing record 1 replaces it, not record 2
        store
            .write(&dm, &test_model("http://x/records/1", "http://x/T", "c"))
            .unwrap();

        let records = store.read(&dm, "http://x/T", None).unwrap();
        assert_eq!(records.len(), 2);

        let titles: Vec<_> = records["http://x/records/1"]
            .root()
            .unwrap()
            .statements_with_predicate("http://x/title")
            .map(|s| s.object.literal_value().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["c".to_string()]);
    }

    #[test]
    fn read_missing_namespace_or_class_is_not_found() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        let dm = DataModelId::from("dm-1");

        assert!(matches!(
            store.read(&dm, "http://x/T", None),
            Err(StoreError::NotFound { .. })
        ));

        store
            .write(&dm, &test_model("http://x/records/1", "http://x/T", "a"))
            .unwrap();
        assert!(matches!(
            store.read(&dm, "http://x/Other", None),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn read_caps_at_most() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        let dm = DataModelId::from("dm-1");

        for i in 0..5 {
            store
                .write(
                    &dm,
                    &test_model(&format!("http://x/records/{}", i), "http://x/T", "t"),
                )
                .unwrap();
        }

        let capped = store.read(&dm, "http://x/T", Some(3)).unwrap();
        assert_eq!(capped.len(), 3);

        let all = store.read(&dm, "http://x/T", None).unwrap();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn delete_removes_only_the_namespace() {
        let store = SqliteGraphStore::open_in_memory().unwrap();
        let dm1 = DataModelId::from("dm-1");
        let dm2 = DataModelId::from("dm-2");

        store
            .write(&dm1, &test_model("http://x/records/1", "http://x/T", "a"))
            .unwrap();
        store
            .write(&dm2, &test_model("http://x/records/2", "http://x/T", "b"))
            .unwrap();

        assert!(store.delete(&dm1).unwrap());
        assert!(!store.delete(&dm1).unwrap());

        assert!(matches!(
            store.read(&dm1, "http://x/T", None),
            Err(StoreError::NotFound { .. })
        ));
        assert_eq!(store.read(&dm2, "http://x/T", None).unwrap().len(), 1);
    }

    #[test]
    fn on_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("graphs.db");
        let dm = DataModelId::from("dm-1");

        {
            let store = SqliteGraphStore::open(&db_path).unwrap();
            store
                .write(&dm, &test_model("http://x/records/1", "http://x/T", "a"))
                .unwrap();
        }

        let reopened = SqliteGraphStore::open(&db_path).unwrap();
        let records = reopened.read(&dm, "http://x/T", None).unwrap();
        assert_eq!(records.len(), 1);
    }
}
