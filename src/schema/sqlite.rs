//! SQLite-backed schema store

use super::store::{ReconcileError, SchemaResult, SchemaStore};
use super::types::{Attribute, AttributePath, DataModel, DataModelId, RecordClass, Schema};
use crate::mint;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed schema store.
///
/// Attributes, classes and attribute paths live in uniquely keyed tables;
/// `INSERT ... ON CONFLICT DO NOTHING` followed by a re-read gives the
/// atomic insert-or-fetch the reconciler relies on under concurrency.
/// Thread-safe via internal mutex on the connection.
pub struct SqliteSchemaStore {
    conn: Mutex<Connection>,
}

impl SqliteSchemaStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> SchemaResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn open_in_memory() -> SchemaResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> SchemaResult<()> {
        conn.execute_batch(
            r#"
            -- Global, uri-keyed entities shared across schemas
            CREATE TABLE IF NOT EXISTS attributes (
                uri TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS classes (
                uri TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );

            -- Paths are keyed by their ordered uri sequence
            CREATE TABLE IF NOT EXISTS attribute_paths (
                path_key TEXT PRIMARY KEY,
                attributes_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS schemas (
                id TEXT PRIMARY KEY,
                name TEXT,
                record_class_uri TEXT,
                created_at TEXT
            );

            -- Schema membership; rows are only ever added
            CREATE TABLE IF NOT EXISTS schema_paths (
                schema_id TEXT NOT NULL,
                path_key TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (schema_id, path_key),
                FOREIGN KEY (schema_id) REFERENCES schemas(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS data_models (
                id TEXT PRIMARY KEY,
                schema_id TEXT,
                updated_at TEXT
            );

            PRAGMA foreign_keys = ON;

            -- WAL keeps concurrent reconciliations of different runs readable
            PRAGMA journal_mode = WAL;
            "#,
        )?;

        Ok(())
    }
}

impl SchemaStore for SqliteSchemaStore {
    fn get_or_create_attribute(&self, uri: &str) -> SchemaResult<Attribute> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO attributes (uri, name) VALUES (?1, ?2) ON CONFLICT(uri) DO NOTHING",
            params![uri, mint::last_uri_segment(uri)],
        )?;

        let attribute = conn.query_row(
            "SELECT uri, name FROM attributes WHERE uri = ?1",
            params![uri],
            |row| {
                Ok(Attribute {
                    uri: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )?;

        Ok(attribute)
    }

    fn get_or_create_class(&self, uri: &str) -> SchemaResult<RecordClass> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO classes (uri, name) VALUES (?1, ?2) ON CONFLICT(uri) DO NOTHING",
            params![uri, mint::last_uri_segment(uri)],
        )?;

        let class = conn.query_row(
            "SELECT uri, name FROM classes WHERE uri = ?1",
            params![uri],
            |row| {
                Ok(RecordClass {
                    uri: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )?;

        Ok(class)
    }

    fn get_or_create_attribute_path(&self, attributes: &[Attribute]) -> SchemaResult<AttributePath> {
        if attributes.is_empty() {
            return Err(ReconcileError::EmptyAttributePath);
        }

        let path = AttributePath::new(attributes.to_vec());
        let path_key = path.path_key();
        let attributes_json = serde_json::to_string(&path.attributes)?;

        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO attribute_paths (path_key, attributes_json) VALUES (?1, ?2)
             ON CONFLICT(path_key) DO NOTHING",
            params![path_key, attributes_json],
        )?;

        let stored_json: String = conn.query_row(
            "SELECT attributes_json FROM attribute_paths WHERE path_key = ?1",
            params![path_key],
            |row| row.get(0),
        )?;

        Ok(AttributePath::new(serde_json::from_str(&stored_json)?))
    }

    fn load_schema(&self, data_model: &DataModelId) -> SchemaResult<Option<Schema>> {
        let conn = self.conn.lock().unwrap();

        let schema_id: Option<String> = conn
            .query_row(
                "SELECT schema_id FROM data_models WHERE id = ?1",
                params![data_model.as_str()],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        let Some(schema_id) = schema_id else {
            return Ok(None);
        };

        let schema_row: Option<(Option<String>, Option<String>, Option<String>)> = conn
            .query_row(
                "SELECT name, record_class_uri, created_at FROM schemas WHERE id = ?1",
                params![schema_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((name, record_class_uri, created_at)) = schema_row else {
            return Ok(None);
        };

        let record_class = match record_class_uri {
            Some(uri) => Some(
                conn.query_row(
                    "SELECT uri, name FROM classes WHERE uri = ?1",
                    params![uri],
                    |row| {
                        Ok(RecordClass {
                            uri: row.get(0)?,
                            name: row.get(1)?,
                        })
                    },
                )
                .optional()?
                .unwrap_or_else(|| RecordClass::from_uri(uri)),
            ),
            None => None,
        };

        let mut stmt = conn.prepare(
            "SELECT p.attributes_json
             FROM schema_paths sp
             JOIN attribute_paths p ON p.path_key = sp.path_key
             WHERE sp.schema_id = ?1
             ORDER BY sp.position",
        )?;
        let paths_iter = stmt.query_map(params![schema_id], |row| row.get::<_, String>(0))?;

        let mut attribute_paths = Vec::new();
        for row in paths_iter {
            let attributes: Vec<Attribute> = serde_json::from_str(&row?)?;
            attribute_paths.push(AttributePath::new(attributes));
        }

        Ok(Some(Schema {
            id: schema_id,
            name,
            record_class,
            attribute_paths,
            created_at: parse_timestamp(created_at),
        }))
    }

    fn save_schema(&self, data_model: &DataModelId, schema: &Schema) -> SchemaResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO schemas (id, name, record_class_uri, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 record_class_uri = excluded.record_class_uri",
            params![
                schema.id,
                schema.name,
                schema.record_class.as_ref().map(|c| c.uri.as_str()),
                schema.created_at.map(|t| t.to_rfc3339()),
            ],
        )?;

        for (position, path) in schema.attribute_paths.iter().enumerate() {
            tx.execute(
                "INSERT INTO schema_paths (schema_id, path_key, position) VALUES (?1, ?2, ?3)
                 ON CONFLICT(schema_id, path_key) DO NOTHING",
                params![schema.id, path.path_key(), position as i64],
            )?;
        }

        tx.execute(
            "INSERT INTO data_models (id, schema_id, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                 schema_id = excluded.schema_id,
                 updated_at = excluded.updated_at",
            params![
                data_model.as_str(),
                schema.id,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.commit()?;

        Ok(())
    }

    fn load_data_model(&self, data_model: &DataModelId) -> SchemaResult<Option<DataModel>> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(Option<String>, Option<String>)> = conn
            .query_row(
                "SELECT schema_id, updated_at FROM data_models WHERE id = ?1",
                params![data_model.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.map(|(schema_id, updated_at)| DataModel {
            id: data_model.clone(),
            schema_id,
            updated_at: parse_timestamp(updated_at),
        }))
    }
}

fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|t| {
        DateTime::parse_from_rfc3339(&t)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    })
}
