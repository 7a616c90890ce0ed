//! Event-driven graph encoder
//!
//! Consumes the record event protocol emitted by format decoders and
//! produces one [`GraphModel`] per source record, while accumulating the
//! attribute paths observed across the run in an [`EncoderSession`].
//!
//! The encoder is a single-threaded state machine
//! (`Idle → InRecord → (InEntity)* → InRecord → Idle`). One encoder is
//! reused across all records of a run; per-record state resets on every
//! record start, per-run caches live in the session.

mod events;
mod session;

pub use events::Event;
pub use session::{EncoderConfig, EncoderSession};

use crate::graph::{GraphModel, Node, Predicate, Resource};
use crate::mint;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Protocol-contract violations. Always fatal to the current record,
/// never silently recovered.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("'{0}' event received with no open record")]
    NoOpenRecord(&'static str),

    #[error("record '{0}' is still open, cannot start another")]
    RecordAlreadyOpen(String),

    #[error("end-entity event received with no open entity")]
    NoOpenEntity,

    #[error("record ended with {open} unclosed entities")]
    UnclosedEntities { open: usize },
}

/// One open entity: its blank node and grouping key. The predicate that
/// reached the entity lives in the record's path stack.
struct EntityFrame {
    node: Node,
    key: String,
}

/// Per-record state, discarded at every record end.
struct RecordState {
    model: GraphModel,
    /// subject key → index into `model.resources`
    index: HashMap<String, usize>,
    root: Node,
    root_key: String,
    entity_stack: Vec<EntityFrame>,
    /// predicate URIs from the root to the current entity
    path: Vec<String>,
    /// `subject-key::predicate-uri` → last assigned order. Record-scoped,
    /// so orders stay contiguous from 1 even when the same record key is
    /// ingested twice in one run.
    order_counters: HashMap<String, u64>,
}

/// Separator in the order-counter key between subject key and predicate.
const COUNTER_KEY_SEPARATOR: &str = "::";

impl RecordState {
    fn current_subject(&self) -> (Node, String) {
        match self.entity_stack.last() {
            Some(frame) => (frame.node.clone(), frame.key.clone()),
            None => (self.root.clone(), self.root_key.clone()),
        }
    }

    fn next_order(&mut self, subject_key: &str, predicate: &Predicate) -> u64 {
        let key = format!(
            "{}{}{}",
            subject_key,
            COUNTER_KEY_SEPARATOR,
            predicate.uri()
        );
        let counter = self.order_counters.entry(key).or_insert(0);
        *counter += 1;
        *counter
    }

    fn resource_mut(&mut self, subject: &Node, subject_key: &str) -> &mut Resource {
        let idx = match self.index.get(subject_key) {
            Some(&i) => i,
            None => {
                self.model.resources.push(Resource::new(subject.clone()));
                let i = self.model.resources.len() - 1;
                self.index.insert(subject_key.to_string(), i);
                i
            }
        };
        &mut self.model.resources[idx]
    }
}

/// The record-to-graph state machine.
///
/// Feed it [`Event`]s via [`push`](Self::push); a completed [`GraphModel`]
/// comes back on every record end. When the run is over,
/// [`into_session`](Self::into_session) hands the accumulated caches and
/// attribute paths back to the driver for reconciliation.
pub struct GraphEncoder {
    session: EncoderSession,
    record: Option<RecordState>,
}

impl GraphEncoder {
    /// Create an encoder owning the given session.
    pub fn new(session: EncoderSession) -> Self {
        Self {
            session,
            record: None,
        }
    }

    /// Create an encoder with a fresh session for the given configuration.
    pub fn with_config(config: EncoderConfig) -> Self {
        Self::new(EncoderSession::new(config))
    }

    /// The run session (caches, record class, attribute paths).
    pub fn session(&self) -> &EncoderSession {
        &self.session
    }

    /// Consume the encoder, returning the session for reconciliation.
    pub fn into_session(self) -> EncoderSession {
        self.session
    }

    /// Whether a record is currently open.
    pub fn in_record(&self) -> bool {
        self.record.is_some()
    }

    /// Advance the state machine by one event.
    ///
    /// Returns `Some(model)` exactly on a record end.
    pub fn push(&mut self, event: Event) -> Result<Option<GraphModel>, EncodingError> {
        match event {
            Event::StartRecord { key } => {
                self.start_record(&key)?;
                Ok(None)
            }
            Event::StartEntity { name } => {
                self.start_entity(&name)?;
                Ok(None)
            }
            Event::Literal { name, value } => {
                self.literal(&name, &value)?;
                Ok(None)
            }
            Event::EndEntity => {
                self.end_entity()?;
                Ok(None)
            }
            Event::EndRecord => self.end_record().map(Some),
        }
    }

    /// Feed a whole event stream, collecting every completed model.
    pub fn encode(
        &mut self,
        events: impl IntoIterator<Item = Event>,
    ) -> Result<Vec<GraphModel>, EncodingError> {
        let mut models = Vec::new();
        for event in events {
            if let Some(model) = self.push(event)? {
                models.push(model);
            }
        }
        Ok(models)
    }

    fn start_record(&mut self, key: &str) -> Result<(), EncodingError> {
        if let Some(record) = &self.record {
            return Err(EncodingError::RecordAlreadyOpen(
                record.model.record_uri.clone(),
            ));
        }

        let session = &mut self.session;

        let record_uri = if mint::is_absolute_uri(key) {
            key.to_string()
        } else {
            let uri = mint::mint_record_uri(
                Some(key).filter(|k| !k.is_empty()),
                session.config().data_model(),
                session.config().record_base(),
            );
            debug!(key, uri = %uri, "minted record uri for non-absolute key");
            uri
        };

        let root = Node::resource(record_uri.clone());
        let mut record = RecordState {
            model: GraphModel::new(record_uri.clone()),
            index: HashMap::new(),
            root: root.clone(),
            root_key: record_uri.clone(),
            entity_stack: Vec::new(),
            path: Vec::new(),
            order_counters: HashMap::new(),
        };

        let class_uri = session.record_class();
        record.model.record_class_uri = Some(class_uri.clone());

        let rdf_type = session.predicate(mint::RDF_TYPE);
        add_statement(
            &mut record,
            &root,
            &record_uri,
            rdf_type,
            Node::resource(class_uri),
        );

        self.record = Some(record);
        Ok(())
    }

    fn start_entity(&mut self, name: &str) -> Result<(), EncodingError> {
        let Self { session, record } = self;
        let Some(record) = record.as_mut() else {
            return Err(EncodingError::NoOpenRecord("start-entity"));
        };

        let predicate = session.predicate(name);
        let type_uri = mint::entity_type_uri(&session.resolve_term(name));

        let blank_id = session.next_blank_id();
        let entity = Node::blank(blank_id);
        let entity_key = format!("_:{}", blank_id);

        let (parent, parent_key) = record.current_subject();
        add_statement(
            record,
            &parent,
            &parent_key,
            predicate.clone(),
            entity.clone(),
        );

        let rdf_type = session.predicate(mint::RDF_TYPE);
        add_statement(
            record,
            &entity,
            &entity_key,
            rdf_type,
            Node::resource(type_uri),
        );

        record.path.push(predicate.uri().to_string());
        session.add_attribute_path(&record.path);

        record.entity_stack.push(EntityFrame {
            node: entity,
            key: entity_key,
        });

        Ok(())
    }

    fn literal(&mut self, name: &str, value: &str) -> Result<(), EncodingError> {
        let Self { session, record } = self;
        let Some(record) = record.as_mut() else {
            return Err(EncodingError::NoOpenRecord("literal"));
        };

        // only non-empty values are emitted
        if value.is_empty() {
            tracing::trace!(name, "skipping empty literal value");
            return Ok(());
        }

        let predicate = session.predicate(name);
        let (subject, subject_key) = record.current_subject();

        let object = if predicate.uri() == mint::RDF_TYPE && mint::is_absolute_uri(value) {
            // an explicit type literal carries a resource, not a string;
            // on the root it also settles this record's class
            if subject_key == record.root_key {
                record.model.record_class_uri = Some(value.to_string());
            }
            Node::resource(value)
        } else {
            Node::literal(value)
        };

        if predicate.uri() != mint::RDF_TYPE {
            record.path.push(predicate.uri().to_string());
            session.add_attribute_path(&record.path);
            record.path.pop();
        }

        add_statement(record, &subject, &subject_key, predicate, object);

        Ok(())
    }

    fn end_entity(&mut self) -> Result<(), EncodingError> {
        let Some(record) = self.record.as_mut() else {
            return Err(EncodingError::NoOpenRecord("end-entity"));
        };

        if record.entity_stack.pop().is_none() {
            return Err(EncodingError::NoOpenEntity);
        }
        record.path.pop();

        Ok(())
    }

    fn end_record(&mut self) -> Result<GraphModel, EncodingError> {
        let Some(record) = self.record.take() else {
            return Err(EncodingError::NoOpenRecord("end-record"));
        };

        if !record.entity_stack.is_empty() {
            return Err(EncodingError::UnclosedEntities {
                open: record.entity_stack.len(),
            });
        }

        Ok(record.model)
    }
}

fn add_statement(
    record: &mut RecordState,
    subject: &Node,
    subject_key: &str,
    predicate: Predicate,
    object: Node,
) {
    let order = record.next_order(subject_key, &predicate);
    record
        .resource_mut(subject, subject_key)
        .add_statement(predicate, object, order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataModelId;
    use std::collections::HashSet;

    fn encoder_for(base: &str, data_model: &str) -> GraphEncoder {
        GraphEncoder::with_config(
            EncoderConfig::new()
                .with_base_uri(base)
                .with_data_model(DataModelId::from(data_model)),
        )
    }

    fn record_events(key: &str, fields: &[(&str, &str)]) -> Vec<Event> {
        let mut events = vec![Event::start_record(key)];
        for (name, value) in fields {
            events.push(Event::literal(*name, *value));
        }
        events.push(Event::EndRecord);
        events
    }

    #[test]
    fn repeated_fields_get_contiguous_orders() {
        let mut encoder = encoder_for("http://x/", "7");

        let models = encoder
            .encode(record_events("42", &[("title", "Hello"), ("title", "World")]))
            .unwrap();
        assert_eq!(models.len(), 1);

        let model = &models[0];
        assert_eq!(model.record_uri, "http://x/datamodels/7/records/42");

        let root = model.root().unwrap();
        let titles: Vec<_> = root
            .statements_with_predicate("http://x/title")
            .map(|s| (s.order, s.object.literal_value().unwrap().to_string()))
            .collect();
        assert_eq!(titles, vec![(1, "Hello".to_string()), (2, "World".to_string())]);

        let types: Vec<_> = root.statements_with_predicate(mint::RDF_TYPE).collect();
        assert_eq!(types.len(), 1);
        assert_eq!(model.statement_count(), 3);
    }

    #[test]
    fn empty_key_mints_distinct_random_uris() {
        let mut encoder = encoder_for("http://x/", "7");

        let models = encoder
            .encode(
                record_events("", &[("a", "1")])
                    .into_iter()
                    .chain(record_events("", &[("a", "2")])),
            )
            .unwrap();

        assert_eq!(models.len(), 2);
        assert!(models[0].record_uri.starts_with("http://x/datamodels/7/records/"));
        assert_ne!(models[0].record_uri, models[1].record_uri);
    }

    #[test]
    fn absolute_keys_are_reused_unchanged() {
        let mut encoder = encoder_for("http://x/", "7");

        let models = encoder
            .encode(record_events("http://other.org/records/9", &[("a", "1")]))
            .unwrap();
        assert_eq!(models[0].record_uri, "http://other.org/records/9");
    }

    #[test]
    fn nested_entities_attach_to_their_parents() {
        let mut encoder = encoder_for("http://x/", "7");

        let models = encoder
            .encode(vec![
                Event::start_record("1"),
                Event::literal("title", "Root title"),
                Event::start_entity("author"),
                Event::literal("name", "Ada"),
                Event::start_entity("address"),
                Event::literal("city", "London"),
                Event::EndEntity,
                Event::EndEntity,
                Event::literal("title", "Another"),
                Event::EndRecord,
            ])
            .unwrap();

        let model = &models[0];
        // root + author + address
        assert_eq!(model.resources.len(), 3);

        let root = model.root().unwrap();
        let author_stmt = root
            .statements_with_predicate("http://x/author")
            .next()
            .unwrap();
        let author_key = author_stmt.object.subject_key().unwrap();
        let author = model.resource(&author_key).unwrap();

        assert!(author
            .statements_with_predicate("http://x/name")
            .any(|s| s.object.literal_value() == Some("Ada")));
        assert!(author
            .statements_with_predicate(mint::RDF_TYPE)
            .any(|s| s.object.uri() == Some("http://x/authorType")));

        let address_stmt = author
            .statements_with_predicate("http://x/address")
            .next()
            .unwrap();
        let address = model
            .resource(&address_stmt.object.subject_key().unwrap())
            .unwrap();
        assert!(address
            .statements_with_predicate("http://x/city")
            .any(|s| s.object.literal_value() == Some("London")));

        // the literal after the entities landed back on the root
        let titles: Vec<u64> = root
            .statements_with_predicate("http://x/title")
            .map(|s| s.order)
            .collect();
        assert_eq!(titles, vec![1, 2]);
    }

    #[test]
    fn orders_are_contiguous_per_subject_and_predicate() {
        let mut encoder = encoder_for("http://x/", "7");

        let models = encoder
            .encode(vec![
                Event::start_record("1"),
                Event::literal("a", "1"),
                Event::literal("b", "1"),
                Event::literal("a", "2"),
                Event::start_entity("e"),
                Event::literal("a", "3"),
                Event::EndEntity,
                Event::literal("a", "4"),
                Event::EndRecord,
            ])
            .unwrap();

        let model = &models[0];
        let mut seen: HashMap<(String, String), Vec<u64>> = HashMap::new();
        for statement in model.statements() {
            seen.entry((
                statement.subject.subject_key().unwrap(),
                statement.predicate.uri().to_string(),
            ))
            .or_default()
            .push(statement.order);
        }

        for ((_, _), mut orders) in seen {
            orders.sort_unstable();
            let expected: Vec<u64> = (1..=orders.len() as u64).collect();
            assert_eq!(orders, expected);
        }
    }

    #[test]
    fn attribute_paths_accumulate_with_prefixes() {
        let mut encoder = encoder_for("http://x/", "7");

        encoder
            .encode(vec![
                Event::start_record("1"),
                Event::literal("title", "t"),
                Event::start_entity("author"),
                Event::literal("name", "Ada"),
                Event::EndEntity,
                Event::EndRecord,
            ])
            .unwrap();

        let session = encoder.into_session();
        let keys: HashSet<String> = session
            .attribute_paths()
            .iter()
            .map(|p| p.segments().join(" "))
            .collect();

        assert!(keys.contains("http://x/title"));
        assert!(keys.contains("http://x/author"));
        assert!(keys.contains("http://x/author http://x/name"));
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn attribute_paths_deduplicate_across_records() {
        let mut encoder = encoder_for("http://x/", "7");

        encoder
            .encode(
                record_events("1", &[("title", "a")])
                    .into_iter()
                    .chain(record_events("2", &[("title", "b")])),
            )
            .unwrap();

        assert_eq!(encoder.session().attribute_paths().len(), 1);
    }

    #[test]
    fn record_class_is_shared_across_the_run() {
        let mut encoder = encoder_for("http://x/", "7");

        let models = encoder
            .encode(
                record_events("1", &[("a", "1")])
                    .into_iter()
                    .chain(record_events("2", &[("a", "2")])),
            )
            .unwrap();

        assert_eq!(models[0].record_class_uri, models[1].record_class_uri);
        assert_eq!(models[0].record_class_uri.as_deref(), Some("http://x/RecordType"));
    }

    #[test]
    fn default_namespace_qualifies_record_class_by_data_model() {
        let mut encoder = GraphEncoder::with_config(
            EncoderConfig::new().with_data_model(DataModelId::from("7")),
        );

        let models = encoder.encode(record_events("1", &[("a", "1")])).unwrap();
        assert_eq!(
            models[0].record_class_uri.as_deref(),
            Some("http://data.weft.org/datamodels/7/schema#RecordType")
        );
    }

    #[test]
    fn explicit_type_literal_settles_the_record_class() {
        let mut encoder = encoder_for("http://x/", "7");

        let models = encoder
            .encode(vec![
                Event::start_record("1"),
                Event::literal(mint::RDF_TYPE, "http://x/Document"),
                Event::EndRecord,
            ])
            .unwrap();

        let model = &models[0];
        assert_eq!(model.record_class_uri.as_deref(), Some("http://x/Document"));

        // the explicit object is a resource node, not a literal
        let root = model.root().unwrap();
        assert!(root
            .statements_with_predicate(mint::RDF_TYPE)
            .any(|s| s.object.uri() == Some("http://x/Document")));
    }

    #[test]
    fn empty_literal_values_are_skipped() {
        let mut encoder = encoder_for("http://x/", "7");

        let models = encoder
            .encode(record_events("1", &[("title", "")]))
            .unwrap();

        // only the type statement remains
        assert_eq!(models[0].statement_count(), 1);
        assert!(encoder.session().attribute_paths().is_empty());
    }

    #[test]
    fn protocol_violations_fail_fast() {
        let mut encoder = encoder_for("http://x/", "7");
        assert!(matches!(
            encoder.push(Event::literal("a", "1")),
            Err(EncodingError::NoOpenRecord("literal"))
        ));
        assert!(matches!(
            encoder.push(Event::EndEntity),
            Err(EncodingError::NoOpenRecord("end-entity"))
        ));
        assert!(matches!(
            encoder.push(Event::EndRecord),
            Err(EncodingError::NoOpenRecord("end-record"))
        ));

        encoder.push(Event::start_record("1")).unwrap();
        assert!(matches!(
            encoder.push(Event::start_record("2")),
            Err(EncodingError::RecordAlreadyOpen(_))
        ));
        assert!(matches!(
            encoder.push(Event::EndEntity),
            Err(EncodingError::NoOpenEntity)
        ));

        encoder.push(Event::start_entity("e")).unwrap();
        assert!(matches!(
            encoder.push(Event::EndRecord),
            Err(EncodingError::UnclosedEntities { open: 1 })
        ));
    }

    #[test]
    fn minted_uris_are_deterministic_within_a_run() {
        let mut encoder = encoder_for("http://x/", "7");

        let first = encoder.encode(record_events("42", &[("a", "1")])).unwrap();
        let second = encoder.encode(record_events("42", &[("a", "2")])).unwrap();

        assert_eq!(first[0].record_uri, second[0].record_uri);
    }
}
