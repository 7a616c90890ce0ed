//! Resources: a subject node plus its outgoing statements

use super::node::{Node, Predicate};
use super::statement::Statement;
use serde::{Deserialize, Serialize};

/// A subject node together with its ordered outgoing statements.
///
/// One resource exists per record root and per nested entity encountered
/// while encoding a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub subject: Node,
    pub statements: Vec<Statement>,
}

impl Resource {
    /// Create an empty resource for a subject node.
    pub fn new(subject: Node) -> Self {
        Self {
            subject,
            statements: Vec::new(),
        }
    }

    /// The subject's grouping key (`None` only for literal subjects, which
    /// the encoder never produces).
    pub fn subject_key(&self) -> Option<String> {
        self.subject.subject_key()
    }

    /// Append a statement from this resource's subject.
    pub fn add_statement(&mut self, predicate: Predicate, object: Node, order: u64) {
        self.statements
            .push(Statement::new(self.subject.clone(), predicate, object, order));
    }

    /// Outgoing statements carrying the given predicate URI.
    pub fn statements_with_predicate<'a>(
        &'a self,
        predicate_uri: &'a str,
    ) -> impl Iterator<Item = &'a Statement> {
        self.statements
            .iter()
            .filter(move |s| s.predicate.uri() == predicate_uri)
    }
}
