//! Statements: ordered (subject, predicate, object) triples

use super::node::{Node, Predicate};
use serde::{Deserialize, Serialize};

/// One edge of the graph with its emission order.
///
/// `order` is a 1-based sequence number scoped to the (subject, predicate)
/// pair. Source formats may emit the same field many times per subject;
/// the order is what lets consumers reconstruct the original sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub subject: Node,
    pub predicate: Predicate,
    pub object: Node,
    pub order: u64,
}

impl Statement {
    pub fn new(subject: Node, predicate: Predicate, object: Node, order: u64) -> Self {
        Self {
            subject,
            predicate,
            object,
            order,
        }
    }
}
