//! The record event protocol consumed by the encoder
//!
//! Format decoders (CSV, XML, JSON — out of scope here) emit this
//! protocol, one record at a time. Calls must nest correctly: every
//! `StartEntity` is matched by one `EndEntity` before the enclosing
//! `EndRecord`, and nothing but `StartRecord` is valid while idle.

use serde::{Deserialize, Serialize};

/// One event of the record protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    /// A record begins; `key` is the source's external identifier and may
    /// be empty.
    StartRecord { key: String },
    /// A nested entity (repeated group, sub-element) begins.
    StartEntity { name: String },
    /// A named value at the current nesting depth.
    Literal { name: String, value: String },
    /// The innermost open entity ends.
    EndEntity,
    /// The record ends.
    EndRecord,
}

impl Event {
    pub fn start_record(key: impl Into<String>) -> Self {
        Event::StartRecord { key: key.into() }
    }

    pub fn start_entity(name: impl Into<String>) -> Self {
        Event::StartEntity { name: name.into() }
    }

    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Event::Literal {
            name: name.into(),
            value: value.into(),
        }
    }
}
