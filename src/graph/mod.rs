//! Canonical graph data model
//!
//! One source record becomes one [`GraphModel`]: an ordered set of
//! [`Resource`]s, each a subject node with its outgoing [`Statement`]s.

mod model;
mod node;
mod resource;
mod statement;


pub use model::GraphModel;
pub use node::{Node, Predicate};
pub use resource::Resource;
pub use statement::Statement;
