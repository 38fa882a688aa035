//! Domain module for todo management.
//!
//! Entities, the scope gate and validator derivation. Nothing here performs
//! I/O.

pub mod scope;
pub mod todo;
pub mod validator;

pub use scope::{ScopeRequirement, ScopeSet, authorize};
pub use todo::{Timestamp, Todo, TodoChanges, TodoId};
pub use validator::{Resource, collection_validators};
