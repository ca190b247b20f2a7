//! `datamapper-core`: shared building blocks for the mapping layer.
//!
//! This crate holds the **pure data** primitives every other crate agrees on:
//! scalar values, identity keys, type names, the error taxonomy and the
//! bidirectional edge set used for many-to-many relations.

pub mod edge_set;
pub mod entity;
pub mod error;
pub mod id;
pub mod value;
pub mod value_object;

pub use edge_set::EdgeSet;
pub use entity::Entity;
pub use error::{DomainError, DomainResult, MappingError, MappingResult};
pub use id::{EntityType, ModelType};
pub use value::{IdentityKey, Value};
pub use value_object::ValueObject;
