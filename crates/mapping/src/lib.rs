//! Mapping metadata: attribute descriptors, relation descriptors, entity
//! mappings and the registry that binds persistence types to domain types.
//!
//! The registry is assembled once at start-up through explicit builder calls
//! and is read-only afterwards, so it can be shared behind an `Arc` by any
//! number of concurrent conversions.

pub mod attribute;
pub mod entity_mapping;
pub mod registry;
pub mod relation;

pub use attribute::{AttributeDescriptor, AttributeKind, IntegerWidth};
pub use entity_mapping::{EntityMapping, EntityMappingBuilder};
pub use registry::{MappingRegistry, RegistryBuilder};
pub use relation::{Cardinality, Direction, JoinTable, RelationDescriptor};
