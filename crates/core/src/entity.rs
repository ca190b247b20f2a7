//! Entity trait: identity + continuity across state changes.

use crate::id::EntityType;
use crate::value::IdentityKey;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Registered domain type name of this entity.
    fn entity_type() -> EntityType;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Identifier in the form stored in the identity field.
    fn identity_key(&self) -> IdentityKey;
}
