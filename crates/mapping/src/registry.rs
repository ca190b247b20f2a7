//! Entity mapping registry.
//!
//! Registration goes through [`RegistryBuilder`]; once every mapping is
//! registered, [`RegistryBuilder::build`] cross-checks relation targets and
//! freezes the table into an immutable [`MappingRegistry`].

use std::collections::HashMap;

use datamapper_core::{EntityType, MappingError, MappingResult, ModelType};

use crate::entity_mapping::EntityMapping;
use crate::relation::Direction;

/// Mutable registration phase of the registry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    mappings: Vec<EntityMapping>,
    by_model: HashMap<ModelType, usize>,
    by_entity: HashMap<EntityType, usize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping.
    ///
    /// Fails with `DuplicateMapping` if its persistence type or its domain type
    /// is already registered.
    pub fn register(&mut self, mapping: EntityMapping) -> MappingResult<&mut Self> {
        if self.by_model.contains_key(mapping.model_type()) {
            return Err(MappingError::duplicate(format!(
                "persistence type {} is already registered",
                mapping.model_type()
            )));
        }
        if self.by_entity.contains_key(mapping.entity_type()) {
            return Err(MappingError::duplicate(format!(
                "domain type {} is already registered",
                mapping.entity_type()
            )));
        }

        let idx = self.mappings.len();
        self.by_model.insert(mapping.model_type().clone(), idx);
        self.by_entity.insert(mapping.entity_type().clone(), idx);
        tracing::debug!(
            model_type = %mapping.model_type(),
            entity_type = %mapping.entity_type(),
            "registered entity mapping"
        );
        self.mappings.push(mapping);
        Ok(self)
    }

    /// Validate cross-mapping references and freeze the registry.
    ///
    /// Every relation target must be registered, `self_referencing` must agree
    /// with the target, and a declared counterpart must exist on the target,
    /// point back, and sit on the opposite side.
    pub fn build(self) -> MappingResult<MappingRegistry> {
        for mapping in &self.mappings {
            for relation in mapping.relations() {
                let context = format!("{}.{}", mapping.model_type(), relation.name());
                let target = self
                    .by_model
                    .get(relation.target())
                    .map(|&idx| &self.mappings[idx])
                    .ok_or_else(|| {
                        MappingError::configuration(format!(
                            "{context}: target {} is not registered",
                            relation.target()
                        ))
                    })?;

                let points_to_self = relation.target() == mapping.model_type();
                if relation.is_self_referencing() != points_to_self {
                    return Err(MappingError::configuration(format!(
                        "{context}: self_referencing flag does not match target {}",
                        relation.target()
                    )));
                }

                if let Some(counterpart) = relation.counterpart() {
                    let other = target.relation(counterpart).ok_or_else(|| {
                        MappingError::configuration(format!(
                            "{context}: counterpart `{counterpart}` not found on {}",
                            target.model_type()
                        ))
                    })?;
                    if other.target() != mapping.model_type() {
                        return Err(MappingError::configuration(format!(
                            "{context}: counterpart `{counterpart}` targets {}",
                            other.target()
                        )));
                    }
                    if relation.direction() == Direction::Inverse
                        && other.direction() == Direction::Inverse
                    {
                        return Err(MappingError::configuration(format!(
                            "{context}: both sides are inverse; one must own the relation"
                        )));
                    }
                }
            }
        }

        tracing::info!(mappings = self.mappings.len(), "mapping registry built");
        Ok(MappingRegistry {
            mappings: self.mappings,
            by_model: self.by_model,
            by_entity: self.by_entity,
        })
    }
}

/// Immutable, process-wide table of entity mappings.
///
/// Shared read-only (typically behind an `Arc`) by every conversion; no
/// locking is needed.
#[derive(Debug, Clone)]
pub struct MappingRegistry {
    mappings: Vec<EntityMapping>,
    by_model: HashMap<ModelType, usize>,
    by_entity: HashMap<EntityType, usize>,
}

impl MappingRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn lookup_by_persistence_type(&self, model_type: &ModelType) -> MappingResult<&EntityMapping> {
        self.by_model
            .get(model_type)
            .map(|&idx| &self.mappings[idx])
            .ok_or_else(|| MappingError::unmapped(format!("persistence type {model_type}")))
    }

    pub fn lookup_by_domain_type(&self, entity_type: &EntityType) -> MappingResult<&EntityMapping> {
        self.by_entity
            .get(entity_type)
            .map(|&idx| &self.mappings[idx])
            .ok_or_else(|| MappingError::unmapped(format!("domain type {entity_type}")))
    }

    /// Mappings in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
