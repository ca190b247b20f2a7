//! Binding between one persistence-model type and one domain-entity type.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use datamapper_core::{EntityType, MappingError, MappingResult, ModelType};

use crate::attribute::AttributeDescriptor;
use crate::relation::RelationDescriptor;

/// Mapping metadata for one entity type.
///
/// # Invariants
/// - The identity field is a declared, non-nullable field of an identifying
///   kind (integer, string/text or uuid).
/// - Field names and relation names are unique and disjoint.
/// - Every descriptor passed [`AttributeDescriptor::validate`].
///
/// Deserialization runs the same checks as [`EntityMapping::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MappingParts")]
pub struct EntityMapping {
    model_type: ModelType,
    entity_type: EntityType,
    table: String,
    fields: BTreeMap<String, AttributeDescriptor>,
    relations: Vec<RelationDescriptor>,
    identity_field: String,
}

/// Unchecked serialized form of [`EntityMapping`].
#[derive(Deserialize)]
struct MappingParts {
    model_type: ModelType,
    entity_type: EntityType,
    #[serde(default)]
    table: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, AttributeDescriptor>,
    #[serde(default)]
    relations: Vec<RelationDescriptor>,
    identity_field: String,
}

impl TryFrom<MappingParts> for EntityMapping {
    type Error = MappingError;

    fn try_from(parts: MappingParts) -> MappingResult<Self> {
        let table = parts
            .table
            .unwrap_or_else(|| parts.model_type.as_str().to_lowercase());
        Self::with_table(
            parts.model_type,
            parts.entity_type,
            table,
            parts.fields,
            parts.relations,
            parts.identity_field,
        )
    }
}

impl EntityMapping {
    /// Build and validate a mapping from its parts.
    pub fn new(
        model_type: impl Into<ModelType>,
        entity_type: impl Into<EntityType>,
        fields: impl IntoIterator<Item = (String, AttributeDescriptor)>,
        relations: impl IntoIterator<Item = RelationDescriptor>,
        identity_field: impl Into<String>,
    ) -> MappingResult<Self> {
        let model_type = model_type.into();
        let table = model_type.as_str().to_lowercase();
        Self::with_table(model_type, entity_type, table, fields, relations, identity_field)
    }

    fn with_table(
        model_type: ModelType,
        entity_type: impl Into<EntityType>,
        table: String,
        fields: impl IntoIterator<Item = (String, AttributeDescriptor)>,
        relations: impl IntoIterator<Item = RelationDescriptor>,
        identity_field: impl Into<String>,
    ) -> MappingResult<Self> {
        let entity_type = entity_type.into();
        let identity_field = identity_field.into();

        let mut field_map = BTreeMap::new();
        for (name, descriptor) in fields {
            descriptor.validate(&name)?;
            if field_map.insert(name.clone(), descriptor).is_some() {
                return Err(MappingError::configuration(format!(
                    "{model_type}: field `{name}` declared twice"
                )));
            }
        }

        let relations: Vec<RelationDescriptor> = relations.into_iter().collect();
        let mut relation_names = HashSet::new();
        for relation in &relations {
            relation.validate()?;
            if !relation_names.insert(relation.name()) {
                return Err(MappingError::configuration(format!(
                    "{model_type}: relation `{}` declared twice",
                    relation.name()
                )));
            }
            if field_map.contains_key(relation.name()) {
                return Err(MappingError::configuration(format!(
                    "{model_type}: `{}` is declared both as field and relation",
                    relation.name()
                )));
            }
        }

        let identity = field_map.get(&identity_field).ok_or_else(|| {
            MappingError::configuration(format!(
                "{model_type}: identity field `{identity_field}` is not a declared field"
            ))
        })?;
        if !identity.kind().can_identify() {
            return Err(MappingError::configuration(format!(
                "{model_type}: identity field `{identity_field}` cannot be of kind {}",
                identity.kind()
            )));
        }
        if identity.is_nullable() {
            return Err(MappingError::configuration(format!(
                "{model_type}: identity field `{identity_field}` cannot be nullable"
            )));
        }

        Ok(Self {
            model_type,
            entity_type,
            table,
            fields: field_map,
            relations,
            identity_field,
        })
    }

    /// Fluent construction, standing in for annotation scanning.
    pub fn builder(
        model_type: impl Into<ModelType>,
        entity_type: impl Into<EntityType>,
    ) -> EntityMappingBuilder {
        EntityMappingBuilder {
            model_type: model_type.into(),
            entity_type: entity_type.into(),
            table: None,
            fields: Vec::new(),
            relations: Vec::new(),
            identity_field: None,
        }
    }

    pub fn model_type(&self) -> &ModelType {
        &self.model_type
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &BTreeMap<String, AttributeDescriptor> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.fields.get(name)
    }

    pub fn relations(&self) -> &[RelationDescriptor] {
        &self.relations
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.name() == name)
    }

    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }
}

/// Builder returned by [`EntityMapping::builder`].
#[derive(Debug, Clone)]
pub struct EntityMappingBuilder {
    model_type: ModelType,
    entity_type: EntityType,
    table: Option<String>,
    fields: Vec<(String, AttributeDescriptor)>,
    relations: Vec<RelationDescriptor>,
    identity_field: Option<String>,
}

impl EntityMappingBuilder {
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, descriptor: AttributeDescriptor) -> Self {
        self.fields.push((name.into(), descriptor));
        self
    }

    /// Declare the identity field together with its descriptor.
    pub fn id(mut self, name: impl Into<String>, descriptor: AttributeDescriptor) -> Self {
        let name = name.into();
        self.identity_field = Some(name.clone());
        self.fields.push((name, descriptor));
        self
    }

    pub fn relation(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn build(self) -> MappingResult<EntityMapping> {
        let identity_field = self.identity_field.ok_or_else(|| {
            MappingError::configuration(format!("{}: no identity field declared", self.model_type))
        })?;
        let table = self
            .table
            .unwrap_or_else(|| self.model_type.as_str().to_lowercase());
        EntityMapping::with_table(
            self.model_type,
            self.entity_type,
            table,
            self.fields,
            self.relations,
            identity_field,
        )
    }
}
