//! Node types of the two graph representations.
//!
//! - [`Model`]: the persistence-side record (attributes, loaded relations and
//!   whether the row already exists).
//! - [`DomainEntity`]: the plain domain-side object.
//!
//! A relation that is missing from a node's relation map is "not loaded" and
//! is carried across conversions as missing.

use std::collections::BTreeMap;

use datamapper_core::{EntityType, ModelType, Value};

use crate::arena::{Arena, Handle};
use crate::collection::Collection;

/// Value of a loaded relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Related<R> {
    One(Option<R>),
    Many(Collection<R>),
}

impl<R: Copy> Related<R> {
    /// Every handle held by the relation, in collection order.
    pub fn handles(&self) -> Vec<R> {
        match self {
            Related::One(r) => r.iter().copied().collect(),
            Related::Many(items) => items.values().copied().collect(),
        }
    }
}

pub type ModelRef = Handle<Model>;
pub type ModelGraph = Arena<Model>;
pub type ModelCollection = Collection<ModelRef>;

pub type EntityRef = Handle<DomainEntity>;
pub type EntityGraph = Arena<DomainEntity>;
pub type DomainCollection = Collection<EntityRef>;

/// Persistence-model instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    model_type: ModelType,
    attributes: BTreeMap<String, Value>,
    relations: BTreeMap<String, Related<ModelRef>>,
    exists: bool,
}

impl Model {
    pub fn new(model_type: impl Into<ModelType>) -> Self {
        Self {
            model_type: model_type.into(),
            attributes: BTreeMap::new(),
            relations: BTreeMap::new(),
            exists: false,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Mark the instance as backed by an existing row.
    pub fn persisted(mut self) -> Self {
        self.exists = true;
        self
    }

    pub fn model_type(&self) -> &ModelType {
        &self.model_type
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn relation(&self, name: &str) -> Option<&Related<ModelRef>> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> &BTreeMap<String, Related<ModelRef>> {
        &self.relations
    }

    pub fn set_relation(&mut self, name: impl Into<String>, related: Related<ModelRef>) {
        self.relations.insert(name.into(), related);
    }

    /// Whether saving this instance updates an existing row.
    pub fn exists(&self) -> bool {
        self.exists
    }
}

/// Plain domain entity.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEntity {
    entity_type: EntityType,
    fields: BTreeMap<String, Value>,
    relations: BTreeMap<String, Related<EntityRef>>,
}

impl DomainEntity {
    pub fn new(entity_type: impl Into<EntityType>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn relation(&self, name: &str) -> Option<&Related<EntityRef>> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> &BTreeMap<String, Related<EntityRef>> {
        &self.relations
    }

    pub fn set_relation(&mut self, name: impl Into<String>, related: Related<EntityRef>) {
        self.relations.insert(name.into(), related);
    }

    /// Target of a loaded single-valued relation.
    pub fn related_one(&self, name: &str) -> Option<EntityRef> {
        match self.relations.get(name) {
            Some(Related::One(target)) => *target,
            _ => None,
        }
    }

    /// Loaded collection-valued relation.
    pub fn related_many(&self, name: &str) -> Option<&DomainCollection> {
        match self.relations.get(name) {
            Some(Related::Many(items)) => Some(items),
            _ => None,
        }
    }
}

/// Read access the engine needs on a source node.
pub(crate) trait GraphNode: Sized {
    fn values(&self) -> &BTreeMap<String, Value>;
    fn links(&self) -> &BTreeMap<String, Related<Handle<Self>>>;
}

impl GraphNode for Model {
    fn values(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    fn links(&self) -> &BTreeMap<String, Related<Handle<Self>>> {
        &self.relations
    }
}

impl GraphNode for DomainEntity {
    fn values(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    fn links(&self) -> &BTreeMap<String, Related<Handle<Self>>> {
        &self.relations
    }
}

pub(crate) fn model_from_parts(
    model_type: ModelType,
    attributes: BTreeMap<String, Value>,
    exists: bool,
) -> Model {
    Model {
        model_type,
        attributes,
        relations: BTreeMap::new(),
        exists,
    }
}

pub(crate) fn entity_from_parts(entity_type: EntityType, fields: BTreeMap<String, Value>) -> DomainEntity {
    DomainEntity {
        entity_type,
        fields,
        relations: BTreeMap::new(),
    }
}
