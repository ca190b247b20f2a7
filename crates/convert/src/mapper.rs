//! The conversion engine.
//!
//! A conversion walks the source arena breadth-first. Every source node is
//! allocated in the target arena the first time it is reached and recorded in
//! a visited table keyed by `(persistence type, identity)`; reaching it again
//! (through a cycle or a second path) yields the same target handle. Relations
//! are filled in afterwards, so a cycle is just two handles pointing at each
//! other.
//!
//! Several source instances may carry the same identity. They share one
//! target node; relations are taken from the first instance that has them
//! loaded, and a later instance only fills relations still missing.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use datamapper_core::{IdentityKey, MappingError, MappingResult, ModelType, Value};
use datamapper_mapping::{AttributeDescriptor, Cardinality, EntityMapping, MappingRegistry, RelationDescriptor};

use crate::arena::{Arena, Handle};
use crate::collection::Collection;
use crate::config::{MapperConfig, UnknownFieldPolicy};
use crate::graph::{
    DomainCollection, DomainEntity, EntityGraph, EntityRef, GraphNode, Model, ModelCollection,
    ModelGraph, ModelRef, Related, entity_from_parts, model_from_parts,
};

/// Result of a conversion: a fresh graph and the converted root within it.
#[derive(Debug, Clone)]
pub struct Converted<N, T> {
    pub graph: Arena<N>,
    pub root: T,
}

impl<N> Converted<N, Handle<N>> {
    /// The converted root node.
    pub fn node(&self) -> &N {
        &self.graph[self.root]
    }
}

/// Converts between persistence models and domain entities using an
/// immutable [`MappingRegistry`].
///
/// `Mapper` is cheap to clone and safe to share across threads; each call
/// keeps its own visited table.
#[derive(Debug, Clone)]
pub struct Mapper {
    registry: Arc<MappingRegistry>,
    config: MapperConfig,
}

impl Mapper {
    pub fn new(registry: Arc<MappingRegistry>) -> Self {
        Self::with_config(registry, MapperConfig::default())
    }

    pub fn with_config(registry: Arc<MappingRegistry>, config: MapperConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Convert one model (and everything reachable through loaded relations)
    /// into a domain entity.
    pub fn to_domain_entity(
        &self,
        models: &ModelGraph,
        model: ModelRef,
    ) -> MappingResult<Converted<DomainEntity, EntityRef>> {
        let mut session = Session::<ToDomain>::new(&self.registry, &self.config, models);
        let root = session.visit(model)?;
        let graph = session.finish()?;
        tracing::debug!(nodes = graph.len(), "converted model graph to domain graph");
        Ok(Converted { graph, root })
    }

    /// Convert a model collection, keeping its keys and iteration order.
    pub fn to_domain_collection(
        &self,
        models: &ModelGraph,
        collection: &ModelCollection,
    ) -> MappingResult<Converted<DomainEntity, DomainCollection>> {
        let mut session = Session::<ToDomain>::new(&self.registry, &self.config, models);
        let mut root = Collection::with_capacity(collection.len());
        for (key, &model) in collection {
            root.put(key.clone(), session.visit(model)?);
        }
        let graph = session.finish()?;
        tracing::debug!(
            items = root.len(),
            nodes = graph.len(),
            "converted model collection to domain collection"
        );
        Ok(Converted { graph, root })
    }

    /// Convert one domain entity back into a persistence model.
    ///
    /// Models whose identity is present come back marked as existing (update);
    /// the others are new rows (insert) and, by default, omit `auto_increment`
    /// fields.
    pub fn to_model_entity(
        &self,
        entities: &EntityGraph,
        entity: EntityRef,
    ) -> MappingResult<Converted<Model, ModelRef>> {
        let mut session = Session::<ToModel>::new(&self.registry, &self.config, entities);
        let root = session.visit(entity)?;
        let graph = session.finish()?;
        tracing::debug!(nodes = graph.len(), "converted domain graph to model graph");
        Ok(Converted { graph, root })
    }

    /// Convert a domain collection back into a model collection, keeping its
    /// keys and iteration order.
    pub fn from_domain_collection(
        &self,
        entities: &EntityGraph,
        collection: &DomainCollection,
    ) -> MappingResult<Converted<Model, ModelCollection>> {
        let mut session = Session::<ToModel>::new(&self.registry, &self.config, entities);
        let mut root = Collection::with_capacity(collection.len());
        for (key, &entity) in collection {
            root.put(key.clone(), session.visit(entity)?);
        }
        let graph = session.finish()?;
        tracing::debug!(
            items = root.len(),
            nodes = graph.len(),
            "converted domain collection to model collection"
        );
        Ok(Converted { graph, root })
    }

    /// Check every declared field of one entity against its descriptor.
    ///
    /// A missing field is accepted only if it is nullable or auto-increment.
    pub fn validate_entity(&self, entities: &EntityGraph, entity: EntityRef) -> MappingResult<()> {
        let node = entities
            .get(entity)
            .ok_or_else(|| MappingError::malformed(format!("dangling entity handle {entity:?}")))?;
        let mapping = self.registry.lookup_by_domain_type(node.entity_type())?;

        for (name, descriptor) in mapping.fields() {
            match node.field(name) {
                Some(value) => descriptor.check_value(name, value)?,
                None if descriptor.is_nullable() || descriptor.is_auto_increment() => {}
                None => {
                    return Err(MappingError::validation(format!(
                        "{}: required field `{name}` is missing",
                        mapping.entity_type()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One direction of conversion.
trait Conversion {
    type Source: GraphNode;
    type Target: GraphNode;

    /// Mapping of a source node.
    fn mapping<'r>(registry: &'r MappingRegistry, node: &Self::Source) -> MappingResult<&'r EntityMapping>;

    /// Whether `node` is an instance of the relation's declared target.
    fn is_target(registry: &MappingRegistry, relation: &RelationDescriptor, node: &Self::Source) -> bool;

    fn skip_field(config: &MapperConfig, descriptor: &AttributeDescriptor, has_identity: bool) -> bool;

    fn create(mapping: &EntityMapping, values: BTreeMap<String, Value>, has_identity: bool) -> Self::Target;

    fn link(node: &mut Self::Target, name: &str, related: Related<Handle<Self::Target>>);
}

struct ToDomain;

impl Conversion for ToDomain {
    type Source = Model;
    type Target = DomainEntity;

    fn mapping<'r>(registry: &'r MappingRegistry, node: &Model) -> MappingResult<&'r EntityMapping> {
        registry.lookup_by_persistence_type(node.model_type())
    }

    fn is_target(_registry: &MappingRegistry, relation: &RelationDescriptor, node: &Model) -> bool {
        node.model_type() == relation.target()
    }

    fn skip_field(_config: &MapperConfig, _descriptor: &AttributeDescriptor, _has_identity: bool) -> bool {
        false
    }

    fn create(mapping: &EntityMapping, values: BTreeMap<String, Value>, _has_identity: bool) -> DomainEntity {
        entity_from_parts(mapping.entity_type().clone(), values)
    }

    fn link(node: &mut DomainEntity, name: &str, related: Related<EntityRef>) {
        node.set_relation(name, related);
    }
}

struct ToModel;

impl Conversion for ToModel {
    type Source = DomainEntity;
    type Target = Model;

    fn mapping<'r>(registry: &'r MappingRegistry, node: &DomainEntity) -> MappingResult<&'r EntityMapping> {
        registry.lookup_by_domain_type(node.entity_type())
    }

    fn is_target(registry: &MappingRegistry, relation: &RelationDescriptor, node: &DomainEntity) -> bool {
        registry
            .lookup_by_persistence_type(relation.target())
            .is_ok_and(|target| target.entity_type() == node.entity_type())
    }

    fn skip_field(config: &MapperConfig, descriptor: &AttributeDescriptor, has_identity: bool) -> bool {
        config.skip_auto_increment_on_insert && descriptor.is_auto_increment() && !has_identity
    }

    fn create(mapping: &EntityMapping, values: BTreeMap<String, Value>, has_identity: bool) -> Model {
        model_from_parts(mapping.model_type().clone(), values, has_identity)
    }

    fn link(node: &mut Model, name: &str, related: Related<ModelRef>) {
        node.set_relation(name, related);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum VisitKey {
    Identity(ModelType, IdentityKey),
    /// Source node without an identity yet; only the same instance matches.
    Instance(usize),
}

/// State of one top-level conversion call.
struct Session<'a, D: Conversion> {
    registry: &'a MappingRegistry,
    config: &'a MapperConfig,
    source: &'a Arena<D::Source>,
    target: Arena<D::Target>,
    visited: HashMap<VisitKey, Handle<D::Target>>,
    /// Source instances already queued for relation resolution.
    sources: HashSet<Handle<D::Source>>,
    pending: VecDeque<(Handle<D::Source>, Handle<D::Target>)>,
}

impl<'a, D: Conversion> Session<'a, D> {
    fn new(registry: &'a MappingRegistry, config: &'a MapperConfig, source: &'a Arena<D::Source>) -> Self {
        Self {
            registry,
            config,
            source,
            target: Arena::new(),
            visited: HashMap::new(),
            sources: HashSet::new(),
            pending: VecDeque::new(),
        }
    }

    fn node(&self, handle: Handle<D::Source>) -> MappingResult<&'a D::Source> {
        self.source
            .get(handle)
            .ok_or_else(|| MappingError::malformed(format!("dangling handle {handle:?}")))
    }

    /// Allocate (or look up) the target node for `handle`, copying scalars.
    /// Relations are resolved later by `finish`.
    fn visit(&mut self, handle: Handle<D::Source>) -> MappingResult<Handle<D::Target>> {
        let node = self.node(handle)?;
        let mapping = D::mapping(self.registry, node)?;

        let identity = node
            .values()
            .get(mapping.identity_field())
            .and_then(Value::identity_key);
        let has_identity = identity.is_some();
        let key = match identity {
            Some(id) => VisitKey::Identity(mapping.model_type().clone(), id),
            None => VisitKey::Instance(handle.index()),
        };
        if let Some(&existing) = self.visited.get(&key) {
            if !node.links().is_empty() && self.sources.insert(handle) {
                self.pending.push_back((handle, existing));
            }
            return Ok(existing);
        }

        self.check_undeclared(mapping, node)?;

        let mut values = BTreeMap::new();
        for (name, descriptor) in mapping.fields() {
            let Some(value) = node.values().get(name) else {
                continue;
            };
            if D::skip_field(self.config, descriptor, has_identity) {
                continue;
            }
            values.insert(name.clone(), value.clone());
        }

        let created = self.target.insert(D::create(mapping, values, has_identity));
        self.visited.insert(key, created);
        self.sources.insert(handle);
        self.pending.push_back((handle, created));
        Ok(created)
    }

    fn check_undeclared(&self, mapping: &EntityMapping, node: &D::Source) -> MappingResult<()> {
        let unknown_values = node
            .values()
            .keys()
            .filter(|name| mapping.field(name).is_none());
        let unknown_links = node
            .links()
            .keys()
            .filter(|name| mapping.relation(name).is_none());

        for name in unknown_values.chain(unknown_links) {
            match self.config.unknown_fields {
                UnknownFieldPolicy::Reject => {
                    return Err(MappingError::malformed(format!(
                        "{}: `{name}` is not declared in the mapping",
                        mapping.model_type()
                    )));
                }
                UnknownFieldPolicy::Ignore => {
                    tracing::warn!(
                        model_type = %mapping.model_type(),
                        field = %name,
                        "ignoring undeclared field"
                    );
                }
            }
        }
        Ok(())
    }

    fn visit_related(
        &mut self,
        mapping: &EntityMapping,
        relation: &RelationDescriptor,
        handle: Handle<D::Source>,
    ) -> MappingResult<Handle<D::Target>> {
        let node = self.node(handle)?;
        if !D::is_target(self.registry, relation, node) {
            let found = D::mapping(self.registry, node)
                .map(|m| m.model_type().to_string())
                .unwrap_or_else(|_| "an unmapped type".to_string());
            return Err(MappingError::malformed(format!(
                "{}.{} expects {}, found {found}",
                mapping.model_type(),
                relation.name(),
                relation.target()
            )));
        }
        self.visit(handle)
    }

    /// Resolve relations of every allocated node until the queue is empty,
    /// then hand over the target arena.
    fn finish(mut self) -> MappingResult<Arena<D::Target>> {
        while let Some((source, target)) = self.pending.pop_front() {
            let node = self.node(source)?;
            let mapping = D::mapping(self.registry, node)?;

            for relation in mapping.relations() {
                let Some(related) = node.links().get(relation.name()) else {
                    continue;
                };
                if self.target[target].links().contains_key(relation.name()) {
                    tracing::warn!(
                        model_type = %mapping.model_type(),
                        relation = %relation.name(),
                        "relation already loaded from another instance with the same identity; ignoring"
                    );
                    continue;
                }
                let converted = match (relation.cardinality(), related) {
                    (Cardinality::One, Related::One(None)) => Related::One(None),
                    (Cardinality::One, Related::One(Some(handle))) => {
                        Related::One(Some(self.visit_related(mapping, relation, *handle)?))
                    }
                    (Cardinality::Many, Related::Many(items)) => {
                        let mut out = Collection::with_capacity(items.len());
                        for (key, &handle) in items {
                            out.put(key.clone(), self.visit_related(mapping, relation, handle)?);
                        }
                        Related::Many(out)
                    }
                    (expected, _) => {
                        return Err(MappingError::malformed(format!(
                            "{}.{}: expected a {expected:?} relation value",
                            mapping.model_type(),
                            relation.name()
                        )));
                    }
                };
                D::link(&mut self.target[target], relation.name(), converted);
            }
        }
        Ok(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datamapper_core::EntityType;
    use datamapper_mapping::{JoinTable, RegistryBuilder};
    use proptest::prelude::*;

    use crate::collection::CollectionKey;

    fn registry() -> Arc<MappingRegistry> {
        let mut builder = RegistryBuilder::new();
        builder
            .register(
                EntityMapping::builder("UserModel", "User")
                    .table("users")
                    .id("id", AttributeDescriptor::string())
                    .field("email", AttributeDescriptor::string())
                    .field("age", AttributeDescriptor::small_integer().unsigned().nullable())
                    .relation(
                        RelationDescriptor::many("followers", "UserModel")
                            .mapped_by("following")
                            .self_referencing(),
                    )
                    .relation(
                        RelationDescriptor::many("following", "UserModel")
                            .inversed_by("followers")
                            .self_referencing()
                            .join_table(JoinTable::new("followers", "user_id", "following_user_id")),
                    )
                    .relation(RelationDescriptor::many("posts", "PostModel").mapped_by("author"))
                    .build()
                    .unwrap(),
            )
            .unwrap()
            .register(
                EntityMapping::builder("PostModel", "Post")
                    .table("posts")
                    .id("id", AttributeDescriptor::integer().auto_increment())
                    .field("body", AttributeDescriptor::text())
                    .relation(RelationDescriptor::one("author", "UserModel").inversed_by("posts"))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        Arc::new(builder.build().unwrap())
    }

    fn user(id: &str) -> Model {
        Model::new("UserModel")
            .with_attribute("id", id)
            .with_attribute("email", format!("{id}@example.com"))
            .persisted()
    }

    /// Two users following each other, fully loaded on both sides.
    fn mutual_follow() -> (ModelGraph, ModelRef, ModelRef) {
        let mut models = ModelGraph::new();
        let a = models.insert(user("a"));
        let b = models.insert(user("b"));
        let follow = |target: ModelRef| Related::Many([target].into_iter().collect());
        models[a].set_relation("following", follow(b));
        models[a].set_relation("followers", follow(b));
        models[b].set_relation("following", follow(a));
        models[b].set_relation("followers", follow(a));
        (models, a, b)
    }

    #[test]
    fn scalars_are_copied_verbatim() {
        let mut models = ModelGraph::new();
        let a = models.insert(user("a").with_attribute("age", 30i16));

        let out = Mapper::new(registry()).to_domain_entity(&models, a).unwrap();
        let entity = out.node();
        assert_eq!(entity.entity_type(), &EntityType::from("User"));
        assert_eq!(entity.field("email"), Some(&Value::from("a@example.com")));
        assert_eq!(entity.field("age"), Some(&Value::Integer(30)));
        assert!(entity.relations().is_empty());
    }

    #[test]
    fn cycles_resolve_to_a_single_instance_per_identity() {
        let (models, a, _) = mutual_follow();
        let out = Mapper::new(registry()).to_domain_entity(&models, a).unwrap();

        assert_eq!(out.graph.len(), 2);
        let a_entity = out.node();
        let b_ref = a_entity.related_many("following").unwrap().values().next().copied().unwrap();
        let back = out.graph[b_ref]
            .related_many("followers")
            .unwrap()
            .values()
            .next()
            .copied()
            .unwrap();
        assert_eq!(back, out.root);
        assert_eq!(a_entity.related_many("followers").unwrap().get_index(0).unwrap().1, &b_ref);
    }

    #[test]
    fn duplicate_source_instances_with_one_identity_share_a_target() {
        let mut models = ModelGraph::new();
        let a1 = models.insert(user("a"));
        let a2 = models.insert(user("a"));
        let collection: ModelCollection = [a1, a2].into_iter().collect();

        let out = Mapper::new(registry()).to_domain_collection(&models, &collection).unwrap();
        assert_eq!(out.graph.len(), 1);
        assert_eq!(out.root.get_index(0).unwrap().1, out.root.get_index(1).unwrap().1);
    }

    #[test]
    fn later_instance_fills_relations_the_first_did_not_load() {
        let mut models = ModelGraph::new();
        let bare = models.insert(user("a"));
        let loaded = models.insert(user("a"));
        let b = models.insert(user("b"));
        models[loaded].set_relation("following", Related::Many([b].into_iter().collect()));
        let collection: ModelCollection = [bare, loaded].into_iter().collect();

        let out = Mapper::new(registry()).to_domain_collection(&models, &collection).unwrap();
        assert_eq!(out.graph.len(), 2);
        let a = *out.root.get_index(0).unwrap().1;
        let following: Vec<_> = out.graph[a]
            .related_many("following")
            .unwrap()
            .values()
            .map(|&e| out.graph[e].field("id").cloned())
            .collect();
        assert_eq!(following, vec![Some(Value::from("b"))]);
    }

    #[test]
    fn first_loaded_instance_wins_a_conflicting_relation() {
        let mut models = ModelGraph::new();
        let first = models.insert(user("a"));
        let second = models.insert(user("a"));
        let b = models.insert(user("b"));
        let c = models.insert(user("c"));
        models[first].set_relation("following", Related::Many([b].into_iter().collect()));
        models[second].set_relation("following", Related::Many([c].into_iter().collect()));
        let collection: ModelCollection = [first, second].into_iter().collect();

        let out = Mapper::new(registry()).to_domain_collection(&models, &collection).unwrap();
        let a = *out.root.get_index(0).unwrap().1;
        let following: Vec<_> = out.graph[a]
            .related_many("following")
            .unwrap()
            .values()
            .map(|&e| out.graph[e].field("id").cloned())
            .collect();
        assert_eq!(following, vec![Some(Value::from("b"))]);
        // `c` is reachable only through the ignored instance.
        assert_eq!(out.graph.len(), 2);
    }

    #[test]
    fn collection_order_and_keys_are_preserved() {
        let mut models = ModelGraph::new();
        let mut collection = ModelCollection::new();
        for id in ["c", "a", "b"] {
            let handle = models.insert(user(id));
            collection.put(id, handle);
        }

        let out = Mapper::new(registry()).to_domain_collection(&models, &collection).unwrap();
        let ids: Vec<_> = out
            .root
            .iter()
            .map(|(key, &e)| (key.to_string(), out.graph[e].field("id").cloned().unwrap()))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("c".to_string(), Value::from("c")),
                ("a".to_string(), Value::from("a")),
                ("b".to_string(), Value::from("b")),
            ]
        );
    }

    #[test]
    fn unmapped_type_fails_without_partial_result() {
        let mut models = ModelGraph::new();
        let ghost = models.insert(Model::new("GhostModel").with_attribute("id", 1));
        let err = Mapper::new(registry()).to_domain_entity(&models, ghost).unwrap_err();
        assert!(matches!(err, MappingError::UnmappedType(_)));
    }

    #[test]
    fn relation_to_wrong_type_is_malformed() {
        let mut models = ModelGraph::new();
        let a = models.insert(user("a"));
        let b = models.insert(user("b"));
        models[a].set_relation("posts", Related::Many([b].into_iter().collect()));

        let err = Mapper::new(registry()).to_domain_entity(&models, a).unwrap_err();
        assert!(matches!(err, MappingError::MalformedGraph(_)));
    }

    #[test]
    fn cardinality_shape_mismatch_is_malformed() {
        let mut models = ModelGraph::new();
        let a = models.insert(user("a"));
        let b = models.insert(user("b"));
        models[a].set_relation("following", Related::One(Some(b)));

        let err = Mapper::new(registry()).to_domain_entity(&models, a).unwrap_err();
        assert!(matches!(err, MappingError::MalformedGraph(_)));
    }

    #[test]
    fn dangling_handle_is_malformed() {
        let (big, _, b) = mutual_follow();
        let mut models = ModelGraph::new();
        let a = models.insert(user("a"));
        models[a].set_relation("following", Related::Many([b].into_iter().collect()));
        drop(big);

        let err = Mapper::new(registry()).to_domain_entity(&models, a).unwrap_err();
        assert!(matches!(err, MappingError::MalformedGraph(_)));
    }

    #[test]
    fn null_single_relation_propagates_as_none() {
        let mut models = ModelGraph::new();
        let post = models.insert(
            Model::new("PostModel")
                .with_attribute("id", 1)
                .with_attribute("body", "hello")
                .persisted(),
        );
        models[post].set_relation("author", Related::One(None));

        let out = Mapper::new(registry()).to_domain_entity(&models, post).unwrap();
        assert_eq!(out.node().relation("author"), Some(&Related::One(None)));
        assert_eq!(out.node().related_one("author"), None);
    }

    #[test]
    fn undeclared_attributes_follow_policy() {
        let mut models = ModelGraph::new();
        let a = models.insert(user("a").with_attribute("remember_token", "secret"));

        let lenient = Mapper::new(registry()).to_domain_entity(&models, a).unwrap();
        assert_eq!(lenient.node().field("remember_token"), None);

        let strict = Mapper::with_config(
            registry(),
            MapperConfig {
                unknown_fields: UnknownFieldPolicy::Reject,
                ..MapperConfig::default()
            },
        );
        assert!(matches!(
            strict.to_domain_entity(&models, a),
            Err(MappingError::MalformedGraph(_))
        ));
    }

    #[test]
    fn round_trip_preserves_fields_relations_and_existence() {
        let (models, a, b) = mutual_follow();
        let mapper = Mapper::new(registry());

        let domain = mapper.to_domain_entity(&models, a).unwrap();
        let back = mapper.to_model_entity(&domain.graph, domain.root).unwrap();

        let original = &models[a];
        let restored = back.node();
        assert_eq!(restored.model_type(), original.model_type());
        assert_eq!(restored.attributes(), original.attributes());
        assert!(restored.exists());

        let b_back = back.graph[back.root]
            .relation("following")
            .unwrap()
            .handles()[0];
        assert_eq!(back.graph[b_back].attributes(), models[b].attributes());
        assert_eq!(back.graph.len(), 2);
    }

    #[test]
    fn new_entities_skip_auto_increment_fields() {
        let mut entities = EntityGraph::new();
        let post = entities.insert(
            DomainEntity::new("Post")
                .with_field("id", Value::Null)
                .with_field("body", "draft"),
        );

        let mapper = Mapper::new(registry());
        let model = mapper.to_model_entity(&entities, post).unwrap();
        assert!(!model.node().exists());
        assert_eq!(model.node().attribute("id"), None);
        assert_eq!(model.node().attribute("body"), Some(&Value::from("draft")));

        let keep = Mapper::with_config(
            registry(),
            MapperConfig {
                skip_auto_increment_on_insert: false,
                ..MapperConfig::default()
            },
        );
        let model = keep.to_model_entity(&entities, post).unwrap();
        assert_eq!(model.node().attribute("id"), Some(&Value::Null));
    }

    #[test]
    fn persisted_entities_keep_auto_increment_identity() {
        let mut entities = EntityGraph::new();
        let post = entities.insert(DomainEntity::new("Post").with_field("id", 42).with_field("body", "x"));

        let model = Mapper::new(registry()).to_model_entity(&entities, post).unwrap();
        assert!(model.node().exists());
        assert_eq!(model.node().attribute("id"), Some(&Value::Integer(42)));
    }

    #[test]
    fn domain_relation_to_wrong_entity_type_is_malformed() {
        let mut entities = EntityGraph::new();
        let post = entities.insert(DomainEntity::new("Post").with_field("id", 1).with_field("body", "x"));
        let other = entities.insert(DomainEntity::new("Post").with_field("id", 2).with_field("body", "y"));
        entities[post].set_relation("author", Related::One(Some(other)));

        let err = Mapper::new(registry()).to_model_entity(&entities, post).unwrap_err();
        assert!(matches!(err, MappingError::MalformedGraph(_)));
    }

    #[test]
    fn from_domain_collection_preserves_order() {
        let mut entities = EntityGraph::new();
        let mut collection = DomainCollection::new();
        for id in ["z", "y"] {
            let e = entities.insert(DomainEntity::new("User").with_field("id", id).with_field("email", "e"));
            collection.push(e);
        }

        let out = Mapper::new(registry()).from_domain_collection(&entities, &collection).unwrap();
        let ids: Vec<_> = out.root.values().map(|&m| out.graph[m].attribute("id").cloned()).collect();
        assert_eq!(ids, vec![Some(Value::from("z")), Some(Value::from("y"))]);
    }

    #[test]
    fn validate_entity_checks_descriptors() {
        let mapper = Mapper::new(registry());
        let mut entities = EntityGraph::new();
        let ok = entities.insert(DomainEntity::new("User").with_field("id", "a").with_field("email", "a@x"));
        let too_old = entities.insert(
            DomainEntity::new("User")
                .with_field("id", "b")
                .with_field("email", "b@x")
                .with_field("age", 70000),
        );
        let missing = entities.insert(DomainEntity::new("User").with_field("id", "c"));

        assert!(mapper.validate_entity(&entities, ok).is_ok());
        assert!(matches!(
            mapper.validate_entity(&entities, too_old),
            Err(MappingError::Validation(_))
        ));
        assert!(matches!(
            mapper.validate_entity(&entities, missing),
            Err(MappingError::Validation(_))
        ));
    }

    #[test]
    fn concurrent_conversions_share_the_registry() {
        let mapper = Mapper::new(registry());
        let (models, a, _) = mutual_follow();
        let models = Arc::new(models);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mapper = mapper.clone();
                let models = Arc::clone(&models);
                std::thread::spawn(move || mapper.to_domain_entity(&models, a).map(|c| c.graph.len()))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok(2));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: model -> domain -> model returns the same attributes and
        /// the same follow edges for arbitrary (possibly cyclic) follow graphs.
        #[test]
        fn random_follow_graphs_round_trip(
            size in 1usize..8,
            edges in prop::collection::vec((0usize..8, 0usize..8), 0..24)
        ) {
            let mut models = ModelGraph::new();
            let handles: Vec<_> = (0..size).map(|i| models.insert(user(&format!("u{i}")))).collect();
            let mut following: Vec<ModelCollection> = vec![Collection::new(); size];
            for (from, to) in edges {
                let (from, to) = (from % size, to % size);
                following[from].put(to, handles[to]);
            }
            for (i, items) in following.into_iter().enumerate() {
                models[handles[i]].set_relation("following", Related::Many(items));
            }
            let roots: ModelCollection = handles.iter().copied().collect();

            let mapper = Mapper::new(registry());
            let domain = mapper.to_domain_collection(&models, &roots).unwrap();
            let back = mapper.from_domain_collection(&domain.graph, &domain.root).unwrap();

            prop_assert_eq!(back.graph.len(), size);
            for ((_, &original), (_, &restored)) in roots.iter().zip(back.root.iter()) {
                let source = &models[original];
                let target = &back.graph[restored];
                prop_assert_eq!(source.attributes(), target.attributes());

                let ids = |graph: &ModelGraph, model: &Model| -> Vec<(CollectionKey, Option<Value>)> {
                    model
                        .relation("following")
                        .map(|r| match r {
                            Related::Many(items) => items
                                .iter()
                                .map(|(k, &h)| (k.clone(), graph[h].attribute("id").cloned()))
                                .collect(),
                            Related::One(_) => Vec::new(),
                        })
                        .unwrap_or_default()
                };
                prop_assert_eq!(ids(&models, source), ids(&back.graph, target));
            }
        }
    }
}
