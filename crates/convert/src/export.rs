//! JSON export of a domain graph.
//!
//! Each entity is written once. Later occurrences (cycles, shared targets)
//! are written as `{"$ref": "<entity type>", "id": <identity>}`.
//!
//! The walk is depth-first over an explicit stack of frames, so graph depth is
//! bounded by memory, not by the thread stack.

use std::collections::{HashSet, VecDeque};

use datamapper_core::{MappingError, MappingResult};
use serde_json::{Map, Value as Json};

use crate::graph::{EntityGraph, EntityRef, Related};
use crate::mapper::Mapper;

/// A relation whose targets are still being rendered.
struct PendingRelation {
    name: String,
    many: bool,
    targets: VecDeque<EntityRef>,
    rendered: Vec<Json>,
}

/// An entity object under construction.
struct Frame {
    object: Map<String, Json>,
    relations: VecDeque<PendingRelation>,
}

impl Frame {
    /// Next target to render, closing finished relations on the way.
    fn next_target(&mut self) -> Option<EntityRef> {
        loop {
            let relation = self.relations.front_mut()?;
            if let Some(target) = relation.targets.pop_front() {
                return Some(target);
            }
            let relation = self.relations.pop_front()?;
            let value = if relation.many {
                Json::Array(relation.rendered)
            } else {
                relation.rendered.into_iter().next().unwrap_or(Json::Null)
            };
            self.object.insert(relation.name, value);
        }
    }

    /// Attach a rendered target to the relation `next_target` returned it for.
    fn accept(&mut self, rendered: Json) {
        if let Some(relation) = self.relations.front_mut() {
            relation.rendered.push(rendered);
        }
    }

    fn finish(self) -> Json {
        Json::Object(self.object)
    }
}

enum Opened {
    Rendered(Json),
    Expand(Frame),
}

impl Mapper {
    /// Render the entity reachable from `root` as a JSON tree.
    ///
    /// The nesting of the result follows the first path to each entity, so a
    /// long chain yields an equally deep `serde_json::Value`.
    pub fn to_json(&self, entities: &EntityGraph, root: EntityRef) -> MappingResult<Json> {
        let mut seen = HashSet::new();
        let mut current = match self.open(entities, root, &mut seen)? {
            Opened::Rendered(json) => return Ok(json),
            Opened::Expand(frame) => frame,
        };
        let mut parents: Vec<Frame> = Vec::new();

        loop {
            match current.next_target() {
                Some(target) => match self.open(entities, target, &mut seen)? {
                    Opened::Rendered(json) => current.accept(json),
                    Opened::Expand(child) => parents.push(std::mem::replace(&mut current, child)),
                },
                None => match parents.pop() {
                    Some(parent) => {
                        let done = std::mem::replace(&mut current, parent);
                        current.accept(done.finish());
                    }
                    None => return Ok(current.finish()),
                },
            }
        }
    }

    /// Start rendering `handle`: a reference if it was written before,
    /// otherwise a frame with its fields filled in.
    fn open(
        &self,
        entities: &EntityGraph,
        handle: EntityRef,
        seen: &mut HashSet<EntityRef>,
    ) -> MappingResult<Opened> {
        let node = entities
            .get(handle)
            .ok_or_else(|| MappingError::malformed(format!("dangling entity handle {handle:?}")))?;
        let mapping = self.registry().lookup_by_domain_type(node.entity_type())?;

        if !seen.insert(handle) {
            let id = node
                .field(mapping.identity_field())
                .map(|v| v.to_json())
                .unwrap_or(Json::Null);
            let mut reference = Map::new();
            reference.insert("$ref".to_string(), Json::String(node.entity_type().to_string()));
            reference.insert("id".to_string(), id);
            return Ok(Opened::Rendered(Json::Object(reference)));
        }

        let mut object = Map::new();
        for (name, value) in node.fields() {
            object.insert(name.clone(), value.to_json());
        }
        let mut relations = VecDeque::new();
        for (name, related) in node.relations() {
            let (many, targets) = match related {
                Related::One(None) => {
                    object.insert(name.clone(), Json::Null);
                    continue;
                }
                Related::One(Some(target)) => (false, VecDeque::from([*target])),
                Related::Many(items) => (true, items.values().copied().collect()),
            };
            relations.push_back(PendingRelation {
                name: name.clone(),
                many,
                rendered: Vec::with_capacity(targets.len()),
                targets,
            });
        }
        Ok(Opened::Expand(Frame { object, relations }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use datamapper_mapping::{AttributeDescriptor, EntityMapping, MappingRegistry, RelationDescriptor};
    use serde_json::json;

    use crate::graph::DomainEntity;

    use super::*;

    fn mapper() -> Mapper {
        let mut builder = MappingRegistry::builder();
        builder
            .register(
                EntityMapping::builder("UserModel", "User")
                    .id("id", AttributeDescriptor::integer())
                    .field("name", AttributeDescriptor::string())
                    .relation(RelationDescriptor::one("best_friend", "UserModel").self_referencing())
                    .relation(RelationDescriptor::one("next", "UserModel").self_referencing())
                    .relation(RelationDescriptor::many("friends", "UserModel").self_referencing())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        Mapper::new(Arc::new(builder.build().unwrap()))
    }

    fn person(graph: &mut EntityGraph, id: i64, name: &str) -> EntityRef {
        graph.insert(DomainEntity::new("User").with_field("id", id).with_field("name", name))
    }

    #[test]
    fn cycles_render_as_references() {
        let mut graph = EntityGraph::new();
        let a = person(&mut graph, 1, "ann");
        let b = person(&mut graph, 2, "bob");
        graph[a].set_relation("best_friend", Related::One(Some(b)));
        graph[b].set_relation("best_friend", Related::One(Some(a)));
        graph[b].set_relation("friends", Related::Many(Default::default()));

        let rendered = mapper().to_json(&graph, a).unwrap();
        assert_eq!(
            rendered,
            json!({
                "id": 1,
                "name": "ann",
                "best_friend": {
                    "id": 2,
                    "name": "bob",
                    "best_friend": {"$ref": "User", "id": 1},
                    "friends": []
                }
            })
        );
    }

    #[test]
    fn shared_target_is_expanded_once_then_referenced() {
        let mut graph = EntityGraph::new();
        let root = person(&mut graph, 1, "ann");
        let left = person(&mut graph, 2, "bob");
        let right = person(&mut graph, 3, "cy");
        let shared = person(&mut graph, 4, "dee");
        graph[root].set_relation("friends", Related::Many([left, right].into_iter().collect()));
        graph[left].set_relation("best_friend", Related::One(Some(shared)));
        graph[right].set_relation("best_friend", Related::One(Some(shared)));

        let rendered = mapper().to_json(&graph, root).unwrap();
        assert_eq!(
            rendered,
            json!({
                "id": 1,
                "name": "ann",
                "friends": [
                    {"id": 2, "name": "bob", "best_friend": {"id": 4, "name": "dee"}},
                    {"id": 3, "name": "cy", "best_friend": {"$ref": "User", "id": 4}}
                ]
            })
        );
    }

    #[test]
    fn long_chains_do_not_exhaust_the_stack() {
        const LEN: i64 = 100_000;
        let mut graph = EntityGraph::new();
        let handles: Vec<_> = (0..LEN).map(|i| person(&mut graph, i, "link")).collect();
        for pair in handles.windows(2) {
            graph[pair[0]].set_relation("next", Related::One(Some(pair[1])));
        }

        let mut cursor = mapper().to_json(&graph, handles[0]).unwrap();
        let mut depth = 0;
        // Unnest one level at a time so the result is never dropped recursively.
        loop {
            let next = cursor.as_object_mut().and_then(|object| object.remove("next"));
            match next {
                Some(child @ Json::Object(_)) => {
                    cursor = child;
                    depth += 1;
                }
                _ => break,
            }
        }
        assert_eq!(depth, LEN - 1);
        assert_eq!(cursor["id"], json!(LEN - 1));
    }

    #[test]
    fn empty_single_relation_is_null() {
        let mut graph = EntityGraph::new();
        let a = person(&mut graph, 1, "ann");
        graph[a].set_relation("best_friend", Related::One(None));

        let rendered = mapper().to_json(&graph, a).unwrap();
        assert_eq!(rendered["best_friend"], Json::Null);
    }

    #[test]
    fn unmapped_entity_is_an_error() {
        let mut graph = EntityGraph::new();
        let a = graph.insert(DomainEntity::new("Ghost"));
        match mapper().to_json(&graph, a) {
            Err(MappingError::UnmappedType(_)) => {}
            other => panic!("Expected UnmappedType, got {other:?}"),
        }
    }

    #[test]
    fn dangling_target_is_malformed() {
        let mut graph = EntityGraph::new();
        let a = person(&mut graph, 1, "ann");
        let mut other = EntityGraph::new();
        person(&mut other, 9, "x");
        let foreign = person(&mut other, 10, "y");
        graph[a].set_relation("next", Related::One(Some(foreign)));

        assert!(matches!(
            mapper().to_json(&graph, a),
            Err(MappingError::MalformedGraph(_))
        ));
    }
}
