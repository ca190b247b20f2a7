//! Bridge between typed users and the dynamic domain graph the mapper works on.
//!
//! Only stored state crosses the bridge. Pending events stay on the `User`
//! values and never show up as fields.

use std::collections::HashMap;

use datamapper_convert::{Collection, DomainCollection, DomainEntity, EntityGraph, EntityRef, Related};
use datamapper_core::{DomainError, Entity, EntityType, MappingError, MappingResult, Value};
use uuid::Uuid;

use crate::group::Group;
use crate::social::SocialGraph;
use crate::user::User;
use crate::values::{Email, GroupId, HashedPassword, UserId, Username};

/// Users, groups and the social relations between them.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub social: SocialGraph,
}

fn invalid(err: DomainError) -> MappingError {
    MappingError::validation(err.to_string())
}

/// Build a domain graph holding every user and group of `directory`, linked
/// by their follow, membership and administration edges.
///
/// Users come first in the returned collection, then groups. Every edge
/// touching the directory must lead to a user or group inside it.
pub fn to_entity_graph(directory: &Directory) -> MappingResult<(EntityGraph, DomainCollection)> {
    let Directory { users, groups, social } = directory;
    let mut graph = EntityGraph::new();
    let mut collection = DomainCollection::with_capacity(users.len() + groups.len());
    let mut user_handles: HashMap<UserId, EntityRef> = HashMap::with_capacity(users.len());
    let mut group_handles: HashMap<GroupId, EntityRef> = HashMap::with_capacity(groups.len());

    for user in users {
        let handle = graph.insert(
            DomainEntity::new(User::entity_type())
                .with_field("id", *user.id().as_uuid())
                .with_field("email", user.email().as_str())
                .with_field("username", user.username().as_str())
                .with_field("password", user.password().as_str()),
        );
        if user_handles.insert(*user.id(), handle).is_some() {
            return Err(MappingError::malformed(format!("user {} appears twice", user.id())));
        }
        collection.push(handle);
    }
    for group in groups {
        let handle = graph.insert(
            DomainEntity::new(Group::entity_type())
                .with_field("id", *group.id().as_uuid())
                .with_field("name", group.name()),
        );
        if group_handles.insert(*group.id(), handle).is_some() {
            return Err(MappingError::malformed(format!("group {} appears twice", group.id())));
        }
        collection.push(handle);
    }

    let user_ref = |id: UserId| {
        user_handles
            .get(&id)
            .copied()
            .ok_or_else(|| MappingError::malformed(format!("edge leads to unknown user {id}")))
    };
    let group_ref = |id: GroupId| {
        group_handles
            .get(&id)
            .copied()
            .ok_or_else(|| MappingError::malformed(format!("edge leads to unknown group {id}")))
    };

    let mut links: Vec<(EntityRef, &str, Collection<EntityRef>)> = Vec::new();
    for user in users {
        let id = *user.id();
        let handle = user_ref(id)?;
        links.push((handle, "following", social.following(id).map(user_ref).collect::<MappingResult<_>>()?));
        links.push((handle, "followers", social.followers(id).map(user_ref).collect::<MappingResult<_>>()?));
        links.push((handle, "member_of", social.member_of(id).map(group_ref).collect::<MappingResult<_>>()?));
        links.push((handle, "admin_of", social.admin_of(id).map(group_ref).collect::<MappingResult<_>>()?));
    }
    for group in groups {
        let id = *group.id();
        let handle = group_ref(id)?;
        links.push((handle, "members", social.members(id).map(user_ref).collect::<MappingResult<_>>()?));
        links.push((handle, "admins", social.admins(id).map(user_ref).collect::<MappingResult<_>>()?));
    }
    for (handle, name, targets) in links {
        graph[handle].set_relation(name, Related::Many(targets));
    }

    tracing::debug!(users = users.len(), groups = groups.len(), "built identity entity graph");
    Ok((graph, collection))
}

/// Read users, groups and their edges back out of a domain graph.
///
/// Users and groups come back in collection order, users with no pending
/// events. Edges are taken from whichever side has the relation loaded, so a
/// graph loaded from only one side still yields every edge.
pub fn from_entity_graph(graph: &EntityGraph, collection: &DomainCollection) -> MappingResult<Directory> {
    let mut directory = Directory::default();
    let user_type = User::entity_type();
    let group_type = Group::entity_type();

    for &handle in collection.values() {
        let node = entity(graph, handle)?;
        if node.entity_type() == &user_type {
            directory.users.push(user_from_entity(node)?);
            read_user_edges(graph, node, &mut directory.social)?;
        } else if node.entity_type() == &group_type {
            directory.groups.push(group_from_entity(node)?);
            read_group_edges(graph, node, &mut directory.social)?;
        } else {
            return Err(MappingError::malformed(format!(
                "expected a User or a Group, found {}",
                node.entity_type()
            )));
        }
    }

    Ok(directory)
}

fn read_user_edges(graph: &EntityGraph, node: &DomainEntity, social: &mut SocialGraph) -> MappingResult<()> {
    let id = user_id(node)?;
    for target in targets(node, "following") {
        let followee = user_id(typed(graph, target, &User::entity_type())?)?;
        social.follow(id, followee).map_err(invalid)?;
    }
    for source in targets(node, "followers") {
        let follower = user_id(typed(graph, source, &User::entity_type())?)?;
        social.follow(follower, id).map_err(invalid)?;
    }
    for target in targets(node, "member_of") {
        social.add_as_member_of(id, group_id(typed(graph, target, &Group::entity_type())?)?);
    }
    for target in targets(node, "admin_of") {
        social.add_as_admin_of(id, group_id(typed(graph, target, &Group::entity_type())?)?);
    }
    Ok(())
}

fn read_group_edges(graph: &EntityGraph, node: &DomainEntity, social: &mut SocialGraph) -> MappingResult<()> {
    let id = group_id(node)?;
    for source in targets(node, "members") {
        social.add_as_member_of(user_id(typed(graph, source, &User::entity_type())?)?, id);
    }
    for source in targets(node, "admins") {
        social.add_as_admin_of(user_id(typed(graph, source, &User::entity_type())?)?, id);
    }
    Ok(())
}

/// Handles of a loaded to-many relation; nothing when it is not loaded.
fn targets(node: &DomainEntity, name: &str) -> Vec<EntityRef> {
    match node.relation(name) {
        Some(Related::Many(items)) => items.values().copied().collect(),
        _ => Vec::new(),
    }
}

fn entity(graph: &EntityGraph, handle: EntityRef) -> MappingResult<&DomainEntity> {
    graph
        .get(handle)
        .ok_or_else(|| MappingError::malformed(format!("dangling entity handle {handle:?}")))
}

fn typed<'g>(graph: &'g EntityGraph, handle: EntityRef, expected: &EntityType) -> MappingResult<&'g DomainEntity> {
    let node = entity(graph, handle)?;
    if node.entity_type() != expected {
        return Err(MappingError::malformed(format!(
            "expected a {expected}, found {}",
            node.entity_type()
        )));
    }
    Ok(node)
}

fn stored_id(node: &DomainEntity) -> MappingResult<Uuid> {
    node.field("id")
        .and_then(Value::as_uuid)
        .ok_or_else(|| MappingError::validation(format!("{}.id must be a uuid", node.entity_type())))
}

fn user_id(node: &DomainEntity) -> MappingResult<UserId> {
    stored_id(node).map(UserId::from_uuid)
}

fn group_id(node: &DomainEntity) -> MappingResult<GroupId> {
    stored_id(node).map(GroupId::from_uuid)
}

fn text<'a>(node: &'a DomainEntity, name: &str) -> MappingResult<&'a str> {
    node.field(name)
        .and_then(Value::as_str)
        .ok_or_else(|| MappingError::validation(format!("{}.{name} must be text", node.entity_type())))
}

fn user_from_entity(node: &DomainEntity) -> MappingResult<User> {
    Ok(User::restore(
        user_id(node)?,
        Email::parse(text(node, "email")?).map_err(invalid)?,
        Username::parse(text(node, "username")?).map_err(invalid)?,
        HashedPassword::new(text(node, "password")?).map_err(invalid)?,
    ))
}

fn group_from_entity(node: &DomainEntity) -> MappingResult<Group> {
    Group::new(group_id(node)?, text(node, "name")?).map_err(invalid)
}
