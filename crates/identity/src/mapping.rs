//! Mapping declarations for the identity domain.

use datamapper_core::MappingResult;
use datamapper_mapping::{
    AttributeDescriptor, EntityMapping, JoinTable, RegistryBuilder, RelationDescriptor,
};

pub const USER_MODEL: &str = "UserModel";
pub const GROUP_MODEL: &str = "GroupModel";
pub const POST_MODEL: &str = "PostModel";
pub const NOTIFICATION_MODEL: &str = "NotificationModel";

/// Register `User`, `Group`, `Post` and `Notification`.
pub fn register(builder: &mut RegistryBuilder) -> MappingResult<()> {
    builder
        .register(user_mapping()?)?
        .register(group_mapping()?)?
        .register(post_mapping()?)?
        .register(notification_mapping()?)?;
    Ok(())
}

fn user_mapping() -> MappingResult<EntityMapping> {
    EntityMapping::builder(USER_MODEL, "User")
        .table("users")
        .id("id", AttributeDescriptor::uuid())
        .field("email", AttributeDescriptor::string())
        .field("username", AttributeDescriptor::string())
        .field("password", AttributeDescriptor::string())
        .relation(
            RelationDescriptor::many("followers", USER_MODEL)
                .mapped_by("following")
                .self_referencing(),
        )
        .relation(
            RelationDescriptor::many("following", USER_MODEL)
                .inversed_by("followers")
                .self_referencing()
                .join_table(JoinTable::new("followers", "user_id", "following_user_id")),
        )
        .relation(
            RelationDescriptor::many("member_of", GROUP_MODEL)
                .inversed_by("members")
                .join_table(JoinTable::new("group_members", "user_id", "group_id")),
        )
        .relation(
            RelationDescriptor::many("admin_of", GROUP_MODEL)
                .inversed_by("admins")
                .join_table(JoinTable::new("group_admins", "user_id", "group_id")),
        )
        .relation(RelationDescriptor::many("posts", POST_MODEL).mapped_by("user"))
        .relation(RelationDescriptor::many("notifications", NOTIFICATION_MODEL).mapped_by("user"))
        .build()
}

fn group_mapping() -> MappingResult<EntityMapping> {
    EntityMapping::builder(GROUP_MODEL, "Group")
        .table("groups")
        .id("id", AttributeDescriptor::uuid())
        .field("name", AttributeDescriptor::string())
        .relation(RelationDescriptor::many("members", USER_MODEL).mapped_by("member_of"))
        .relation(RelationDescriptor::many("admins", USER_MODEL).mapped_by("admin_of"))
        .build()
}

/// Discussion posts, owned by their author through `user`.
fn post_mapping() -> MappingResult<EntityMapping> {
    EntityMapping::builder(POST_MODEL, "Post")
        .table("posts")
        .id("id", AttributeDescriptor::integer().auto_increment().unsigned())
        .field("body", AttributeDescriptor::text())
        .field("created_at", AttributeDescriptor::date_time().nullable())
        .relation(RelationDescriptor::one("user", USER_MODEL).inversed_by("posts"))
        .build()
}

fn notification_mapping() -> MappingResult<EntityMapping> {
    EntityMapping::builder(NOTIFICATION_MODEL, "Notification")
        .table("notifications")
        .id("id", AttributeDescriptor::integer().auto_increment().unsigned())
        .field("message", AttributeDescriptor::text())
        .field("read", AttributeDescriptor::boolean())
        .relation(RelationDescriptor::one("user", USER_MODEL).inversed_by("notifications"))
        .build()
}
