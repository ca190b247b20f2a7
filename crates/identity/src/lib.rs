//! Identity domain: users, groups and the social relations between them,
//! plus their mapping declarations and a bridge to the conversion engine.

pub mod group;
pub mod mapping;
pub mod persistence;
pub mod social;
pub mod user;
pub mod values;

pub use group::Group;
pub use persistence::Directory;
pub use social::SocialGraph;
pub use user::{PasswordWasReset, User, UserEvent, UserHasRegistered, UsernameWasUpdated};
pub use values::{Email, GroupId, HashedPassword, UserId, Username};
