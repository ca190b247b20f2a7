//! User entity and the events it records.
//!
//! State-changing operations append an event to the user's pending sequence.
//! Events are not part of the user's fields; they leave the entity only
//! through [`RecordsEvents::release_events`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use datamapper_core::{Entity, EntityType, IdentityKey};
use datamapper_events::{Event, PendingEvents, RecordsEvents};

use crate::values::{Email, HashedPassword, UserId, Username};

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserHasRegistered {
    pub user_id: UserId,
    pub email: Email,
    pub username: Username,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameWasUpdated {
    pub user_id: UserId,
    pub previous: Username,
    pub username: Username,
    pub occurred_at: DateTime<Utc>,
}

/// Carries no password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordWasReset {
    pub user_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserEvent {
    Registered(UserHasRegistered),
    UsernameUpdated(UsernameWasUpdated),
    PasswordReset(PasswordWasReset),
}

impl Event for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::Registered(_) => "identity.user.registered",
            UserEvent::UsernameUpdated(_) => "identity.user.username_updated",
            UserEvent::PasswordReset(_) => "identity.user.password_reset",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            UserEvent::Registered(e) => e.occurred_at,
            UserEvent::UsernameUpdated(e) => e.occurred_at,
            UserEvent::PasswordReset(e) => e.occurred_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A registered user.
///
/// Social relations (follows, group membership) are kept in
/// [`SocialGraph`](crate::SocialGraph), not on the user.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    email: Email,
    username: Username,
    password: HashedPassword,
    events: PendingEvents<UserEvent>,
}

impl User {
    /// Register a new user, recording [`UserHasRegistered`].
    pub fn register(
        id: UserId,
        email: Email,
        username: Username,
        password: HashedPassword,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        let mut user = Self::restore(id, email, username, password);
        user.events.record(UserEvent::Registered(UserHasRegistered {
            user_id: id,
            email: user.email.clone(),
            username: user.username.clone(),
            occurred_at,
        }));
        user
    }

    /// Rebuild a user from stored state. No event is recorded.
    pub fn restore(id: UserId, email: Email, username: Username, password: HashedPassword) -> Self {
        Self {
            id,
            email,
            username,
            password,
            events: PendingEvents::new(),
        }
    }

    /// Change the username. Setting the current username again is a no-op.
    pub fn update_username(&mut self, username: Username, occurred_at: DateTime<Utc>) {
        if username == self.username {
            return;
        }
        let previous = std::mem::replace(&mut self.username, username);
        self.events.record(UserEvent::UsernameUpdated(UsernameWasUpdated {
            user_id: self.id,
            previous,
            username: self.username.clone(),
            occurred_at,
        }));
    }

    pub fn reset_password(&mut self, password: HashedPassword, occurred_at: DateTime<Utc>) {
        self.password = password;
        self.events.record(UserEvent::PasswordReset(PasswordWasReset {
            user_id: self.id,
            occurred_at,
        }));
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn password(&self) -> &HashedPassword {
        &self.password
    }
}

/// Equality covers stored state only; pending events are ignored.
impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.email == other.email
            && self.username == other.username
            && self.password == other.password
    }
}

impl Eq for User {}

impl Entity for User {
    type Id = UserId;

    fn entity_type() -> EntityType {
        EntityType::from("User")
    }

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn identity_key(&self) -> IdentityKey {
        IdentityKey::Uuid(*self.id.as_uuid())
    }
}

impl RecordsEvents for User {
    type Event = UserEvent;

    fn pending_events(&self) -> &[UserEvent] {
        self.events.as_slice()
    }

    fn release_events(&mut self) -> Vec<UserEvent> {
        self.events.release()
    }
}
