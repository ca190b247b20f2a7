//! Social relations between users and groups.
//!
//! Each relation is one [`EdgeSet`]; its forward and inverse views answer both
//! directions (`following` / `followers`, `member_of` / `members`, ...), so
//! the two sides can never disagree.

use datamapper_core::{DomainError, DomainResult, EdgeSet};

use crate::values::{GroupId, UserId};

#[derive(Debug, Clone, Default)]
pub struct SocialGraph {
    follows: EdgeSet<UserId, UserId>,
    memberships: EdgeSet<UserId, GroupId>,
    administrations: EdgeSet<UserId, GroupId>,
}

impl SocialGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// `follower` starts following `followee`. Returns `false` if it already did.
    pub fn follow(&mut self, follower: UserId, followee: UserId) -> DomainResult<bool> {
        if follower == followee {
            return Err(DomainError::invariant("a user cannot follow themselves"));
        }
        Ok(self.follows.insert(follower, followee))
    }

    /// Returns `false` if `follower` was not following `followee`.
    pub fn unfollow(&mut self, follower: UserId, followee: UserId) -> bool {
        self.follows.remove(&follower, &followee)
    }

    pub fn is_following(&self, follower: UserId, followee: UserId) -> bool {
        self.follows.contains(&follower, &followee)
    }

    /// Users `user` follows, oldest first.
    pub fn following(&self, user: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.follows.forward(&user).copied()
    }

    /// Users following `user`, oldest first.
    pub fn followers(&self, user: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.follows.inverse(&user).copied()
    }

    pub fn add_as_member_of(&mut self, user: UserId, group: GroupId) -> bool {
        self.memberships.insert(user, group)
    }

    pub fn remove_from(&mut self, user: UserId, group: GroupId) -> bool {
        self.memberships.remove(&user, &group)
    }

    pub fn member_of(&self, user: UserId) -> impl Iterator<Item = GroupId> + '_ {
        self.memberships.forward(&user).copied()
    }

    pub fn members(&self, group: GroupId) -> impl Iterator<Item = UserId> + '_ {
        self.memberships.inverse(&group).copied()
    }

    pub fn add_as_admin_of(&mut self, user: UserId, group: GroupId) -> bool {
        self.administrations.insert(user, group)
    }

    pub fn admin_of(&self, user: UserId) -> impl Iterator<Item = GroupId> + '_ {
        self.administrations.forward(&user).copied()
    }

    pub fn admins(&self, group: GroupId) -> impl Iterator<Item = UserId> + '_ {
        self.administrations.inverse(&group).copied()
    }

    /// Every follow edge as `(follower, followee)`.
    pub fn follow_edges(&self) -> impl Iterator<Item = (UserId, UserId)> + '_ {
        self.follows.edges().map(|(a, b)| (*a, *b))
    }
}
