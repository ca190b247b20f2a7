//! Groups users can be members or administrators of.

use serde::{Deserialize, Serialize};

use datamapper_core::{DomainError, DomainResult, Entity, EntityType, IdentityKey};

use crate::values::GroupId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    id: GroupId,
    name: String,
}

impl Group {
    pub fn new(id: GroupId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("group name must not be empty"));
        }
        Ok(Self { id, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) -> DomainResult<()> {
        *self = Self::new(self.id, name)?;
        Ok(())
    }
}

impl Entity for Group {
    type Id = GroupId;

    fn entity_type() -> EntityType {
        EntityType::from("Group")
    }

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn identity_key(&self) -> IdentityKey {
        IdentityKey::Uuid(*self.id.as_uuid())
    }
}
