//! Relation descriptors: how one entity type associates with another.

use serde::{Deserialize, Serialize};

use datamapper_core::{MappingError, MappingResult, ModelType};

/// How many related instances a relation holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

/// Which side of the association owns the foreign key / join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Owning,
    Inverse,
}

/// Join table of a many-to-many relation, declared on the owning side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinTable {
    pub name: String,
    pub join_column: String,
    pub inverse_join_column: String,
}

impl JoinTable {
    pub fn new(
        name: impl Into<String>,
        join_column: impl Into<String>,
        inverse_join_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            join_column: join_column.into(),
            inverse_join_column: inverse_join_column.into(),
        }
    }
}

/// One association from an entity type to a target persistence type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    name: String,
    target: ModelType,
    cardinality: Cardinality,
    direction: Direction,
    #[serde(default)]
    self_referencing: bool,
    /// Field on the target that describes the other side (`mappedBy` /
    /// `inversedBy`).
    #[serde(default)]
    counterpart: Option<String>,
    #[serde(default)]
    join_table: Option<JoinTable>,
}

impl RelationDescriptor {
    fn new(name: impl Into<String>, target: impl Into<ModelType>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality,
            direction: Direction::Owning,
            self_referencing: false,
            counterpart: None,
            join_table: None,
        }
    }

    /// Single-valued relation (`ManyToOne` / `OneToOne`).
    pub fn one(name: impl Into<String>, target: impl Into<ModelType>) -> Self {
        Self::new(name, target, Cardinality::One)
    }

    /// Collection-valued relation (`OneToMany` / `ManyToMany`).
    pub fn many(name: impl Into<String>, target: impl Into<ModelType>) -> Self {
        Self::new(name, target, Cardinality::Many)
    }

    /// Inverse side, described by `counterpart` on the target.
    pub fn mapped_by(mut self, counterpart: impl Into<String>) -> Self {
        self.direction = Direction::Inverse;
        self.counterpart = Some(counterpart.into());
        self
    }

    /// Owning side, whose inverse is `counterpart` on the target.
    pub fn inversed_by(mut self, counterpart: impl Into<String>) -> Self {
        self.direction = Direction::Owning;
        self.counterpart = Some(counterpart.into());
        self
    }

    pub fn self_referencing(mut self) -> Self {
        self.self_referencing = true;
        self
    }

    pub fn join_table(mut self, join_table: JoinTable) -> Self {
        self.join_table = Some(join_table);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &ModelType {
        &self.target
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_self_referencing(&self) -> bool {
        self.self_referencing
    }

    pub fn counterpart(&self) -> Option<&str> {
        self.counterpart.as_deref()
    }

    pub fn join_table_def(&self) -> Option<&JoinTable> {
        self.join_table.as_ref()
    }

    /// Checks that only need the descriptor itself. Target checks happen when
    /// the registry is built.
    pub(crate) fn validate(&self) -> MappingResult<()> {
        if self.name.trim().is_empty() {
            return Err(MappingError::configuration("relation name cannot be empty"));
        }
        if self.join_table.is_some() && self.direction == Direction::Inverse {
            return Err(MappingError::configuration(format!(
                "relation `{}`: join table must be declared on the owning side",
                self.name
            )));
        }
        if self.join_table.is_some() && self.cardinality == Cardinality::One {
            return Err(MappingError::configuration(format!(
                "relation `{}`: join table requires a many relation",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_by_marks_inverse_side() {
        let rel = RelationDescriptor::many("followers", "UserModel")
            .mapped_by("following")
            .self_referencing();
        assert_eq!(rel.direction(), Direction::Inverse);
        assert_eq!(rel.counterpart(), Some("following"));
        assert!(rel.is_self_referencing());
        assert_eq!(rel.cardinality(), Cardinality::Many);
    }

    #[test]
    fn join_table_on_inverse_side_is_rejected() {
        let rel = RelationDescriptor::many("followers", "UserModel")
            .mapped_by("following")
            .join_table(JoinTable::new("followers", "user_id", "following_user_id"));
        assert!(matches!(rel.validate(), Err(MappingError::Configuration(_))));
    }

    #[test]
    fn join_table_on_single_relation_is_rejected() {
        let rel = RelationDescriptor::one("author", "UserModel")
            .join_table(JoinTable::new("authors", "post_id", "user_id"));
        assert!(matches!(rel.validate(), Err(MappingError::Configuration(_))));
    }
}
