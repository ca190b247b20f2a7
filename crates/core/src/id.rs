//! Strongly-typed type names used as registry keys.
//!
//! The persistence side and the domain side each have their own name space,
//! so a `ModelType` can never be passed where an `EntityType` is expected.

use serde::{Deserialize, Serialize};

/// Name of a persistence-model type (e.g. `"users"` model class).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelType(String);

/// Name of a plain domain-entity type (e.g. `"User"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

macro_rules! impl_type_name {
    ($t:ty) => {
        impl $t {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_type_name!(ModelType);
impl_type_name!(EntityType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_display_their_raw_name() {
        assert_eq!(ModelType::from("UserModel").to_string(), "UserModel");
        assert_eq!(EntityType::new("User").as_str(), "User");
    }

    #[test]
    fn type_names_serialize_transparently() {
        let json = serde_json::to_string(&EntityType::from("Group")).unwrap();
        assert_eq!(json, "\"Group\"");
    }
}
