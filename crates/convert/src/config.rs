//! Conversion engine configuration.

use serde::{Deserialize, Serialize};

/// Environment variable selecting the [`UnknownFieldPolicy`] (`ignore` | `reject`).
pub const ENV_UNKNOWN_FIELDS: &str = "DATAMAPPER_UNKNOWN_FIELDS";

/// Environment variable toggling `skip_auto_increment_on_insert` (`true` | `false`).
pub const ENV_SKIP_AUTO_INCREMENT: &str = "DATAMAPPER_SKIP_AUTO_INCREMENT";

/// What to do with attributes or relations a source node carries but its
/// mapping does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    /// Leave them out of the result (logged at `warn`).
    #[default]
    Ignore,
    /// Fail the conversion with `MalformedGraph`.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub unknown_fields: UnknownFieldPolicy,
    /// Leave `auto_increment` fields out of models that have no identity yet,
    /// so storage generates them on insert.
    pub skip_auto_increment_on_insert: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFieldPolicy::Ignore,
            skip_auto_increment_on_insert: true,
        }
    }
}

impl MapperConfig {
    /// Read the configuration from the process environment.
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MapperConfig::from_env`], with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let unknown_fields = match lookup(ENV_UNKNOWN_FIELDS).as_deref().map(str::trim) {
            None => defaults.unknown_fields,
            Some(v) if v.eq_ignore_ascii_case("ignore") => UnknownFieldPolicy::Ignore,
            Some(v) if v.eq_ignore_ascii_case("reject") => UnknownFieldPolicy::Reject,
            Some(other) => {
                tracing::warn!("{ENV_UNKNOWN_FIELDS}={other} is not recognised, using default");
                defaults.unknown_fields
            }
        };

        let skip_auto_increment_on_insert = lookup(ENV_SKIP_AUTO_INCREMENT)
            .map(|v| {
                v.trim().parse::<bool>().unwrap_or_else(|_| {
                    tracing::warn!("{ENV_SKIP_AUTO_INCREMENT}={v} is not a boolean, using default");
                    defaults.skip_auto_increment_on_insert
                })
            })
            .unwrap_or(defaults.skip_auto_increment_on_insert);

        Self {
            unknown_fields,
            skip_auto_increment_on_insert,
        }
    }
}
