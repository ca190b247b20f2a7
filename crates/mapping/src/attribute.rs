//! Column-type descriptors attached to entity fields.

use serde::{Deserialize, Serialize};

use datamapper_core::{MappingError, MappingResult, Value};

/// Storage width class of an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegerWidth {
    /// 16-bit column.
    Small,
    /// 32-bit column.
    Regular,
    /// 64-bit column.
    Big,
}

impl IntegerWidth {
    /// Inclusive value range of the column.
    pub fn bounds(self, unsigned: bool) -> (i64, i64) {
        match (self, unsigned) {
            (IntegerWidth::Small, false) => (i64::from(i16::MIN), i64::from(i16::MAX)),
            (IntegerWidth::Small, true) => (0, i64::from(u16::MAX)),
            (IntegerWidth::Regular, false) => (i64::from(i32::MIN), i64::from(i32::MAX)),
            (IntegerWidth::Regular, true) => (0, i64::from(u32::MAX)),
            (IntegerWidth::Big, false) => (i64::MIN, i64::MAX),
            (IntegerWidth::Big, true) => (0, i64::MAX),
        }
    }
}

/// Semantic column type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    SmallInteger,
    Integer,
    BigInteger,
    Boolean,
    Float,
    String,
    Text,
    Uuid,
    DateTime,
}

impl AttributeKind {
    pub fn integer_width(self) -> Option<IntegerWidth> {
        match self {
            AttributeKind::SmallInteger => Some(IntegerWidth::Small),
            AttributeKind::Integer => Some(IntegerWidth::Regular),
            AttributeKind::BigInteger => Some(IntegerWidth::Big),
            _ => None,
        }
    }

    pub fn is_integer(self) -> bool {
        self.integer_width().is_some()
    }

    /// Whether a field of this kind can hold an entity's identity.
    pub fn can_identify(self) -> bool {
        self.is_integer()
            || matches!(
                self,
                AttributeKind::String | AttributeKind::Text | AttributeKind::Uuid
            )
    }

    pub fn name(self) -> &'static str {
        match self {
            AttributeKind::SmallInteger => "small_integer",
            AttributeKind::Integer => "integer",
            AttributeKind::BigInteger => "big_integer",
            AttributeKind::Boolean => "boolean",
            AttributeKind::Float => "float",
            AttributeKind::String => "string",
            AttributeKind::Text => "text",
            AttributeKind::Uuid => "uuid",
            AttributeKind::DateTime => "date_time",
        }
    }
}

impl core::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage semantics of one column.
///
/// Descriptors are immutable values; the chainable setters consume and return
/// a new descriptor.
///
/// ```ignore
/// let id = AttributeDescriptor::integer().auto_increment().unsigned();
/// let age = AttributeDescriptor::small_integer().unsigned().nullable();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    kind: AttributeKind,
    #[serde(default)]
    auto_increment: bool,
    #[serde(default)]
    unsigned: bool,
    #[serde(default)]
    nullable: bool,
}

impl AttributeDescriptor {
    pub const fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            auto_increment: false,
            unsigned: false,
            nullable: false,
        }
    }

    pub const fn small_integer() -> Self {
        Self::new(AttributeKind::SmallInteger)
    }

    pub const fn integer() -> Self {
        Self::new(AttributeKind::Integer)
    }

    pub const fn big_integer() -> Self {
        Self::new(AttributeKind::BigInteger)
    }

    pub const fn boolean() -> Self {
        Self::new(AttributeKind::Boolean)
    }

    pub const fn float() -> Self {
        Self::new(AttributeKind::Float)
    }

    pub const fn string() -> Self {
        Self::new(AttributeKind::String)
    }

    pub const fn text() -> Self {
        Self::new(AttributeKind::Text)
    }

    pub const fn uuid() -> Self {
        Self::new(AttributeKind::Uuid)
    }

    pub const fn date_time() -> Self {
        Self::new(AttributeKind::DateTime)
    }

    /// Value is generated by storage on insert.
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub const fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Check the descriptor's flag combination.
    ///
    /// `auto_increment` and `unsigned` only make sense on integer columns.
    pub fn validate(&self, field: &str) -> MappingResult<()> {
        if self.auto_increment && !self.kind.is_integer() {
            return Err(MappingError::configuration(format!(
                "field `{field}`: auto_increment requires an integer kind, found {}",
                self.kind
            )));
        }
        if self.unsigned && !self.kind.is_integer() {
            return Err(MappingError::configuration(format!(
                "field `{field}`: unsigned requires an integer kind, found {}",
                self.kind
            )));
        }
        Ok(())
    }

    /// Check that `value` can be stored in this column.
    ///
    /// A null auto-increment value is accepted: storage fills it in on insert.
    pub fn check_value(&self, field: &str, value: &Value) -> MappingResult<()> {
        if value.is_null() {
            if self.nullable || self.auto_increment {
                return Ok(());
            }
            return Err(MappingError::validation(format!(
                "field `{field}` is not nullable"
            )));
        }

        let compatible = match self.kind {
            AttributeKind::SmallInteger | AttributeKind::Integer | AttributeKind::BigInteger => {
                matches!(value, Value::Integer(_))
            }
            AttributeKind::Boolean => matches!(value, Value::Bool(_)),
            AttributeKind::Float => matches!(value, Value::Float(_) | Value::Integer(_)),
            AttributeKind::String | AttributeKind::Text => matches!(value, Value::Text(_)),
            AttributeKind::Uuid => value.as_uuid().is_some(),
            AttributeKind::DateTime => matches!(value, Value::DateTime(_)),
        };
        if !compatible {
            return Err(MappingError::validation(format!(
                "field `{field}` expects {}, found {}",
                self.kind,
                value.kind_name()
            )));
        }

        if let (Some(width), Some(v)) = (self.kind.integer_width(), value.as_i64()) {
            let (min, max) = width.bounds(self.unsigned);
            if v < min || v > max {
                return Err(MappingError::validation(format!(
                    "field `{field}` value {v} is out of range [{min}, {max}]"
                )));
            }
        }
        Ok(())
    }
}
