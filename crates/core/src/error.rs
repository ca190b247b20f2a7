//! Error model shared by the mapping layer and the domain layer.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type used by the registry and the conversion engine.
pub type MappingResult<T> = Result<T, MappingError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants). Mapping concerns belong to [`MappingError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Failure reported by the mapping registry or the conversion engine.
///
/// Every variant is returned synchronously by the operation that detected it.
/// A conversion that fails never hands back a partially built graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// A persistence type (or domain type) was registered twice.
    #[error("duplicate mapping: {0}")]
    DuplicateMapping(String),

    /// No mapping is registered for the requested type.
    #[error("unmapped type: {0}")]
    UnmappedType(String),

    /// The input graph does not match the registered relations.
    #[error("malformed graph: {0}")]
    MalformedGraph(String),

    /// An invalid descriptor combination, detected at registry-build time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A field value does not satisfy its attribute descriptor.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl MappingError {
    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::DuplicateMapping(msg.into())
    }

    pub fn unmapped(msg: impl Into<String>) -> Self {
        Self::UnmappedType(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedGraph(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
