use chrono::{DateTime, Utc};
use serde::Serialize;

/// A fact recorded by an entity as a side effect of a state change.
///
/// Events are kept apart from the entity's fields and relations: they are
/// never converted, persisted as columns, or compared for equality.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name, `<context>.<entity>.<fact>`.
    fn event_type(&self) -> &'static str;

    fn occurred_at(&self) -> DateTime<Utc>;

    /// Schema version of the payload.
    fn version(&self) -> u32 {
        1
    }

    fn metadata(&self) -> EventMetadata {
        EventMetadata {
            event_type: self.event_type(),
            version: self.version(),
            occurred_at: self.occurred_at(),
        }
    }
}

/// Payload-free description of an event, for logs and dispatch routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventMetadata {
    pub event_type: &'static str,
    pub version: u32,
    pub occurred_at: DateTime<Utc>,
}
