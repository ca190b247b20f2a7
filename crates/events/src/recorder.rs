//! Pending-event buffer and the drain interface entities expose.

use crate::Event;

/// Events recorded by an entity and not yet handed to a dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvents<E> {
    events: Vec<E>,
}

impl<E> Default for PendingEvents<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E: Event> PendingEvents<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the end of the pending sequence.
    pub fn record(&mut self, event: E) {
        let meta = event.metadata();
        tracing::trace!(
            event_type = meta.event_type,
            version = meta.version,
            occurred_at = %meta.occurred_at,
            "recorded domain event"
        );
        self.events.push(event);
    }

    /// Take every pending event, leaving the buffer empty.
    pub fn release(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }

    pub fn as_slice(&self) -> &[E] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Drain interface for entities that record domain events.
///
/// Releasing is the only way events leave an entity; a second release without
/// new operations in between returns nothing, so events are never dispatched
/// twice.
pub trait RecordsEvents {
    type Event: Event;

    /// Events recorded since the last release, oldest first.
    fn pending_events(&self) -> &[Self::Event];

    /// Drain the pending events.
    fn release_events(&mut self) -> Vec<Self::Event>;
}
