//! Domain events recorded by entities.
//!
//! Entities append facts to a local pending sequence as a side effect of
//! state-changing operations. Dispatching is left to the caller, who drains
//! the sequence with [`RecordsEvents::release_events`].

pub mod event;
pub mod recorder;

pub use event::{Event, EventMetadata};
pub use recorder::{PendingEvents, RecordsEvents};
