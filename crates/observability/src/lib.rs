//! Process-wide logging setup for binaries and tests that embed the mapper.
//!
//! The library crates only emit `tracing` events; installing a subscriber is
//! left to whoever owns the process.

pub mod tracing;

/// Install the JSON subscriber with the `info` default filter.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init();
}
