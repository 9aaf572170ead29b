//! # Brewspace Testing
//!
//! Testing utilities for the settlement engine.
//!
//! This crate provides:
//! - Deterministic clocks (`FixedClock`, `ManualClock`)
//! - `InMemoryStore`, implementing every collaborator trait, with fault
//!   injection for partial-failure tests
//! - Fixtures for rooms and vouchers, and a ready-made engine
//! - proptest strategies for money and time slots
//!
//! ## Example
//!
//! ```ignore
//! use brewspace_testing::{fixtures, test_clock, InMemoryStore};
//!
//! #[tokio::test]
//! async fn test_booking_flow() {
//!     let store = InMemoryStore::new();
//!     let room = store.add_room(fixtures::room(10));
//!     let engine = fixtures::engine(&store, test_clock());
//!     // ...
//! }
//! ```

pub mod fixtures;
pub mod mocks;
pub mod properties;
pub mod store;

pub use mocks::{FixedClock, ManualClock, test_clock};
pub use store::{Fault, InMemoryEnvironment, InMemoryStore};

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}
