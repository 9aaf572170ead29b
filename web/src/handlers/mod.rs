//! HTTP request handlers, organized by resource.

pub mod bookings;
pub mod health;
pub mod vouchers;
pub mod wallet;

pub use health::{health_check, readiness_check};
