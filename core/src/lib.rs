//! # Brewspace Core
//!
//! Booking and wallet settlement for coffee-shop meeting rooms.
//!
//! The crate is a functional core with an imperative shell:
//!
//! - [`policy`]: pure rules (time validation, pricing, voucher eligibility,
//!   cancellation window)
//! - [`environment`]: traits for every collaborator (clock, room directory,
//!   booking/voucher/wallet/top-up stores, transaction ledger)
//! - [`engine`]: `SettlementEngine`, which sequences policy checks and store
//!   writes for each operation
//!
//! ## Example
//!
//! ```ignore
//! use brewspace_core::{BookingRequest, SettlementEngine};
//!
//! let engine = SettlementEngine::new(environment);
//! let receipt = engine
//!     .create_booking(customer_id, BookingRequest {
//!         room_id,
//!         start_time,
//!         end_time,
//!         voucher_code: Some("WELCOME10".into()),
//!     })
//!     .await?;
//! println!("charged {}", receipt.booking.total_price);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod booking;
pub mod engine;
pub mod environment;
pub mod error;
pub mod locks;
pub mod metrics;
pub mod policy;
pub mod types;
pub mod voucher;
pub mod wallet;

pub use engine::SettlementEngine;
pub use environment::{
    BookingStore, Clock, RoomDirectory, SettlementEnvironment, StoreEnvironment, SystemClock,
    TopupStore, TransactionLedger, VoucherStore, WalletStore,
};
pub use error::{ErrorKind, Result, SettlementError};
pub use policy::SettlementPolicy;
pub use types::*;
