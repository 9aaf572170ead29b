//! Environment traits for dependency injection.
//!
//! Every collaborator the [`SettlementEngine`](crate::engine::SettlementEngine)
//! touches is abstracted behind a trait here: the clock, the room directory,
//! and the stores for bookings, vouchers, wallets, the transaction ledger and
//! top-ups. Production wires the `sqlx` implementations; tests use the
//! in-memory store from `brewspace-testing`.
//!
//! Store methods report infrastructure failures as
//! [`SettlementError::Storage`](crate::error::SettlementError::Storage).
//! Business outcomes that depend on a guarded write (a debit that did not
//! apply, a status transition that lost a race) are part of the return value
//! rather than an error.

use crate::error::Result;
use crate::types::{
    Booking, BookingId, DebitOutcome, MeetingRoom, Money, NewVoucher, RoomId, TimeSlot, Topup,
    TopupId, Transaction, UserId, Voucher, VoucherId, VoucherPatch, Wallet,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;

/// Clock trait - abstracts time operations for testability
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Read-only room lookup.
pub trait RoomDirectory: Send + Sync {
    /// Look up a room by ID.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the lookup fails.
    fn get_room(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Option<MeetingRoom>>> + Send;
}

/// Availability index and booking persistence.
pub trait BookingStore: Send + Sync {
    /// Whether any non-cancelled booking on `room_id` overlaps `slot`.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the query fails.
    fn has_overlap(
        &self,
        room_id: RoomId,
        slot: TimeSlot,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Persist a new booking.
    ///
    /// # Errors
    ///
    /// - `SettlementError::SlotConflict` if the store rejects an overlapping
    ///   active booking
    /// - `SettlementError::Storage` on write failure
    fn insert(&self, booking: &Booking) -> impl Future<Output = Result<()>> + Send;

    /// Fetch a booking.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the query fails.
    fn get(&self, booking_id: BookingId) -> impl Future<Output = Result<Option<Booking>>> + Send;

    /// Transition a booking from Booked to Cancelled.
    ///
    /// Returns `false` when the booking was not in the Booked state.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` on write failure.
    fn mark_cancelled(&self, booking_id: BookingId) -> impl Future<Output = Result<bool>> + Send;

    /// Bookings made by a customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the query fails.
    fn list_by_customer(
        &self,
        customer_id: UserId,
    ) -> impl Future<Output = Result<Vec<Booking>>> + Send;

    /// Bookings on a room, by start time.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the query fails.
    fn list_by_room(&self, room_id: RoomId) -> impl Future<Output = Result<Vec<Booking>>> + Send;
}

/// Voucher definitions and usage counters.
pub trait VoucherStore: Send + Sync {
    /// Fetch a voucher by ID.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the query fails.
    fn get_by_id(
        &self,
        voucher_id: VoucherId,
    ) -> impl Future<Output = Result<Option<Voucher>>> + Send;

    /// Fetch a voucher by its code.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the query fails.
    fn get_by_code(&self, code: &str) -> impl Future<Output = Result<Option<Voucher>>> + Send;

    /// Atomically increment `used_count`, guarded by the usage budget.
    ///
    /// Returns `false` if the voucher was exhausted (or gone) at the moment
    /// of the update.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` on write failure.
    fn increment_usage(&self, voucher_id: VoucherId) -> impl Future<Output = Result<bool>> + Send;

    /// Atomically decrement `used_count`, never below zero.
    ///
    /// Returns `false` if there was no use to release.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` on write failure.
    fn release_usage(&self, voucher_id: VoucherId) -> impl Future<Output = Result<bool>> + Send;

    /// Create a voucher.
    ///
    /// # Errors
    ///
    /// - `SettlementError::DuplicateVoucherCode` if the code is taken
    /// - `SettlementError::Storage` on write failure
    fn insert(&self, voucher: NewVoucher) -> impl Future<Output = Result<Voucher>> + Send;

    /// Apply a partial update.
    ///
    /// Returns `None` if the voucher does not exist.
    ///
    /// # Errors
    ///
    /// - `SettlementError::DuplicateVoucherCode` if the new code is taken
    /// - `SettlementError::Storage` on write failure
    fn update(
        &self,
        voucher_id: VoucherId,
        patch: VoucherPatch,
    ) -> impl Future<Output = Result<Option<Voucher>>> + Send;

    /// Delete a voucher. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` on write failure.
    fn delete(&self, voucher_id: VoucherId) -> impl Future<Output = Result<bool>> + Send;

    /// All vouchers, newest validity window first.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the query fails.
    fn list(&self) -> impl Future<Output = Result<Vec<Voucher>>> + Send;
}

/// Wallet balances.
///
/// Balances only change through `credit` (unconditional atomic add) and
/// `debit` (single conditioned subtract); there is no read-modify-write.
pub trait WalletStore: Send + Sync {
    /// Fetch a wallet.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the query fails.
    fn get(&self, user_id: UserId) -> impl Future<Output = Result<Option<Wallet>>> + Send;

    /// Create a zero-balance wallet, or return the existing one.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` on write failure.
    fn open(&self, user_id: UserId) -> impl Future<Output = Result<Wallet>> + Send;

    /// Add `amount` to the balance.
    ///
    /// # Errors
    ///
    /// - `SettlementError::WalletNotFound` if the wallet does not exist
    /// - `SettlementError::Storage` on write failure
    fn credit(&self, user_id: UserId, amount: Money) -> impl Future<Output = Result<Money>> + Send;

    /// Subtract `amount` only if the balance covers it.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` on write failure.
    fn debit(
        &self,
        user_id: UserId,
        amount: Money,
    ) -> impl Future<Output = Result<DebitOutcome>> + Send;
}

/// Append-only transaction ledger.
pub trait TransactionLedger: Send + Sync {
    /// Record a monetary movement.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` on write failure.
    fn append(&self, transaction: &Transaction) -> impl Future<Output = Result<()>> + Send;

    /// Entries for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the query fails.
    fn list_by_user(&self, user_id: UserId)
    -> impl Future<Output = Result<Vec<Transaction>>> + Send;

    /// Entries referencing a booking or top-up, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the query fails.
    fn list_by_reference(
        &self,
        service_ref_id: uuid::Uuid,
    ) -> impl Future<Output = Result<Vec<Transaction>>> + Send;
}

/// Top-up requests.
pub trait TopupStore: Send + Sync {
    /// Persist a new pending top-up.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` on write failure.
    fn insert(&self, topup: &Topup) -> impl Future<Output = Result<()>> + Send;

    /// Fetch a top-up.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the query fails.
    fn get(&self, topup_id: TopupId) -> impl Future<Output = Result<Option<Topup>>> + Send;

    /// Compare-and-set Pending → Completed. Returns `false` if the top-up was
    /// not pending.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` on write failure.
    fn mark_completed(&self, topup_id: TopupId) -> impl Future<Output = Result<bool>> + Send;

    /// Top-ups for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::Storage` if the query fails.
    fn list_by_user(&self, user_id: UserId) -> impl Future<Output = Result<Vec<Topup>>> + Send;
}

/// Bundle of collaborators the engine runs against.
///
/// Implemented by [`StoreEnvironment`]; adapters name a concrete
/// environment once (e.g. a type alias) instead of threading six store
/// parameters through every handler.
pub trait SettlementEnvironment: Clone + Send + Sync + 'static {
    /// Room directory
    type Rooms: RoomDirectory;
    /// Booking store
    type Bookings: BookingStore;
    /// Voucher store
    type Vouchers: VoucherStore;
    /// Wallet store
    type Wallets: WalletStore;
    /// Transaction ledger
    type Ledger: TransactionLedger;
    /// Top-up store
    type Topups: TopupStore;

    /// Room directory
    fn rooms(&self) -> &Self::Rooms;
    /// Booking store
    fn bookings(&self) -> &Self::Bookings;
    /// Voucher store
    fn vouchers(&self) -> &Self::Vouchers;
    /// Wallet store
    fn wallets(&self) -> &Self::Wallets;
    /// Transaction ledger
    fn ledger(&self) -> &Self::Ledger;
    /// Top-up store
    fn topups(&self) -> &Self::Topups;
    /// Time source
    fn clock(&self) -> &dyn Clock;
}

/// Settlement environment.
///
/// Contains all external dependencies needed by the engine.
///
/// # Type Parameters
///
/// - `R`: Room directory
/// - `B`: Booking store
/// - `V`: Voucher store
/// - `W`: Wallet store
/// - `L`: Transaction ledger
/// - `T`: Top-up store
#[derive(Clone)]
pub struct StoreEnvironment<R, B, V, W, L, T>
where
    R: RoomDirectory + Clone,
    B: BookingStore + Clone,
    V: VoucherStore + Clone,
    W: WalletStore + Clone,
    L: TransactionLedger + Clone,
    T: TopupStore + Clone,
{
    /// Room directory.
    pub rooms: R,

    /// Booking store (availability index).
    pub bookings: B,

    /// Voucher store.
    pub vouchers: V,

    /// Wallet store.
    pub wallets: W,

    /// Transaction ledger.
    pub ledger: L,

    /// Top-up store.
    pub topups: T,

    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl<R, B, V, W, L, T> StoreEnvironment<R, B, V, W, L, T>
where
    R: RoomDirectory + Clone,
    B: BookingStore + Clone,
    V: VoucherStore + Clone,
    W: WalletStore + Clone,
    L: TransactionLedger + Clone,
    T: TopupStore + Clone,
{
    /// Create a new settlement environment.
    #[must_use]
    #[allow(clippy::too_many_arguments)] // One per collaborator
    pub fn new(
        rooms: R,
        bookings: B,
        vouchers: V,
        wallets: W,
        ledger: L,
        topups: T,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms,
            bookings,
            vouchers,
            wallets,
            ledger,
            topups,
            clock,
        }
    }
}

impl<R, B, V, W, L, T> SettlementEnvironment for StoreEnvironment<R, B, V, W, L, T>
where
    R: RoomDirectory + Clone + 'static,
    B: BookingStore + Clone + 'static,
    V: VoucherStore + Clone + 'static,
    W: WalletStore + Clone + 'static,
    L: TransactionLedger + Clone + 'static,
    T: TopupStore + Clone + 'static,
{
    type Rooms = R;
    type Bookings = B;
    type Vouchers = V;
    type Wallets = W;
    type Ledger = L;
    type Topups = T;

    fn rooms(&self) -> &R {
        &self.rooms
    }

    fn bookings(&self) -> &B {
        &self.bookings
    }

    fn vouchers(&self) -> &V {
        &self.vouchers
    }

    fn wallets(&self) -> &W {
        &self.wallets
    }

    fn ledger(&self) -> &L {
        &self.ledger
    }

    fn topups(&self) -> &T {
        &self.topups
    }

    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}
