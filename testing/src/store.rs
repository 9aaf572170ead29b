//! In-memory store implementing every settlement collaborator.
//!
//! One `InMemoryStore` stands in for the room directory and all five stores.
//! Clones share state. Guarded writes (debit, voucher increment, status
//! transitions) are atomic under a single mutex, and booking inserts re-check
//! overlap the way the Postgres exclusion constraint does.
//!
//! [`Fault`]s make individual operations fail so partial-failure paths can be
//! exercised.

use brewspace_core::{
    Booking, BookingId, BookingStatus, BookingStore, Clock, DebitOutcome, MeetingRoom, Money,
    NewVoucher, Result, RoomDirectory, RoomId, SettlementError, StoreEnvironment, TimeSlot,
    Topup, TopupId, TopupStatus, TopupStore, Transaction, TransactionLedger, UserId, Voucher,
    VoucherId, VoucherPatch, VoucherStore, Wallet, WalletStore, policy::check_usage_limit,
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Environment where every collaborator is the same [`InMemoryStore`].
pub type InMemoryEnvironment = StoreEnvironment<
    InMemoryStore,
    InMemoryStore,
    InMemoryStore,
    InMemoryStore,
    InMemoryStore,
    InMemoryStore,
>;

/// Injectable failure. Active until healed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Room lookups fail
    RoomLookup,
    /// Overlap queries report every slot as free
    StaleAvailability,
    /// Booking inserts fail
    BookingInsert,
    /// Booking cancellations fail
    MarkCancelled,
    /// Voucher usage increments fail
    VoucherIncrement,
    /// Voucher usage increments report the budget as spent
    VoucherRaceLost,
    /// Voucher usage releases fail
    VoucherRelease,
    /// Debits report insufficient funds whatever the balance
    DebitDeclined,
    /// Debits fail
    Debit,
    /// Credits fail
    Credit,
    /// Ledger appends fail
    LedgerAppend,
    /// Top-up completions fail
    MarkCompleted,
}

#[derive(Debug, Default)]
struct State {
    rooms: HashMap<RoomId, MeetingRoom>,
    bookings: Vec<Booking>,
    vouchers: HashMap<VoucherId, Voucher>,
    wallets: HashMap<UserId, Money>,
    transactions: Vec<Transaction>,
    topups: Vec<Topup>,
    faults: HashSet<Fault>,
}

impl State {
    fn check(&self, fault: Fault) -> Result<()> {
        if self.faults.contains(&fault) {
            return Err(SettlementError::Storage(format!("injected fault: {fault:?}")));
        }
        Ok(())
    }

    fn has_overlap(&self, room_id: RoomId, slot: TimeSlot) -> bool {
        self.bookings
            .iter()
            .any(|b| b.room_id == room_id && b.is_active() && b.slot().overlaps(&slot))
    }

    fn code_taken(&self, code: &str, except: Option<VoucherId>) -> bool {
        self.vouchers
            .values()
            .any(|v| v.code == code && Some(v.id) != except)
    }
}

fn lock(state: &Mutex<State>) -> Result<MutexGuard<'_, State>> {
    state
        .lock()
        .map_err(|_| SettlementError::Storage("in-memory store lock poisoned".to_string()))
}

/// In-memory implementation of every store trait.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wire this store into every collaborator slot.
    #[must_use]
    pub fn environment(&self, clock: impl Clock + 'static) -> InMemoryEnvironment {
        StoreEnvironment::new(
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            Arc::new(clock),
        )
    }

    // ═══════════════════════════════════════════════════════════
    // Seeding
    // ═══════════════════════════════════════════════════════════

    /// Add a meeting room.
    pub fn add_room(&self, room: MeetingRoom) -> MeetingRoom {
        self.guard().rooms.insert(room.id, room.clone());
        room
    }

    /// Toggle a room's availability.
    pub fn set_room_available(&self, room_id: RoomId, available: bool) {
        if let Some(room) = self.guard().rooms.get_mut(&room_id) {
            room.available = available;
        }
    }

    /// Create (or overwrite) a wallet with `balance`.
    pub fn fund_wallet(&self, user_id: UserId, balance: Money) {
        self.guard().wallets.insert(user_id, balance);
    }

    /// Add a voucher as-is, bypassing validation.
    pub fn add_voucher(&self, voucher: Voucher) -> Voucher {
        self.guard().vouchers.insert(voucher.id, voucher.clone());
        voucher
    }

    /// Add a booking as-is, bypassing overlap checks.
    pub fn add_booking(&self, booking: Booking) -> Booking {
        self.guard().bookings.push(booking.clone());
        booking
    }

    /// Add a top-up as-is.
    pub fn add_topup(&self, topup: Topup) -> Topup {
        self.guard().topups.push(topup.clone());
        topup
    }

    // ═══════════════════════════════════════════════════════════
    // Fault injection
    // ═══════════════════════════════════════════════════════════

    /// Make `fault` active.
    pub fn inject(&self, fault: Fault) {
        self.guard().faults.insert(fault);
    }

    /// Clear `fault`.
    pub fn heal(&self, fault: Fault) {
        self.guard().faults.remove(&fault);
    }

    // ═══════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════

    /// Current balance, if the wallet exists.
    #[must_use]
    pub fn wallet_balance(&self, user_id: UserId) -> Option<Money> {
        self.guard().wallets.get(&user_id).copied()
    }

    /// A booking by ID.
    #[must_use]
    pub fn booking(&self, booking_id: BookingId) -> Option<Booking> {
        self.guard()
            .bookings
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
    }

    /// Every booking, in insertion order.
    #[must_use]
    pub fn all_bookings(&self) -> Vec<Booking> {
        self.guard().bookings.clone()
    }

    /// A voucher by ID.
    #[must_use]
    pub fn voucher(&self, voucher_id: VoucherId) -> Option<Voucher> {
        self.guard().vouchers.get(&voucher_id).cloned()
    }

    /// Every ledger entry, in append order.
    #[must_use]
    pub fn all_transactions(&self) -> Vec<Transaction> {
        self.guard().transactions.clone()
    }

    /// A top-up by ID.
    #[must_use]
    pub fn topup(&self, topup_id: TopupId) -> Option<Topup> {
        self.guard().topups.iter().find(|t| t.id == topup_id).cloned()
    }
}

impl RoomDirectory for InMemoryStore {
    fn get_room(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Option<MeetingRoom>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock(&state)?;
            guard.check(Fault::RoomLookup)?;
            Ok(guard.rooms.get(&room_id).cloned())
        }
    }
}

impl BookingStore for InMemoryStore {
    fn has_overlap(
        &self,
        room_id: RoomId,
        slot: TimeSlot,
    ) -> impl Future<Output = Result<bool>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock(&state)?;
            if guard.faults.contains(&Fault::StaleAvailability) {
                return Ok(false);
            }
            Ok(guard.has_overlap(room_id, slot))
        }
    }

    fn insert(&self, booking: &Booking) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        let booking = booking.clone();

        async move {
            let mut guard = lock(&state)?;
            guard.check(Fault::BookingInsert)?;
            if booking.is_active() && guard.has_overlap(booking.room_id, booking.slot()) {
                return Err(SettlementError::SlotConflict);
            }
            guard.bookings.push(booking);
            Ok(())
        }
    }

    fn get(&self, booking_id: BookingId) -> impl Future<Output = Result<Option<Booking>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock(&state)?;
            Ok(guard.bookings.iter().find(|b| b.id == booking_id).cloned())
        }
    }

    fn mark_cancelled(&self, booking_id: BookingId) -> impl Future<Output = Result<bool>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock(&state)?;
            guard.check(Fault::MarkCancelled)?;
            match guard
                .bookings
                .iter_mut()
                .find(|b| b.id == booking_id && b.status == BookingStatus::Booked)
            {
                Some(booking) => {
                    booking.status = BookingStatus::Cancelled;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    fn list_by_customer(
        &self,
        customer_id: UserId,
    ) -> impl Future<Output = Result<Vec<Booking>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock(&state)?;
            let mut bookings: Vec<Booking> = guard
                .bookings
                .iter()
                .rev()
                .filter(|b| b.customer_id == customer_id)
                .cloned()
                .collect();
            bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(bookings)
        }
    }

    fn list_by_room(&self, room_id: RoomId) -> impl Future<Output = Result<Vec<Booking>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock(&state)?;
            let mut bookings: Vec<Booking> = guard
                .bookings
                .iter()
                .filter(|b| b.room_id == room_id)
                .cloned()
                .collect();
            bookings.sort_by_key(|b| b.start_time);
            Ok(bookings)
        }
    }
}

impl VoucherStore for InMemoryStore {
    fn get_by_id(
        &self,
        voucher_id: VoucherId,
    ) -> impl Future<Output = Result<Option<Voucher>>> + Send {
        let state = Arc::clone(&self.state);

        async move { Ok(lock(&state)?.vouchers.get(&voucher_id).cloned()) }
    }

    fn get_by_code(&self, code: &str) -> impl Future<Output = Result<Option<Voucher>>> + Send {
        let state = Arc::clone(&self.state);
        let code = code.to_string();

        async move {
            let guard = lock(&state)?;
            Ok(guard.vouchers.values().find(|v| v.code == code).cloned())
        }
    }

    fn increment_usage(&self, voucher_id: VoucherId) -> impl Future<Output = Result<bool>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock(&state)?;
            guard.check(Fault::VoucherIncrement)?;
            if guard.faults.contains(&Fault::VoucherRaceLost) {
                return Ok(false);
            }
            match guard.vouchers.get_mut(&voucher_id) {
                Some(voucher) if !voucher.is_exhausted() => {
                    voucher.used_count += 1;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    fn release_usage(&self, voucher_id: VoucherId) -> impl Future<Output = Result<bool>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock(&state)?;
            guard.check(Fault::VoucherRelease)?;
            match guard.vouchers.get_mut(&voucher_id) {
                Some(voucher) if voucher.used_count > 0 => {
                    voucher.used_count -= 1;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    fn insert(&self, voucher: NewVoucher) -> impl Future<Output = Result<Voucher>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock(&state)?;
            if guard.code_taken(&voucher.code, None) {
                return Err(SettlementError::DuplicateVoucherCode { code: voucher.code });
            }
            let created = Voucher {
                id: VoucherId::new(),
                code: voucher.code,
                discount_percent: voucher.discount_percent,
                max_uses: voucher.max_uses,
                used_count: 0,
                service: voucher.service,
                valid_from: voucher.valid_from,
                valid_to: voucher.valid_to,
            };
            guard.vouchers.insert(created.id, created.clone());
            Ok(created)
        }
    }

    fn update(
        &self,
        voucher_id: VoucherId,
        patch: VoucherPatch,
    ) -> impl Future<Output = Result<Option<Voucher>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock(&state)?;
            if let Some(code) = &patch.code
                && guard.code_taken(code, Some(voucher_id))
            {
                return Err(SettlementError::DuplicateVoucherCode { code: code.clone() });
            }
            let Some(voucher) = guard.vouchers.get_mut(&voucher_id) else {
                return Ok(None);
            };
            if let Some(max_uses) = patch.max_uses {
                check_usage_limit(max_uses, voucher.used_count)?;
            }
            if let Some(code) = patch.code {
                voucher.code = code;
            }
            if let Some(percent) = patch.discount_percent {
                voucher.discount_percent = percent;
            }
            if let Some(max_uses) = patch.max_uses {
                voucher.max_uses = max_uses;
            }
            if let Some(valid_from) = patch.valid_from {
                voucher.valid_from = valid_from;
            }
            if let Some(valid_to) = patch.valid_to {
                voucher.valid_to = valid_to;
            }
            Ok(Some(voucher.clone()))
        }
    }

    fn delete(&self, voucher_id: VoucherId) -> impl Future<Output = Result<bool>> + Send {
        let state = Arc::clone(&self.state);

        async move { Ok(lock(&state)?.vouchers.remove(&voucher_id).is_some()) }
    }

    fn list(&self) -> impl Future<Output = Result<Vec<Voucher>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock(&state)?;
            let mut vouchers: Vec<Voucher> = guard.vouchers.values().cloned().collect();
            vouchers.sort_by(|a, b| {
                b.valid_from
                    .cmp(&a.valid_from)
                    .then_with(|| a.code.cmp(&b.code))
            });
            Ok(vouchers)
        }
    }
}

impl WalletStore for InMemoryStore {
    fn get(&self, user_id: UserId) -> impl Future<Output = Result<Option<Wallet>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock(&state)?;
            Ok(guard
                .wallets
                .get(&user_id)
                .map(|&balance| Wallet { user_id, balance }))
        }
    }

    fn open(&self, user_id: UserId) -> impl Future<Output = Result<Wallet>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock(&state)?;
            let balance = *guard.wallets.entry(user_id).or_insert(Money::ZERO);
            Ok(Wallet { user_id, balance })
        }
    }

    fn credit(&self, user_id: UserId, amount: Money) -> impl Future<Output = Result<Money>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock(&state)?;
            guard.check(Fault::Credit)?;
            let balance = guard
                .wallets
                .get_mut(&user_id)
                .ok_or(SettlementError::WalletNotFound)?;
            *balance = *balance + amount;
            Ok(*balance)
        }
    }

    fn debit(
        &self,
        user_id: UserId,
        amount: Money,
    ) -> impl Future<Output = Result<DebitOutcome>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock(&state)?;
            guard.check(Fault::Debit)?;
            let declined = guard.faults.contains(&Fault::DebitDeclined);
            let Some(balance) = guard.wallets.get_mut(&user_id) else {
                return Ok(DebitOutcome::WalletNotFound);
            };
            if declined || *balance < amount {
                return Ok(DebitOutcome::InsufficientFunds);
            }
            *balance = *balance - amount;
            Ok(DebitOutcome::Applied { balance: *balance })
        }
    }
}

impl TransactionLedger for InMemoryStore {
    fn append(&self, transaction: &Transaction) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        let transaction = transaction.clone();

        async move {
            let mut guard = lock(&state)?;
            guard.check(Fault::LedgerAppend)?;
            guard.transactions.push(transaction);
            Ok(())
        }
    }

    fn list_by_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Transaction>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock(&state)?;
            let mut transactions: Vec<Transaction> = guard
                .transactions
                .iter()
                .rev()
                .filter(|t| t.user_id == user_id)
                .cloned()
                .collect();
            transactions.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
            Ok(transactions)
        }
    }

    fn list_by_reference(
        &self,
        service_ref_id: uuid::Uuid,
    ) -> impl Future<Output = Result<Vec<Transaction>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock(&state)?;
            Ok(guard
                .transactions
                .iter()
                .filter(|t| t.service_ref_id == service_ref_id)
                .cloned()
                .collect())
        }
    }
}

impl TopupStore for InMemoryStore {
    fn insert(&self, topup: &Topup) -> impl Future<Output = Result<()>> + Send {
        let state = Arc::clone(&self.state);
        let topup = topup.clone();

        async move {
            lock(&state)?.topups.push(topup);
            Ok(())
        }
    }

    fn get(&self, topup_id: TopupId) -> impl Future<Output = Result<Option<Topup>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock(&state)?;
            Ok(guard.topups.iter().find(|t| t.id == topup_id).cloned())
        }
    }

    fn mark_completed(&self, topup_id: TopupId) -> impl Future<Output = Result<bool>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let mut guard = lock(&state)?;
            guard.check(Fault::MarkCompleted)?;
            match guard
                .topups
                .iter_mut()
                .find(|t| t.id == topup_id && t.status == TopupStatus::Pending)
            {
                Some(topup) => {
                    topup.status = TopupStatus::Completed;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    fn list_by_user(&self, user_id: UserId) -> impl Future<Output = Result<Vec<Topup>>> + Send {
        let state = Arc::clone(&self.state);

        async move {
            let guard = lock(&state)?;
            let mut topups: Vec<Topup> = guard
                .topups
                .iter()
                .rev()
                .filter(|t| t.user_id == user_id)
                .cloned()
                .collect();
            topups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(topups)
        }
    }
}
