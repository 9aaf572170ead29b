//! Domain types for the booking and wallet settlement core.
//!
//! Identifiers, the `Money` value object, and the entities exchanged between
//! the [`SettlementEngine`](crate::engine::SettlementEngine) and its store
//! collaborators.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Creates a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user (wallet owner, customer, admin)
    UserId
);
define_id!(
    /// Unique identifier for a meeting room
    RoomId
);
define_id!(
    /// Unique identifier for a coffee shop
    CoffeeShopId
);
define_id!(
    /// Unique identifier for a booking
    BookingId
);
define_id!(
    /// Unique identifier for a voucher
    VoucherId
);
define_id!(
    /// Unique identifier for a ledger transaction
    TransactionId
);
define_id!(
    /// Unique identifier for a wallet top-up
    TopupId
);

// ============================================================================
// Money Value Object (decimal-based to avoid floating point errors)
// ============================================================================

/// A signed decimal amount of money.
///
/// Balances and prices are never negative; ledger entries use negative
/// amounts for refunds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero money
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a `Money` value from a decimal amount
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a `Money` value from whole currency units
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Returns the decimal amount
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the amount is strictly negative
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Checks if the amount is strictly positive
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Adds two amounts, returning `None` on overflow
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtracts two amounts, returning `None` on overflow
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Multiplies by a decimal factor, returning `None` on overflow
    #[must_use]
    pub fn checked_mul(self, factor: Decimal) -> Option<Self> {
        self.0.checked_mul(factor).map(Self)
    }

    /// Returns `percent`% of this amount (unrounded), `None` on overflow
    #[must_use]
    pub fn percent(self, percent: u8) -> Option<Self> {
        self.0
            .checked_mul(Decimal::from(percent))
            .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
            .map(Self)
    }

    /// Rounds to cents, midpoint away from zero
    #[must_use]
    pub fn round_to_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// ============================================================================
// Roles
// ============================================================================

/// Caller role, delivered already validated by the authentication layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator
    Admin,
    /// Coffee shop owner
    Owner,
    /// Customer booking rooms
    Customer,
}

impl Role {
    /// Voucher definitions are managed by admins only
    #[must_use]
    pub const fn can_manage_vouchers(self) -> bool {
        match self {
            Self::Admin => true,
            Self::Owner | Self::Customer => false,
        }
    }

    /// Top-up confirmation is a privileged operation
    #[must_use]
    pub const fn can_confirm_topups(self) -> bool {
        match self {
            Self::Admin => true,
            Self::Owner | Self::Customer => false,
        }
    }

    /// Whether this role may read bookings belonging to other customers
    #[must_use]
    pub const fn can_view_any_booking(self) -> bool {
        match self {
            Self::Admin | Self::Owner => true,
            Self::Customer => false,
        }
    }

    /// Wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Owner => "owner",
            Self::Customer => "customer",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            "customer" => Ok(Self::Customer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Meeting rooms
// ============================================================================

/// A bookable meeting room (read-only to the settlement engine).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRoom {
    /// Room ID
    pub id: RoomId,
    /// Owning coffee shop
    pub coffee_shop_id: CoffeeShopId,
    /// Display name
    pub name: String,
    /// Seats
    pub capacity: u32,
    /// Hourly price
    pub price_per_hour: Money,
    /// Whether the room accepts bookings
    pub available: bool,
}

// ============================================================================
// Bookings
// ============================================================================

/// Booking lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Slot is held and paid
    Booked,
    /// Booking was cancelled (terminal)
    Cancelled,
}

impl BookingStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booked" => Ok(Self::Booked),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// Half-open time interval `[start, end)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    /// Creates a slot without validating ordering
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `[a,b)` and `[c,d)` overlap iff `a < d && c < b`
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Length of the slot
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

/// A room booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking ID
    pub id: BookingId,
    /// Customer who booked
    pub customer_id: UserId,
    /// Booked room
    pub room_id: RoomId,
    /// Start of the slot
    pub start_time: DateTime<Utc>,
    /// End of the slot
    pub end_time: DateTime<Utc>,
    /// Amount charged
    pub total_price: Money,
    /// Voucher applied, if any
    pub voucher_id: Option<VoucherId>,
    /// Current status
    pub status: BookingStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// The booked interval
    #[must_use]
    pub const fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.start_time, self.end_time)
    }

    /// Whether the booking still holds its slot
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Booked
    }
}

/// Booking with the room name resolved, as returned to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingView {
    /// Booking ID
    pub id: BookingId,
    /// Customer who booked
    pub customer_id: UserId,
    /// Booked room
    pub room_id: RoomId,
    /// Room name (empty if the room no longer exists)
    pub room_name: String,
    /// Start of the slot
    pub start_time: DateTime<Utc>,
    /// End of the slot
    pub end_time: DateTime<Utc>,
    /// Amount charged
    pub total_price: Money,
    /// Voucher applied, if any
    pub voucher_id: Option<VoucherId>,
    /// Current status
    pub status: BookingStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl BookingView {
    /// Combines a booking with its room name
    #[must_use]
    pub fn new(booking: Booking, room_name: impl Into<String>) -> Self {
        Self {
            id: booking.id,
            customer_id: booking.customer_id,
            room_id: booking.room_id,
            room_name: room_name.into(),
            start_time: booking.start_time,
            end_time: booking.end_time,
            total_price: booking.total_price,
            voucher_id: booking.voucher_id,
            status: booking.status,
            created_at: booking.created_at,
        }
    }
}

/// Result of a successful `create_booking`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReceipt {
    /// The persisted booking
    pub booking: BookingView,
    /// Price before discount
    pub base_price: Money,
    /// Discount granted by the voucher
    pub discount: Money,
    /// Code of the applied voucher
    pub voucher_code: Option<String>,
}

/// Request to book a room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// Room to book
    pub room_id: RoomId,
    /// Start of the slot
    pub start_time: DateTime<Utc>,
    /// End of the slot
    pub end_time: DateTime<Utc>,
    /// Optional voucher code
    #[serde(default)]
    pub voucher_code: Option<String>,
}

// ============================================================================
// Vouchers
// ============================================================================

/// A discount voucher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    /// Voucher ID
    pub id: VoucherId,
    /// Unique redemption code
    pub code: String,
    /// Discount, 1..=100
    pub discount_percent: u8,
    /// Maximum redemptions (0 = unlimited)
    pub max_uses: u32,
    /// Redemptions so far
    pub used_count: u32,
    /// Service the voucher was issued for (informational)
    pub service: Option<ServiceKind>,
    /// Start of validity (inclusive)
    pub valid_from: DateTime<Utc>,
    /// End of validity (inclusive)
    pub valid_to: DateTime<Utc>,
}

impl Voucher {
    /// Whether `now` falls inside `[valid_from, valid_to]`
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && now <= self.valid_to
    }

    /// Whether the usage budget is spent
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.max_uses > 0 && self.used_count >= self.max_uses
    }
}

/// Fields for a new voucher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVoucher {
    /// Unique redemption code
    pub code: String,
    /// Discount, 1..=100
    pub discount_percent: u8,
    /// Maximum redemptions (0 = unlimited)
    #[serde(default)]
    pub max_uses: u32,
    /// Service the voucher is issued for
    #[serde(default)]
    pub service: Option<ServiceKind>,
    /// Start of validity
    pub valid_from: DateTime<Utc>,
    /// End of validity
    pub valid_to: DateTime<Utc>,
}

/// Partial update of a voucher; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherPatch {
    /// New code
    #[serde(default)]
    pub code: Option<String>,
    /// New discount
    #[serde(default)]
    pub discount_percent: Option<u8>,
    /// New usage budget
    #[serde(default)]
    pub max_uses: Option<u32>,
    /// New start of validity
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    /// New end of validity
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
}

/// Outcome of applying a voucher to an amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherQuote {
    /// Amount before discount
    pub original_amount: Money,
    /// Discount granted
    pub discount_amount: Money,
    /// Amount after discount
    pub final_amount: Money,
    /// Discount percentage
    pub discount_percent: u8,
    /// Voucher code
    pub voucher_code: String,
}

// ============================================================================
// Wallets and ledger
// ============================================================================

/// A user's wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Owner
    pub user_id: UserId,
    /// Current balance (never negative)
    pub balance: Money,
}

/// Result of a guarded wallet debit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebitOutcome {
    /// Balance was sufficient and has been reduced
    Applied {
        /// Balance after the debit
        balance: Money,
    },
    /// Balance was below the amount at the moment of the update
    InsufficientFunds,
    /// No wallet row for the user
    WalletNotFound,
}

/// Service a ledger entry settles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Room booking (code 1)
    Booking,
    /// Wallet top-up (code 2)
    Topup,
}

impl ServiceKind {
    /// Numeric code used by the ledger
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Booking => 1,
            Self::Topup => 2,
        }
    }

    /// Parses a numeric ledger code
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Booking),
            2 => Some(Self::Topup),
            _ => None,
        }
    }
}

/// Ledger entry status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Charge or credit settled
    Completed,
    /// Refund settled
    Refunded,
}

impl TransactionStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Refunded => "refunded",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "refunded" => Ok(Self::Refunded),
            other => Err(format!("unknown transaction status: {other}")),
        }
    }
}

/// Append-only ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Entry ID
    pub id: TransactionId,
    /// Wallet owner
    pub user_id: UserId,
    /// Settled service
    pub service: ServiceKind,
    /// ID of the booking or top-up (weak reference)
    pub service_ref_id: uuid::Uuid,
    /// Signed amount (negative = refund)
    pub amount: Money,
    /// Settlement time
    pub paid_at: DateTime<Utc>,
    /// Entry status
    pub status: TransactionStatus,
}

/// Top-up lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopupStatus {
    /// Awaiting confirmation
    Pending,
    /// Confirmed and credited (terminal)
    Completed,
}

impl TopupStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for TopupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown topup status: {other}")),
        }
    }
}

/// A wallet top-up request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topup {
    /// Top-up ID
    pub id: TopupId,
    /// Wallet owner
    pub user_id: UserId,
    /// Amount to credit
    pub amount: Money,
    /// Payment method label (e.g. "card", "bank_transfer")
    pub method: String,
    /// Current status
    pub status: TopupStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_adjacent_slots_do_not_overlap() {
        let morning = TimeSlot::new(at(9), at(11));
        let noon = TimeSlot::new(at(11), at(13));
        assert!(!morning.overlaps(&noon));
        assert!(!noon.overlaps(&morning));
    }

    #[test]
    fn test_contained_slot_overlaps() {
        let outer = TimeSlot::new(at(9), at(17));
        let inner = TimeSlot::new(at(12), at(13));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_money_percent_and_rounding() {
        let amount = Money::from_units(100);
        assert_eq!(amount.percent(20), Some(Money::from_units(20)));

        let third = Money::new(Decimal::ONE / Decimal::from(3));
        assert_eq!(third.round_to_cents().to_string(), "0.33");
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_units(18).to_string(), "18.00");
        assert_eq!((-Money::from_units(5)).to_string(), "-5.00");
    }

    #[test]
    fn test_role_permissions_are_exhaustive() {
        assert!(Role::Admin.can_manage_vouchers());
        assert!(!Role::Owner.can_manage_vouchers());
        assert!(!Role::Customer.can_confirm_topups());
        assert!(Role::Owner.can_view_any_booking());
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert!("guest".parse::<Role>().is_err());
    }

    #[test]
    fn test_voucher_budget() {
        let mut voucher = Voucher {
            id: VoucherId::new(),
            code: "SPRING".to_string(),
            discount_percent: 10,
            max_uses: 2,
            used_count: 1,
            service: None,
            valid_from: at(0),
            valid_to: at(23),
        };
        assert!(!voucher.is_exhausted());
        voucher.used_count = 2;
        assert!(voucher.is_exhausted());
        voucher.max_uses = 0;
        assert!(!voucher.is_exhausted());
    }

    #[test]
    fn test_service_codes() {
        assert_eq!(ServiceKind::Booking.code(), 1);
        assert_eq!(ServiceKind::from_code(2), Some(ServiceKind::Topup));
        assert_eq!(ServiceKind::from_code(3), None);
    }
}
