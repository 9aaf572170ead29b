//! Error types for settlement operations.

use crate::types::{BookingId, Money, TopupId, UserId};
use thiserror::Error;

/// Result type alias for settlement operations.
pub type Result<T> = std::result::Result<T, SettlementError>;

/// Coarse classification of a [`SettlementError`].
///
/// Adapters map this to transport status codes without matching on every
/// variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// Referenced entity does not exist
    NotFound,
    /// Request conflicts with current state
    Conflict,
    /// Not enough funds
    Resource,
    /// Caller may not act on the entity
    Authorization,
    /// Infrastructure failure
    Storage,
}

/// Error taxonomy for booking, wallet and voucher operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettlementError {
    // ═══════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════
    /// End time is not after start time.
    #[error("End time must be after start time")]
    InvalidTimeRange,

    /// Booking starts in the past.
    #[error("Cannot book a slot in the past")]
    PastBooking,

    /// Voucher code is malformed or unknown.
    #[error("Invalid voucher code")]
    InvalidVoucher,

    /// Voucher is outside its validity window.
    #[error("Voucher is not valid at this time")]
    VoucherExpired,

    /// Voucher usage budget is spent.
    #[error("Voucher has reached its usage limit")]
    VoucherExhausted,

    /// Amount is negative or zero where a positive amount is required.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// Rejected amount
        amount: Money,
    },

    /// Top-up method is blank.
    #[error("Top-up method is required")]
    InvalidTopupMethod,

    /// Discount percentage out of 1..=100.
    #[error("Discount must be between 1 and 100 percent, got {percent}")]
    InvalidDiscount {
        /// Rejected percentage
        percent: u8,
    },

    /// Voucher validity window ends before it starts.
    #[error("Voucher validity window ends before it starts")]
    InvalidVoucherWindow,

    /// Usage limit lowered below the uses already redeemed.
    #[error("Usage limit {max_uses} is below the voucher's current usage")]
    InvalidMaxUses {
        /// Rejected limit
        max_uses: u32,
    },

    // ═══════════════════════════════════════════════════════════
    // Not Found Errors
    // ═══════════════════════════════════════════════════════════
    /// Meeting room does not exist.
    #[error("Meeting room not found")]
    RoomNotFound,

    /// Booking does not exist.
    #[error("Booking not found")]
    BookingNotFound,

    /// Wallet does not exist.
    #[error("Wallet not found")]
    WalletNotFound,

    /// Top-up does not exist.
    #[error("Top-up not found")]
    TopupNotFound,

    /// Voucher does not exist.
    #[error("Voucher not found")]
    VoucherNotFound,

    // ═══════════════════════════════════════════════════════════
    // Conflict Errors
    // ═══════════════════════════════════════════════════════════
    /// Room is not accepting bookings.
    #[error("Meeting room is not available")]
    RoomUnavailable,

    /// Another booking holds an overlapping slot.
    #[error("Time slot is already booked")]
    SlotConflict,

    /// Booking was already cancelled.
    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    /// Cancellation notice period has passed.
    #[error("Booking can no longer be cancelled")]
    TooLateToCancel,

    /// Top-up is not pending.
    #[error("Top-up is not pending")]
    NotPending,

    /// Voucher code is already taken.
    #[error("Voucher code already exists: {code}")]
    DuplicateVoucherCode {
        /// Conflicting code
        code: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Resource Errors
    // ═══════════════════════════════════════════════════════════
    /// Wallet balance is below the price.
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount needed
        required: Money,
        /// Balance at check time
        available: Money,
    },

    /// Guarded debit did not apply.
    #[error("Payment failed")]
    PaymentFailed,

    // ═══════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════
    /// Caller does not own the entity.
    #[error("Not authorized to access this resource")]
    Unauthorized,

    // ═══════════════════════════════════════════════════════════
    // Storage Errors
    // ═══════════════════════════════════════════════════════════
    /// Booking was cancelled but the refund credit failed.
    #[error("Booking {booking_id} cancelled but refund to {user_id} failed: {reason}")]
    RefundFailed {
        /// Cancelled booking
        booking_id: BookingId,
        /// Wallet owner
        user_id: UserId,
        /// Underlying failure
        reason: String,
    },

    /// Top-up was confirmed but the wallet credit failed.
    #[error("Top-up {topup_id} confirmed but credit failed: {reason}")]
    CreditFailed {
        /// Confirmed top-up
        topup_id: TopupId,
        /// Underlying failure
        reason: String,
    },

    /// Store or infrastructure failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SettlementError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTimeRange
            | Self::PastBooking
            | Self::InvalidVoucher
            | Self::VoucherExpired
            | Self::VoucherExhausted
            | Self::InvalidAmount { .. }
            | Self::InvalidTopupMethod
            | Self::InvalidDiscount { .. }
            | Self::InvalidVoucherWindow
            | Self::InvalidMaxUses { .. } => ErrorKind::Validation,

            Self::RoomNotFound
            | Self::BookingNotFound
            | Self::WalletNotFound
            | Self::TopupNotFound
            | Self::VoucherNotFound => ErrorKind::NotFound,

            Self::RoomUnavailable
            | Self::SlotConflict
            | Self::AlreadyCancelled
            | Self::TooLateToCancel
            | Self::NotPending
            | Self::DuplicateVoucherCode { .. } => ErrorKind::Conflict,

            Self::InsufficientBalance { .. } | Self::PaymentFailed => ErrorKind::Resource,

            Self::Unauthorized => ErrorKind::Authorization,

            Self::RefundFailed { .. } | Self::CreditFailed { .. } | Self::Storage(_) => {
                ErrorKind::Storage
            }
        }
    }

    /// Check if this error is caused by the caller (vs. system error).
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Storage)
    }

    /// Stable machine-readable code, e.g. `SLOT_CONFLICT`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidTimeRange => "INVALID_TIME_RANGE",
            Self::PastBooking => "PAST_BOOKING",
            Self::InvalidVoucher => "INVALID_VOUCHER",
            Self::VoucherExpired => "VOUCHER_EXPIRED",
            Self::VoucherExhausted => "VOUCHER_EXHAUSTED",
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InvalidTopupMethod => "INVALID_TOPUP_METHOD",
            Self::InvalidDiscount { .. } => "INVALID_DISCOUNT",
            Self::InvalidVoucherWindow => "INVALID_VOUCHER_WINDOW",
            Self::InvalidMaxUses { .. } => "INVALID_MAX_USES",
            Self::RoomNotFound => "ROOM_NOT_FOUND",
            Self::BookingNotFound => "BOOKING_NOT_FOUND",
            Self::WalletNotFound => "WALLET_NOT_FOUND",
            Self::TopupNotFound => "TOPUP_NOT_FOUND",
            Self::VoucherNotFound => "VOUCHER_NOT_FOUND",
            Self::RoomUnavailable => "ROOM_UNAVAILABLE",
            Self::SlotConflict => "SLOT_CONFLICT",
            Self::AlreadyCancelled => "ALREADY_CANCELLED",
            Self::TooLateToCancel => "TOO_LATE_TO_CANCEL",
            Self::NotPending => "NOT_PENDING",
            Self::DuplicateVoucherCode { .. } => "DUPLICATE_VOUCHER_CODE",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::PaymentFailed => "PAYMENT_FAILED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::RefundFailed { .. } => "REFUND_FAILED",
            Self::CreditFailed { .. } => "CREDIT_FAILED",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}
