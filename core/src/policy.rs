//! Pure settlement rules.
//!
//! Everything here is deterministic and side-effect free: time validation,
//! pricing, voucher eligibility and the cancellation window. The engine
//! calls these between store round-trips.

use crate::error::{Result, SettlementError};
use crate::types::{Money, NewVoucher, TimeSlot, Voucher, VoucherQuote};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

/// Maximum voucher code length.
pub const MAX_VOUCHER_CODE_LEN: usize = 64;

/// Default cancellation notice.
pub const DEFAULT_CANCELLATION_NOTICE_HOURS: i64 = 24;

const SECONDS_PER_HOUR: i64 = 3600;

/// Tunable business rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlementPolicy {
    /// Minimum time between cancellation and booking start.
    pub cancellation_notice: Duration,
}

impl SettlementPolicy {
    /// Policy with a cancellation notice of `hours`.
    #[must_use]
    pub fn with_notice_hours(hours: i64) -> Self {
        Self {
            cancellation_notice: Duration::hours(hours),
        }
    }

    /// Cancellation is allowed while at least the notice period remains
    /// before the start; exactly the notice period is still allowed.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::TooLateToCancel` inside the notice period.
    pub fn ensure_cancellable(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        if start - now < self.cancellation_notice {
            return Err(SettlementError::TooLateToCancel);
        }
        Ok(())
    }
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self::with_notice_hours(DEFAULT_CANCELLATION_NOTICE_HOURS)
    }
}

/// Treats a blank code as absent.
#[must_use]
pub fn normalize_voucher_code(code: Option<String>) -> Option<String> {
    code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}

/// 1–64 characters of ASCII alphanumerics, `-` or `_`.
///
/// # Errors
///
/// Returns `SettlementError::InvalidVoucher` if the code is malformed.
pub fn validate_voucher_code(code: &str) -> Result<()> {
    let well_formed = !code.is_empty()
        && code.len() <= MAX_VOUCHER_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if well_formed {
        Ok(())
    } else {
        Err(SettlementError::InvalidVoucher)
    }
}

/// Validates a requested booking interval against the current time.
///
/// # Errors
///
/// - `SettlementError::InvalidTimeRange` if `end <= start`
/// - `SettlementError::PastBooking` if `start < now`
pub fn validate_slot(slot: TimeSlot, now: DateTime<Utc>) -> Result<()> {
    if slot.end <= slot.start {
        return Err(SettlementError::InvalidTimeRange);
    }
    if slot.start < now {
        return Err(SettlementError::PastBooking);
    }
    Ok(())
}

/// `price_per_hour × duration_hours`, fractional hours allowed, rounded to
/// cents.
///
/// # Errors
///
/// Returns `SettlementError::InvalidTimeRange` if the product overflows.
pub fn booking_price(price_per_hour: Money, slot: TimeSlot) -> Result<Money> {
    let hours = Decimal::from(slot.duration().num_seconds()) / Decimal::from(SECONDS_PER_HOUR);
    price_per_hour
        .checked_mul(hours)
        .map(Money::round_to_cents)
        .ok_or(SettlementError::InvalidTimeRange)
}

/// Checks the validity window and usage budget.
///
/// # Errors
///
/// - `SettlementError::VoucherExpired` outside `[valid_from, valid_to]`
/// - `SettlementError::VoucherExhausted` if the budget is spent
pub fn check_voucher(voucher: &Voucher, now: DateTime<Utc>) -> Result<()> {
    if !voucher.is_valid_at(now) {
        return Err(SettlementError::VoucherExpired);
    }
    if voucher.is_exhausted() {
        return Err(SettlementError::VoucherExhausted);
    }
    Ok(())
}

/// Applies a voucher's discount to `amount`.
///
/// The final amount is rounded to cents; the discount is whatever separates
/// it from the original, so `original = discount + final` always holds.
///
/// # Errors
///
/// Returns `SettlementError::InvalidAmount` if the amount is too large to
/// discount.
pub fn quote(amount: Money, voucher: &Voucher) -> Result<VoucherQuote> {
    let final_amount = amount
        .percent(voucher.discount_percent)
        .and_then(|discount| amount.checked_sub(discount))
        .map(Money::round_to_cents)
        .ok_or(SettlementError::InvalidAmount { amount })?;
    let discount_amount = amount
        .checked_sub(final_amount)
        .ok_or(SettlementError::InvalidAmount { amount })?;
    Ok(VoucherQuote {
        original_amount: amount,
        discount_amount,
        final_amount,
        discount_percent: voucher.discount_percent,
        voucher_code: voucher.code.clone(),
    })
}

/// Validates a voucher definition as a whole.
///
/// # Errors
///
/// - `SettlementError::InvalidVoucher` for a malformed code
/// - `SettlementError::InvalidDiscount` outside 1..=100
/// - `SettlementError::InvalidVoucherWindow` if `valid_to < valid_from`
pub fn validate_voucher_definition(voucher: &NewVoucher) -> Result<()> {
    validate_voucher_code(&voucher.code)?;
    if !(1..=100).contains(&voucher.discount_percent) {
        return Err(SettlementError::InvalidDiscount {
            percent: voucher.discount_percent,
        });
    }
    if voucher.valid_to < voucher.valid_from {
        return Err(SettlementError::InvalidVoucherWindow);
    }
    Ok(())
}

/// Checks that a usage limit still covers the uses already redeemed.
/// A limit of zero means unlimited.
///
/// # Errors
///
/// Returns `SettlementError::InvalidMaxUses` if `max_uses` is below
/// `used_count`.
pub fn check_usage_limit(max_uses: u32, used_count: u32) -> Result<()> {
    if max_uses > 0 && max_uses < used_count {
        return Err(SettlementError::InvalidMaxUses { max_uses });
    }
    Ok(())
}
