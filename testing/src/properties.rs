//! proptest strategies for settlement domain values.

use brewspace_core::{Money, TimeSlot};
use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Non-negative amounts with cent precision, up to 100 000.00.
pub fn money() -> impl Strategy<Value = Money> {
    (0i64..10_000_000).prop_map(|cents| Money::new(Decimal::new(cents, 2)))
}

/// Discount percentages accepted by voucher definitions.
pub fn discount_percent() -> impl Strategy<Value = u8> {
    1u8..=100
}

/// Non-empty slots starting within a week of `base`, at minute granularity,
/// at most twelve hours long.
pub fn slot(base: DateTime<Utc>) -> impl Strategy<Value = TimeSlot> {
    (0i64..7 * 24 * 60, 1i64..=12 * 60).prop_map(move |(offset, length)| {
        let start = base + Duration::minutes(offset);
        TimeSlot::new(start, start + Duration::minutes(length))
    })
}
