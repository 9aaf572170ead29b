//! Builders for common test data.

use crate::store::{InMemoryEnvironment, InMemoryStore};
use brewspace_core::{
    BookingRequest, Clock, CoffeeShopId, MeetingRoom, Money, NewVoucher, RoomId,
    SettlementEngine, Voucher, VoucherId,
};
use chrono::{DateTime, Duration, Utc};

/// An available room named "Espresso Room" at `price_per_hour` whole units.
#[must_use]
pub fn room(price_per_hour: i64) -> MeetingRoom {
    MeetingRoom {
        id: RoomId::new(),
        coffee_shop_id: CoffeeShopId::new(),
        name: "Espresso Room".to_string(),
        capacity: 8,
        price_per_hour: Money::from_units(price_per_hour),
        available: true,
    }
}

/// A voucher valid from a day before `now` to thirty days after, unlimited
/// uses.
#[must_use]
pub fn voucher(code: &str, discount_percent: u8, now: DateTime<Utc>) -> Voucher {
    Voucher {
        id: VoucherId::new(),
        code: code.to_string(),
        discount_percent,
        max_uses: 0,
        used_count: 0,
        service: None,
        valid_from: now - Duration::days(1),
        valid_to: now + Duration::days(30),
    }
}

/// Voucher definition for the admin API with the same window as [`voucher`].
#[must_use]
pub fn new_voucher(code: &str, discount_percent: u8, now: DateTime<Utc>) -> NewVoucher {
    NewVoucher {
        code: code.to_string(),
        discount_percent,
        max_uses: 0,
        service: None,
        valid_from: now - Duration::days(1),
        valid_to: now + Duration::days(30),
    }
}

/// A request for `hours` starting `lead` after `now`.
#[must_use]
pub fn booking_request(
    room_id: RoomId,
    now: DateTime<Utc>,
    lead: Duration,
    hours: i64,
) -> BookingRequest {
    let start_time = now + lead;
    BookingRequest {
        room_id,
        start_time,
        end_time: start_time + Duration::hours(hours),
        voucher_code: None,
    }
}

/// An engine running entirely against `store`.
#[must_use]
pub fn engine(
    store: &InMemoryStore,
    clock: impl Clock + 'static,
) -> SettlementEngine<InMemoryEnvironment> {
    SettlementEngine::new(store.environment(clock))
}
