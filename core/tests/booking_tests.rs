//! Booking creation, cancellation and reads against the in-memory store.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use brewspace_core::{
    BookingStatus, Clock, MeetingRoom, Money, ServiceKind, SettlementEngine, SettlementError,
    TransactionStatus, UserId,
};
use brewspace_testing::{InMemoryEnvironment, InMemoryStore, ManualClock, fixtures, test_clock};
use chrono::Duration;
use rust_decimal_macros::dec;

struct Setup {
    store: InMemoryStore,
    clock: ManualClock,
    engine: SettlementEngine<InMemoryEnvironment>,
    room: MeetingRoom,
    customer: UserId,
}

fn setup(price_per_hour: i64, balance: i64) -> Setup {
    let store = InMemoryStore::new();
    let clock = test_clock();
    let engine = fixtures::engine(&store, clock.clone());
    let room = store.add_room(fixtures::room(price_per_hour));
    let customer = UserId::new();
    store.fund_wallet(customer, Money::from_units(balance));

    Setup {
        store,
        clock,
        engine,
        room,
        customer,
    }
}

#[tokio::test]
async fn test_booking_debits_exact_price_and_records_ledger_entry() {
    let s = setup(10, 50);
    let request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(2), 2);

    let receipt = s.engine.create_booking(s.customer, request).await.unwrap();

    assert_eq!(receipt.booking.total_price, Money::from_units(20));
    assert_eq!(receipt.booking.status, BookingStatus::Booked);
    assert_eq!(receipt.booking.room_name, "Espresso Room");
    assert_eq!(receipt.discount, Money::ZERO);
    assert_eq!(receipt.voucher_code, None);
    assert_eq!(s.store.wallet_balance(s.customer), Some(Money::from_units(30)));

    let ledger = s.store.all_transactions();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].service, ServiceKind::Booking);
    assert_eq!(ledger[0].service_ref_id, *receipt.booking.id.as_uuid());
    assert_eq!(ledger[0].amount, Money::from_units(20));
    assert_eq!(ledger[0].status, TransactionStatus::Completed);
}

#[tokio::test]
async fn test_voucher_discount_is_applied_and_redeemed() {
    let s = setup(10, 50);
    let voucher = s
        .store
        .add_voucher(fixtures::voucher("COFFEE10", 10, s.clock.now()));
    let mut request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(2), 2);
    request.voucher_code = Some("COFFEE10".to_string());

    let receipt = s.engine.create_booking(s.customer, request).await.unwrap();

    assert_eq!(receipt.base_price, Money::from_units(20));
    assert_eq!(receipt.discount, Money::from_units(2));
    assert_eq!(receipt.booking.total_price, Money::from_units(18));
    assert_eq!(receipt.booking.voucher_id, Some(voucher.id));
    assert_eq!(receipt.voucher_code.as_deref(), Some("COFFEE10"));
    assert_eq!(s.store.wallet_balance(s.customer), Some(Money::from_units(32)));
    assert_eq!(s.store.voucher(voucher.id).unwrap().used_count, 1);
}

#[tokio::test]
async fn test_fractional_hours_are_priced_proportionally() {
    let s = setup(12, 100);
    let now = s.clock.now();
    let mut request = fixtures::booking_request(s.room.id, now, Duration::days(1), 1);
    request.end_time = request.start_time + Duration::minutes(90);

    let receipt = s.engine.create_booking(s.customer, request).await.unwrap();

    assert_eq!(receipt.booking.total_price.amount(), dec!(18));
}

#[tokio::test]
async fn test_end_not_after_start_is_rejected() {
    let s = setup(10, 50);
    let mut request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(1), 1);
    request.end_time = request.start_time;

    let result = s.engine.create_booking(s.customer, request).await;

    assert_eq!(result.unwrap_err(), SettlementError::InvalidTimeRange);
    assert!(s.store.all_bookings().is_empty());
    assert_eq!(s.store.wallet_balance(s.customer), Some(Money::from_units(50)));
}

#[tokio::test]
async fn test_past_start_is_rejected() {
    let s = setup(10, 50);
    let request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::minutes(-30), 1);

    let result = s.engine.create_booking(s.customer, request).await;

    assert_eq!(result.unwrap_err(), SettlementError::PastBooking);
}

#[tokio::test]
async fn test_time_range_is_checked_before_voucher_code() {
    let s = setup(10, 50);
    let mut request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(1), 1);
    request.end_time = request.start_time - Duration::hours(1);
    request.voucher_code = Some("not a code!".to_string());

    let result = s.engine.create_booking(s.customer, request).await;

    assert_eq!(result.unwrap_err(), SettlementError::InvalidTimeRange);
}

#[tokio::test]
async fn test_malformed_voucher_code_is_checked_before_room_lookup() {
    let s = setup(10, 50);
    let mut request = fixtures::booking_request(
        brewspace_core::RoomId::new(),
        s.clock.now(),
        Duration::days(1),
        1,
    );
    request.voucher_code = Some("not a code!".to_string());

    let result = s.engine.create_booking(s.customer, request).await;

    assert_eq!(result.unwrap_err(), SettlementError::InvalidVoucher);
}

#[tokio::test]
async fn test_blank_voucher_code_is_ignored() {
    let s = setup(10, 50);
    let mut request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(1), 1);
    request.voucher_code = Some("   ".to_string());

    let receipt = s.engine.create_booking(s.customer, request).await.unwrap();

    assert_eq!(receipt.booking.total_price, Money::from_units(10));
    assert_eq!(receipt.booking.voucher_id, None);
}

#[tokio::test]
async fn test_unknown_room_is_rejected() {
    let s = setup(10, 50);
    let request = fixtures::booking_request(
        brewspace_core::RoomId::new(),
        s.clock.now(),
        Duration::days(1),
        1,
    );

    let result = s.engine.create_booking(s.customer, request).await;

    assert_eq!(result.unwrap_err(), SettlementError::RoomNotFound);
}

#[tokio::test]
async fn test_unavailable_room_is_rejected() {
    let s = setup(10, 50);
    s.store.set_room_available(s.room.id, false);
    let request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(1), 1);

    let result = s.engine.create_booking(s.customer, request).await;

    assert_eq!(result.unwrap_err(), SettlementError::RoomUnavailable);
}

#[tokio::test]
async fn test_overlapping_slot_conflicts_but_adjacent_slot_does_not() {
    let s = setup(10, 100);
    let now = s.clock.now();
    let first = fixtures::booking_request(s.room.id, now, Duration::days(1), 2);
    s.engine.create_booking(s.customer, first.clone()).await.unwrap();

    let mut overlapping = first.clone();
    overlapping.start_time = first.start_time + Duration::hours(1);
    overlapping.end_time = first.end_time + Duration::hours(1);
    let result = s.engine.create_booking(s.customer, overlapping).await;
    assert_eq!(result.unwrap_err(), SettlementError::SlotConflict);

    let mut adjacent = first.clone();
    adjacent.start_time = first.end_time;
    adjacent.end_time = first.end_time + Duration::hours(1);
    assert!(s.engine.create_booking(s.customer, adjacent).await.is_ok());

    assert_eq!(s.store.wallet_balance(s.customer), Some(Money::from_units(70)));
}

#[tokio::test]
async fn test_same_slot_on_another_room_is_free() {
    let s = setup(10, 100);
    let other_room = s.store.add_room(fixtures::room(10));
    let request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(1), 2);
    s.engine.create_booking(s.customer, request.clone()).await.unwrap();

    let mut elsewhere = request;
    elsewhere.room_id = other_room.id;
    assert!(s.engine.create_booking(s.customer, elsewhere).await.is_ok());
}

#[tokio::test]
async fn test_unknown_voucher_is_rejected() {
    let s = setup(10, 50);
    let mut request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(1), 1);
    request.voucher_code = Some("NOPE".to_string());

    let result = s.engine.create_booking(s.customer, request).await;

    assert_eq!(result.unwrap_err(), SettlementError::InvalidVoucher);
    assert!(s.store.all_bookings().is_empty());
}

#[tokio::test]
async fn test_expired_voucher_is_rejected() {
    let s = setup(10, 50);
    let mut voucher = fixtures::voucher("OLD", 10, s.clock.now());
    voucher.valid_to = s.clock.now() - Duration::seconds(1);
    s.store.add_voucher(voucher);
    let mut request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(1), 1);
    request.voucher_code = Some("OLD".to_string());

    let result = s.engine.create_booking(s.customer, request).await;

    assert_eq!(result.unwrap_err(), SettlementError::VoucherExpired);
}

#[tokio::test]
async fn test_exhausted_voucher_is_rejected() {
    let s = setup(10, 50);
    let mut voucher = fixtures::voucher("ONCE", 10, s.clock.now());
    voucher.max_uses = 1;
    voucher.used_count = 1;
    s.store.add_voucher(voucher);
    let mut request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(1), 1);
    request.voucher_code = Some("ONCE".to_string());

    let result = s.engine.create_booking(s.customer, request).await;

    assert_eq!(result.unwrap_err(), SettlementError::VoucherExhausted);
}

#[tokio::test]
async fn test_last_voucher_use_then_exhausted() {
    let s = setup(10, 100);
    let mut voucher = fixtures::voucher("LAST", 50, s.clock.now());
    voucher.max_uses = 1;
    let voucher = s.store.add_voucher(voucher);

    let mut first = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(1), 1);
    first.voucher_code = Some("LAST".to_string());
    let receipt = s.engine.create_booking(s.customer, first).await.unwrap();
    assert_eq!(receipt.booking.total_price, Money::from_units(5));

    let mut second = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(2), 1);
    second.voucher_code = Some("LAST".to_string());
    let result = s.engine.create_booking(s.customer, second).await;

    assert_eq!(result.unwrap_err(), SettlementError::VoucherExhausted);
    assert_eq!(s.store.voucher(voucher.id).unwrap().used_count, 1);
}

#[tokio::test]
async fn test_missing_wallet_is_rejected() {
    let s = setup(10, 50);
    let stranger = UserId::new();
    let request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(1), 1);

    let result = s.engine.create_booking(stranger, request).await;

    assert_eq!(result.unwrap_err(), SettlementError::WalletNotFound);
}

#[tokio::test]
async fn test_insufficient_balance_writes_nothing() {
    let s = setup(10, 15);
    let voucher = s
        .store
        .add_voucher(fixtures::voucher("TEN", 10, s.clock.now()));
    let mut request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(1), 2);
    request.voucher_code = Some("TEN".to_string());

    let result = s.engine.create_booking(s.customer, request).await;

    assert_eq!(
        result.unwrap_err(),
        SettlementError::InsufficientBalance {
            required: Money::from_units(18),
            available: Money::from_units(15),
        }
    );
    assert!(s.store.all_bookings().is_empty());
    assert!(s.store.all_transactions().is_empty());
    assert_eq!(s.store.voucher(voucher.id).unwrap().used_count, 0);
    assert_eq!(s.store.wallet_balance(s.customer), Some(Money::from_units(15)));
}

#[tokio::test]
async fn test_cancel_with_exactly_notice_period_left_refunds() {
    let s = setup(10, 50);
    let request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::hours(48), 2);
    let receipt = s.engine.create_booking(s.customer, request).await.unwrap();

    s.clock.advance(Duration::hours(24));
    let cancelled = s
        .engine
        .cancel_booking(s.customer, receipt.booking.id)
        .await
        .unwrap();

    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(s.store.wallet_balance(s.customer), Some(Money::from_units(50)));

    let ledger = s.store.all_transactions();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[1].amount, -Money::from_units(20));
    assert_eq!(ledger[1].status, TransactionStatus::Refunded);
    assert_eq!(ledger[1].service_ref_id, *receipt.booking.id.as_uuid());
}

#[tokio::test]
async fn test_cancel_one_second_inside_notice_period_fails() {
    let s = setup(10, 50);
    let request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::hours(48), 2);
    let receipt = s.engine.create_booking(s.customer, request).await.unwrap();

    s.clock.advance(Duration::hours(24) + Duration::seconds(1));
    let result = s.engine.cancel_booking(s.customer, receipt.booking.id).await;

    assert_eq!(result.unwrap_err(), SettlementError::TooLateToCancel);
    assert_eq!(
        s.store.booking(receipt.booking.id).unwrap().status,
        BookingStatus::Booked
    );
    assert_eq!(s.store.wallet_balance(s.customer), Some(Money::from_units(30)));
}

#[tokio::test]
async fn test_cancel_preconditions() {
    let s = setup(10, 50);
    let request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(3), 1);
    let receipt = s.engine.create_booking(s.customer, request).await.unwrap();

    let missing = s
        .engine
        .cancel_booking(s.customer, brewspace_core::BookingId::new())
        .await;
    assert_eq!(missing.unwrap_err(), SettlementError::BookingNotFound);

    let not_owner = s.engine.cancel_booking(UserId::new(), receipt.booking.id).await;
    assert_eq!(not_owner.unwrap_err(), SettlementError::Unauthorized);

    s.engine
        .cancel_booking(s.customer, receipt.booking.id)
        .await
        .unwrap();
    let again = s.engine.cancel_booking(s.customer, receipt.booking.id).await;
    assert_eq!(again.unwrap_err(), SettlementError::AlreadyCancelled);

    // Refunded exactly once
    assert_eq!(s.store.wallet_balance(s.customer), Some(Money::from_units(50)));
}

#[tokio::test]
async fn test_cancelled_booking_frees_its_slot() {
    let s = setup(10, 50);
    let request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::days(3), 1);
    let receipt = s
        .engine
        .create_booking(s.customer, request.clone())
        .await
        .unwrap();
    s.engine
        .cancel_booking(s.customer, receipt.booking.id)
        .await
        .unwrap();

    assert!(s.engine.create_booking(s.customer, request).await.is_ok());
}

#[tokio::test]
async fn test_custom_notice_period() {
    let s = setup(10, 50);
    let engine = s
        .engine
        .clone()
        .with_policy(brewspace_core::SettlementPolicy::with_notice_hours(2));
    let request = fixtures::booking_request(s.room.id, s.clock.now(), Duration::hours(3), 1);
    let receipt = engine.create_booking(s.customer, request).await.unwrap();

    s.clock.advance(Duration::minutes(59));
    assert!(engine.cancel_booking(s.customer, receipt.booking.id).await.is_ok());
}

#[tokio::test]
async fn test_reads_resolve_room_names_and_order() {
    let s = setup(10, 100);
    let now = s.clock.now();

    let later = fixtures::booking_request(s.room.id, now, Duration::days(5), 1);
    let later = s.engine.create_booking(s.customer, later).await.unwrap();
    s.clock.advance(Duration::minutes(5));
    let sooner = fixtures::booking_request(s.room.id, now, Duration::days(2), 1);
    let sooner = s.engine.create_booking(s.customer, sooner).await.unwrap();

    let fetched = s.engine.get_booking(later.booking.id).await.unwrap();
    assert_eq!(fetched.room_name, "Espresso Room");

    let mine = s.engine.list_customer_bookings(s.customer).await.unwrap();
    let ids: Vec<_> = mine.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![sooner.booking.id, later.booking.id]);

    let by_room = s.engine.list_room_bookings(s.room.id).await.unwrap();
    let starts: Vec<_> = by_room.iter().map(|b| b.start_time).collect();
    assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(by_room[0].id, sooner.booking.id);

    assert_eq!(
        s.engine
            .get_booking(brewspace_core::BookingId::new())
            .await
            .unwrap_err(),
        SettlementError::BookingNotFound
    );
    assert_eq!(
        s.engine
            .list_room_bookings(brewspace_core::RoomId::new())
            .await
            .unwrap_err(),
        SettlementError::RoomNotFound
    );
}
