//! Voucher quoting and administration.

#![allow(clippy::unwrap_used)] // Tests can unwrap

use brewspace_core::{Clock, Money, SettlementError, VoucherId, VoucherPatch};
use brewspace_testing::{InMemoryStore, fixtures, test_clock};
use chrono::Duration;

#[tokio::test]
async fn test_apply_twenty_percent_to_hundred() {
    let store = InMemoryStore::new();
    let clock = test_clock();
    let engine = fixtures::engine(&store, clock.clone());
    let voucher = store.add_voucher(fixtures::voucher("SAVE20", 20, clock.now()));

    let quote = engine
        .apply_voucher("SAVE20", Money::from_units(100))
        .await
        .unwrap();

    assert_eq!(quote.original_amount, Money::from_units(100));
    assert_eq!(quote.discount_amount, Money::from_units(20));
    assert_eq!(quote.final_amount, Money::from_units(80));
    assert_eq!(quote.discount_percent, 20);
    assert_eq!(quote.voucher_code, "SAVE20");

    // Quoting never redeems
    assert_eq!(store.voucher(voucher.id).unwrap().used_count, 0);
}

#[tokio::test]
async fn test_apply_voucher_rejections() {
    let store = InMemoryStore::new();
    let clock = test_clock();
    let engine = fixtures::engine(&store, clock.clone());
    store.add_voucher(fixtures::voucher("SAVE20", 20, clock.now()));

    assert!(matches!(
        engine.apply_voucher("SAVE20", -Money::from_units(1)).await,
        Err(SettlementError::InvalidAmount { .. })
    ));
    assert_eq!(
        engine
            .apply_voucher("SAVE 20", Money::from_units(10))
            .await
            .unwrap_err(),
        SettlementError::InvalidVoucher
    );
    assert_eq!(
        engine
            .apply_voucher("UNKNOWN", Money::from_units(10))
            .await
            .unwrap_err(),
        SettlementError::InvalidVoucher
    );

    clock.advance(Duration::days(31));
    assert_eq!(
        engine
            .apply_voucher("SAVE20", Money::from_units(10))
            .await
            .unwrap_err(),
        SettlementError::VoucherExpired
    );
}

#[tokio::test]
async fn test_apply_voucher_to_huge_amount_is_rejected() {
    let store = InMemoryStore::new();
    let clock = test_clock();
    let engine = fixtures::engine(&store, clock.clone());
    store.add_voucher(fixtures::voucher("FULL", 100, clock.now()));

    let handle = tokio::spawn(async move {
        engine
            .apply_voucher("FULL", Money::new(rust_decimal::Decimal::MAX))
            .await
    });
    let result = handle.await.unwrap();

    assert!(matches!(result, Err(SettlementError::InvalidAmount { .. })));
}

#[tokio::test]
async fn test_apply_voucher_to_zero_amount() {
    let store = InMemoryStore::new();
    let clock = test_clock();
    let engine = fixtures::engine(&store, clock.clone());
    store.add_voucher(fixtures::voucher("FREE", 100, clock.now()));

    let quote = engine.apply_voucher("FREE", Money::ZERO).await.unwrap();

    assert_eq!(quote.final_amount, Money::ZERO);
    assert_eq!(quote.discount_amount, Money::ZERO);
}

#[tokio::test]
async fn test_create_voucher_rules() {
    let store = InMemoryStore::new();
    let clock = test_clock();
    let engine = fixtures::engine(&store, clock.clone());
    let now = clock.now();

    let created = engine
        .create_voucher(fixtures::new_voucher("WELCOME", 15, now))
        .await
        .unwrap();
    assert_eq!(created.used_count, 0);
    assert_eq!(engine.get_voucher(created.id).await.unwrap(), created);

    assert_eq!(
        engine
            .create_voucher(fixtures::new_voucher("WELCOME", 5, now))
            .await
            .unwrap_err(),
        SettlementError::DuplicateVoucherCode {
            code: "WELCOME".to_string()
        }
    );
    assert_eq!(
        engine
            .create_voucher(fixtures::new_voucher("ZERO", 0, now))
            .await
            .unwrap_err(),
        SettlementError::InvalidDiscount { percent: 0 }
    );
    assert_eq!(
        engine
            .create_voucher(fixtures::new_voucher("bad code", 10, now))
            .await
            .unwrap_err(),
        SettlementError::InvalidVoucher
    );

    let mut backwards = fixtures::new_voucher("BACKWARDS", 10, now);
    backwards.valid_to = backwards.valid_from - Duration::seconds(1);
    assert_eq!(
        engine.create_voucher(backwards).await.unwrap_err(),
        SettlementError::InvalidVoucherWindow
    );

    let mut instant = fixtures::new_voucher("INSTANT", 10, now);
    instant.valid_to = instant.valid_from;
    assert!(engine.create_voucher(instant).await.is_ok());
}

#[tokio::test]
async fn test_list_valid_vouchers_excludes_expired_and_exhausted() {
    let store = InMemoryStore::new();
    let clock = test_clock();
    let engine = fixtures::engine(&store, clock.clone());
    let now = clock.now();

    let live = store.add_voucher(fixtures::voucher("LIVE", 10, now));
    let mut expired = fixtures::voucher("EXPIRED", 10, now);
    expired.valid_to = now - Duration::hours(1);
    store.add_voucher(expired);
    let mut spent = fixtures::voucher("SPENT", 10, now);
    spent.max_uses = 2;
    spent.used_count = 2;
    store.add_voucher(spent);
    let mut future = fixtures::voucher("FUTURE", 10, now);
    future.valid_from = now + Duration::days(1);
    store.add_voucher(future);

    assert_eq!(engine.list_vouchers().await.unwrap().len(), 4);

    let valid = engine.list_valid_vouchers().await.unwrap();
    assert_eq!(valid.len(), 1);
    assert_eq!(valid[0].id, live.id);
}

#[tokio::test]
async fn test_update_voucher() {
    let store = InMemoryStore::new();
    let clock = test_clock();
    let engine = fixtures::engine(&store, clock.clone());
    let now = clock.now();
    let voucher = engine
        .create_voucher(fixtures::new_voucher("SPRING", 10, now))
        .await
        .unwrap();
    engine
        .create_voucher(fixtures::new_voucher("SUMMER", 10, now))
        .await
        .unwrap();

    let updated = engine
        .update_voucher(
            voucher.id,
            VoucherPatch {
                discount_percent: Some(25),
                max_uses: Some(3),
                ..VoucherPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.discount_percent, 25);
    assert_eq!(updated.max_uses, 3);
    assert_eq!(updated.code, "SPRING");

    let taken = engine
        .update_voucher(
            voucher.id,
            VoucherPatch {
                code: Some("SUMMER".to_string()),
                ..VoucherPatch::default()
            },
        )
        .await;
    assert!(matches!(
        taken,
        Err(SettlementError::DuplicateVoucherCode { .. })
    ));

    let backwards = engine
        .update_voucher(
            voucher.id,
            VoucherPatch {
                valid_to: Some(voucher.valid_from - Duration::days(1)),
                ..VoucherPatch::default()
            },
        )
        .await;
    assert_eq!(backwards.unwrap_err(), SettlementError::InvalidVoucherWindow);

    let renamed = engine
        .update_voucher(
            voucher.id,
            VoucherPatch {
                code: Some("AUTUMN".to_string()),
                ..VoucherPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.code, "AUTUMN");
    assert_eq!(renamed.discount_percent, 25);

    assert_eq!(
        engine
            .update_voucher(VoucherId::new(), VoucherPatch::default())
            .await
            .unwrap_err(),
        SettlementError::VoucherNotFound
    );
}

#[tokio::test]
async fn test_delete_voucher() {
    let store = InMemoryStore::new();
    let clock = test_clock();
    let engine = fixtures::engine(&store, clock.clone());
    let voucher = engine
        .create_voucher(fixtures::new_voucher("GONE", 10, clock.now()))
        .await
        .unwrap();

    engine.delete_voucher(voucher.id).await.unwrap();

    assert_eq!(
        engine.get_voucher(voucher.id).await.unwrap_err(),
        SettlementError::VoucherNotFound
    );
    assert_eq!(
        engine.delete_voucher(voucher.id).await.unwrap_err(),
        SettlementError::VoucherNotFound
    );
}

#[tokio::test]
async fn test_update_cannot_lower_limit_below_usage() {
    let store = InMemoryStore::new();
    let clock = test_clock();
    let engine = fixtures::engine(&store, clock.clone());
    let mut voucher = fixtures::voucher("BUSY", 10, clock.now());
    voucher.max_uses = 10;
    voucher.used_count = 5;
    let voucher = store.add_voucher(voucher);

    let lowered = engine
        .update_voucher(
            voucher.id,
            VoucherPatch {
                max_uses: Some(3),
                ..VoucherPatch::default()
            },
        )
        .await;
    assert_eq!(
        lowered.unwrap_err(),
        SettlementError::InvalidMaxUses { max_uses: 3 }
    );
    assert_eq!(store.voucher(voucher.id).unwrap().max_uses, 10);

    let exact = engine
        .update_voucher(
            voucher.id,
            VoucherPatch {
                max_uses: Some(5),
                ..VoucherPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(exact.max_uses, 5);
    assert!(exact.is_exhausted());

    let unlimited = engine
        .update_voucher(
            voucher.id,
            VoucherPatch {
                max_uses: Some(0),
                ..VoucherPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(unlimited.max_uses, 0);
    assert_eq!(unlimited.used_count, 5);
}
