//! HTTP API tests against the in-memory environment.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use brewspace_core::{
    BookingReceipt, BookingStatus, BookingView, Clock, MeetingRoom, Money, Topup, TopupStatus,
    Transaction, UserId, Voucher, VoucherQuote, Wallet,
};
use brewspace_testing::{InMemoryStore, ManualClock, fixtures, test_clock};
use brewspace_web::{AppState, CORRELATION_ID_HEADER, build_router};
use chrono::Duration;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

struct Setup {
    server: TestServer,
    store: InMemoryStore,
    clock: ManualClock,
    room: MeetingRoom,
}

fn setup() -> Setup {
    let store = InMemoryStore::new();
    let clock = test_clock();
    let room = store.add_room(fixtures::room(10));
    let app = build_router(AppState::new(fixtures::engine(&store, clock.clone())));
    let server = TestServer::new(app).expect("Failed to start test server");

    Setup {
        server,
        store,
        clock,
        room,
    }
}

fn as_user(request: TestRequest, user: UserId, role: &str) -> TestRequest {
    request
        .add_header(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_str(&user.to_string()).unwrap(),
        )
        .add_header(
            HeaderName::from_static("x-user-role"),
            HeaderValue::from_str(role).unwrap(),
        )
}

fn booking_body(s: &Setup, lead: Duration, hours: i64) -> Value {
    let request = fixtures::booking_request(s.room.id, s.clock.now(), lead, hours);
    serde_json::to_value(request).unwrap()
}

#[tokio::test]
async fn test_health_and_ready() {
    let s = setup();

    let health = s.server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.json::<Value>()["status"], "ok");

    let ready = s.server.get("/ready").await;
    assert_eq!(ready.status_code(), StatusCode::OK);
    assert_eq!(ready.json::<Value>()["ready"], true);
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let s = setup();
    let id = uuid::Uuid::new_v4().to_string();

    let response = s
        .server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-correlation-id"),
            HeaderValue::from_str(&id).unwrap(),
        )
        .await;

    assert_eq!(
        response.headers().get(CORRELATION_ID_HEADER).unwrap(),
        id.as_str()
    );
}

#[tokio::test]
async fn test_missing_identity_is_401() {
    let s = setup();

    let response = s.server.get("/api/wallet").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = as_user(s.server.get("/api/wallet"), UserId::new(), "barista").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wallet_topup_and_confirmation() {
    let s = setup();
    let customer = UserId::new();
    let admin = UserId::new();

    let opened = as_user(s.server.post("/api/wallet"), customer, "customer").await;
    assert_eq!(opened.status_code(), StatusCode::CREATED);
    assert_eq!(opened.json::<Wallet>().balance, Money::ZERO);

    let created = as_user(s.server.post("/api/wallet/topups"), customer, "customer")
        .json(&json!({ "amount": "25.50", "method": "card" }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let topup = created.json::<Topup>();
    assert_eq!(topup.status, TopupStatus::Pending);

    let path = format!("/api/wallet/topups/{}/confirm", topup.id);

    let denied = as_user(s.server.post(&path), customer, "customer").await;
    assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);

    let confirmed = as_user(s.server.post(&path), admin, "admin").await;
    assert_eq!(confirmed.status_code(), StatusCode::OK);
    assert_eq!(confirmed.json::<Topup>().status, TopupStatus::Completed);

    let again = as_user(s.server.post(&path), admin, "admin").await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);
    assert_eq!(again.json::<Value>()["code"], "NOT_PENDING");

    let wallet = as_user(s.server.get("/api/wallet"), customer, "customer").await;
    assert_eq!(wallet.json::<Wallet>().balance, Money::new(dec!(25.50)));

    let topups = as_user(s.server.get("/api/wallet/topups"), customer, "customer").await;
    assert_eq!(topups.json::<Vec<Topup>>().len(), 1);
}

#[tokio::test]
async fn test_invalid_topup_is_422() {
    let s = setup();
    let customer = UserId::new();
    s.store.fund_wallet(customer, Money::ZERO);

    let response = as_user(s.server.post("/api/wallet/topups"), customer, "customer")
        .json(&json!({ "amount": "0", "method": "card" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "INVALID_AMOUNT");
}

#[tokio::test]
async fn test_booking_with_voucher_then_cancel() {
    let s = setup();
    let customer = UserId::new();
    let admin = UserId::new();
    s.store.fund_wallet(customer, Money::from_units(50));

    let voucher = as_user(s.server.post("/api/vouchers"), admin, "admin")
        .json(&fixtures::new_voucher("COFFEE10", 10, s.clock.now()))
        .await;
    assert_eq!(voucher.status_code(), StatusCode::CREATED);

    let mut body = booking_body(&s, Duration::days(2), 2);
    body["voucher_code"] = json!("COFFEE10");
    let created = as_user(s.server.post("/api/bookings"), customer, "customer")
        .json(&body)
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let receipt = created.json::<BookingReceipt>();
    assert_eq!(receipt.booking.total_price, Money::from_units(18));
    assert_eq!(receipt.discount, Money::from_units(2));

    let mine = as_user(s.server.get("/api/bookings"), customer, "customer").await;
    assert_eq!(mine.json::<Vec<BookingView>>().len(), 1);

    let path = format!("/api/bookings/{}", receipt.booking.id);
    let stranger = as_user(s.server.get(&path), UserId::new(), "customer").await;
    assert_eq!(stranger.status_code(), StatusCode::FORBIDDEN);
    let owner = as_user(s.server.get(&path), UserId::new(), "owner").await;
    assert_eq!(owner.status_code(), StatusCode::OK);

    let cancelled = as_user(s.server.post(&format!("{path}/cancel")), customer, "customer").await;
    assert_eq!(cancelled.status_code(), StatusCode::OK);
    assert_eq!(cancelled.json::<BookingView>().status, BookingStatus::Cancelled);

    let wallet = as_user(s.server.get("/api/wallet"), customer, "customer").await;
    assert_eq!(wallet.json::<Wallet>().balance, Money::from_units(50));

    let history = as_user(s.server.get("/api/wallet/transactions"), customer, "customer").await;
    assert_eq!(history.json::<Vec<Transaction>>().len(), 2);
}

#[tokio::test]
async fn test_booking_errors_map_to_statuses() {
    let s = setup();
    let customer = UserId::new();
    let rival = UserId::new();
    s.store.fund_wallet(customer, Money::from_units(50));
    s.store.fund_wallet(rival, Money::from_units(5));

    let first = as_user(s.server.post("/api/bookings"), customer, "customer")
        .json(&booking_body(&s, Duration::days(2), 2))
        .await;
    assert_eq!(first.status_code(), StatusCode::CREATED);

    let clash = as_user(s.server.post("/api/bookings"), customer, "customer")
        .json(&booking_body(&s, Duration::days(2) + Duration::hours(1), 1))
        .await;
    assert_eq!(clash.status_code(), StatusCode::CONFLICT);
    assert_eq!(clash.json::<Value>()["code"], "SLOT_CONFLICT");

    let poor = as_user(s.server.post("/api/bookings"), rival, "customer")
        .json(&booking_body(&s, Duration::days(3), 2))
        .await;
    assert_eq!(poor.status_code(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(poor.json::<Value>()["code"], "INSUFFICIENT_BALANCE");

    let mut backwards = booking_body(&s, Duration::days(4), 1);
    backwards["end_time"] = backwards["start_time"].clone();
    let invalid = as_user(s.server.post("/api/bookings"), customer, "customer")
        .json(&backwards)
        .await;
    assert_eq!(invalid.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(invalid.json::<Value>()["code"], "INVALID_TIME_RANGE");

    let missing = as_user(
        s.server.get(&format!("/api/bookings/{}", uuid::Uuid::new_v4())),
        customer,
        "customer",
    )
    .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_room_bookings_are_staff_only() {
    let s = setup();
    let path = format!("/api/rooms/{}/bookings", s.room.id);

    let customer = as_user(s.server.get(&path), UserId::new(), "customer").await;
    assert_eq!(customer.status_code(), StatusCode::FORBIDDEN);

    let owner = as_user(s.server.get(&path), UserId::new(), "owner").await;
    assert_eq!(owner.status_code(), StatusCode::OK);
    assert!(owner.json::<Vec<BookingView>>().is_empty());
}

#[tokio::test]
async fn test_voucher_admin_routes_require_admin() {
    let s = setup();
    let owner = UserId::new();

    let create = as_user(s.server.post("/api/vouchers"), owner, "owner")
        .json(&fixtures::new_voucher("NOPE", 10, s.clock.now()))
        .await;
    assert_eq!(create.status_code(), StatusCode::FORBIDDEN);

    let list = as_user(s.server.get("/api/vouchers"), owner, "owner").await;
    assert_eq!(list.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_voucher_lifecycle_and_quote() {
    let s = setup();
    let admin = UserId::new();
    let customer = UserId::new();

    let created = as_user(s.server.post("/api/vouchers"), admin, "admin")
        .json(&fixtures::new_voucher("SPRING20", 20, s.clock.now()))
        .await;
    let voucher = created.json::<Voucher>();
    let path = format!("/api/vouchers/{}", voucher.id);

    let duplicate = as_user(s.server.post("/api/vouchers"), admin, "admin")
        .json(&fixtures::new_voucher("SPRING20", 5, s.clock.now()))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let quote = as_user(s.server.post("/api/vouchers/apply"), customer, "customer")
        .json(&json!({ "code": "SPRING20", "amount": "100" }))
        .await;
    assert_eq!(quote.status_code(), StatusCode::OK);
    let quote = quote.json::<VoucherQuote>();
    assert_eq!(quote.discount_amount, Money::from_units(20));
    assert_eq!(quote.final_amount, Money::from_units(80));

    let valid = as_user(s.server.get("/api/vouchers/valid"), customer, "customer").await;
    assert_eq!(valid.json::<Vec<Voucher>>().len(), 1);

    let updated = as_user(s.server.put(&path), admin, "admin")
        .json(&json!({ "discount_percent": 30 }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    assert_eq!(updated.json::<Voucher>().discount_percent, 30);

    let fetched = as_user(s.server.get(&path), admin, "admin").await;
    assert_eq!(fetched.json::<Voucher>().discount_percent, 30);

    let deleted = as_user(s.server.delete(&path), admin, "admin").await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let gone = as_user(s.server.get(&path), admin, "admin").await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
}
