//! Router configuration.

use crate::handlers::{bookings, health, vouchers, wallet};
use crate::middleware::correlation_id;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use brewspace_core::SettlementEnvironment;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Build the complete router: health checks at the root, the API under
/// `/api`, correlation ids and request tracing on every route.
pub fn build_router<E: SettlementEnvironment>(state: AppState<E>) -> Router {
    let api_routes = Router::new()
        // Bookings
        .route(
            "/bookings",
            post(bookings::create_booking::<E>).get(bookings::list_my_bookings::<E>),
        )
        .route("/bookings/:id", get(bookings::get_booking::<E>))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking::<E>))
        .route("/rooms/:id/bookings", get(bookings::list_room_bookings::<E>))
        // Wallet
        .route(
            "/wallet",
            get(wallet::get_wallet::<E>).post(wallet::open_wallet::<E>),
        )
        .route(
            "/wallet/topups",
            post(wallet::create_topup::<E>).get(wallet::list_topups::<E>),
        )
        .route(
            "/wallet/topups/:id/confirm",
            post(wallet::confirm_topup::<E>),
        )
        .route("/wallet/transactions", get(wallet::list_transactions::<E>))
        // Vouchers
        .route("/vouchers/apply", post(vouchers::apply_voucher::<E>))
        .route("/vouchers/valid", get(vouchers::list_valid_vouchers::<E>))
        .route(
            "/vouchers",
            post(vouchers::create_voucher::<E>).get(vouchers::list_vouchers::<E>),
        )
        .route(
            "/vouchers/:id",
            get(vouchers::get_voucher::<E>)
                .put(vouchers::update_voucher::<E>)
                .delete(vouchers::delete_voucher::<E>),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check::<E>))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(correlation_id))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}
