//! Booking endpoints.
//!
//! - `POST /api/bookings` - book a room and pay from the caller's wallet
//! - `GET /api/bookings` - the caller's bookings, newest first
//! - `GET /api/bookings/:id` - one booking (owner, or staff)
//! - `POST /api/bookings/:id/cancel` - cancel and refund
//! - `GET /api/rooms/:id/bookings` - a room's bookings (staff)

use crate::extractors::{Caller, CorrelationId};
use crate::state::AppState;
use crate::WebResult;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use brewspace_core::{
    BookingId, BookingReceipt, BookingRequest, BookingView, RoomId, SettlementEnvironment,
    SettlementError,
};

/// Create a booking.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/bookings \
///   -H "X-User-Id: <uuid>" -H "X-User-Role: customer" \
///   -H "Content-Type: application/json" \
///   -d '{"room_id": "<uuid>", "start_time": "2025-06-01T09:00:00Z",
///        "end_time": "2025-06-01T11:00:00Z", "voucher_code": "COFFEE10"}'
/// ```
pub async fn create_booking<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    caller: Caller,
    correlation_id: CorrelationId,
    Json(request): Json<BookingRequest>,
) -> WebResult<(StatusCode, Json<BookingReceipt>)> {
    tracing::debug!(
        correlation_id = %correlation_id.0,
        customer_id = %caller.user_id,
        room_id = %request.room_id,
        "Booking requested"
    );

    let receipt = state.engine.create_booking(caller.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// List the caller's bookings.
pub async fn list_my_bookings<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    caller: Caller,
) -> WebResult<Json<Vec<BookingView>>> {
    let bookings = state.engine.list_customer_bookings(caller.user_id).await?;
    Ok(Json(bookings))
}

/// Fetch one booking. Customers only see their own.
pub async fn get_booking<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    caller: Caller,
    Path(booking_id): Path<BookingId>,
) -> WebResult<Json<BookingView>> {
    let booking = state.engine.get_booking(booking_id).await?;

    if booking.customer_id != caller.user_id && !caller.role.can_view_any_booking() {
        return Err(SettlementError::Unauthorized.into());
    }

    Ok(Json(booking))
}

/// Cancel one of the caller's bookings.
pub async fn cancel_booking<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    caller: Caller,
    Path(booking_id): Path<BookingId>,
) -> WebResult<Json<BookingView>> {
    let booking = state.engine.cancel_booking(caller.user_id, booking_id).await?;
    Ok(Json(booking))
}

/// List a room's bookings. Owners and admins only.
pub async fn list_room_bookings<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    caller: Caller,
    Path(room_id): Path<RoomId>,
) -> WebResult<Json<Vec<BookingView>>> {
    if !caller.role.can_view_any_booking() {
        return Err(SettlementError::Unauthorized.into());
    }

    let bookings = state.engine.list_room_bookings(room_id).await?;
    Ok(Json(bookings))
}
