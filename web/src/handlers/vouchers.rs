//! Voucher endpoints.
//!
//! Any caller may price an amount against a voucher and list the vouchers
//! currently usable. Definitions are managed by admins.

use crate::extractors::{Caller, RequireAdmin};
use crate::state::AppState;
use crate::WebResult;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use brewspace_core::{
    Money, NewVoucher, SettlementEnvironment, Voucher, VoucherId, VoucherPatch, VoucherQuote,
};
use serde::{Deserialize, Serialize};

/// Request to price an amount with a voucher.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApplyVoucherRequest {
    /// Voucher code
    pub code: String,
    /// Amount to discount
    pub amount: Money,
}

/// Quote a discount without redeeming the voucher.
pub async fn apply_voucher<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    _caller: Caller,
    Json(request): Json<ApplyVoucherRequest>,
) -> WebResult<Json<VoucherQuote>> {
    let quote = state
        .engine
        .apply_voucher(&request.code, request.amount)
        .await?;
    Ok(Json(quote))
}

/// Vouchers inside their window with uses left.
pub async fn list_valid_vouchers<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    _caller: Caller,
) -> WebResult<Json<Vec<Voucher>>> {
    Ok(Json(state.engine.list_valid_vouchers().await?))
}

/// Define a voucher.
pub async fn create_voucher<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    RequireAdmin(admin): RequireAdmin,
    Json(voucher): Json<NewVoucher>,
) -> WebResult<(StatusCode, Json<Voucher>)> {
    let voucher = state.engine.create_voucher(voucher).await?;
    tracing::info!(admin_id = %admin.user_id, code = %voucher.code, "Voucher created");
    Ok((StatusCode::CREATED, Json(voucher)))
}

/// Every voucher definition.
pub async fn list_vouchers<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    _admin: RequireAdmin,
) -> WebResult<Json<Vec<Voucher>>> {
    Ok(Json(state.engine.list_vouchers().await?))
}

/// One voucher definition.
pub async fn get_voucher<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    _admin: RequireAdmin,
    Path(voucher_id): Path<VoucherId>,
) -> WebResult<Json<Voucher>> {
    Ok(Json(state.engine.get_voucher(voucher_id).await?))
}

/// Patch a voucher definition.
pub async fn update_voucher<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    RequireAdmin(admin): RequireAdmin,
    Path(voucher_id): Path<VoucherId>,
    Json(patch): Json<VoucherPatch>,
) -> WebResult<Json<Voucher>> {
    let voucher = state.engine.update_voucher(voucher_id, patch).await?;
    tracing::info!(admin_id = %admin.user_id, voucher_id = %voucher_id, "Voucher updated");
    Ok(Json(voucher))
}

/// Delete a voucher definition.
pub async fn delete_voucher<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    RequireAdmin(admin): RequireAdmin,
    Path(voucher_id): Path<VoucherId>,
) -> WebResult<StatusCode> {
    state.engine.delete_voucher(voucher_id).await?;
    tracing::info!(admin_id = %admin.user_id, voucher_id = %voucher_id, "Voucher deleted");
    Ok(StatusCode::NO_CONTENT)
}
