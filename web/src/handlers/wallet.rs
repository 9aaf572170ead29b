//! Wallet endpoints: balance, top-ups and ledger history.

use crate::extractors::Caller;
use crate::state::AppState;
use crate::WebResult;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use brewspace_core::{
    Money, SettlementEnvironment, SettlementError, Topup, TopupId, Transaction, Wallet,
};
use serde::{Deserialize, Serialize};

/// Request to top up the caller's wallet.
#[derive(Debug, Serialize, Deserialize)]
pub struct TopupRequest {
    /// Amount to credit once confirmed
    pub amount: Money,
    /// Payment method label
    pub method: String,
}

/// The caller's wallet.
pub async fn get_wallet<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    caller: Caller,
) -> WebResult<Json<Wallet>> {
    Ok(Json(state.engine.get_wallet(caller.user_id).await?))
}

/// Open the caller's wallet. Idempotent.
pub async fn open_wallet<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    caller: Caller,
) -> WebResult<(StatusCode, Json<Wallet>)> {
    let wallet = state.engine.open_wallet(caller.user_id).await?;
    Ok((StatusCode::CREATED, Json(wallet)))
}

/// Request a top-up; it stays pending until an admin confirms it.
pub async fn create_topup<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    caller: Caller,
    Json(request): Json<TopupRequest>,
) -> WebResult<(StatusCode, Json<Topup>)> {
    let topup = state
        .engine
        .create_topup(caller.user_id, request.amount, &request.method)
        .await?;
    Ok((StatusCode::CREATED, Json(topup)))
}

/// The caller's top-ups, newest first.
pub async fn list_topups<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    caller: Caller,
) -> WebResult<Json<Vec<Topup>>> {
    Ok(Json(state.engine.list_topups(caller.user_id).await?))
}

/// Confirm a pending top-up and credit the wallet.
pub async fn confirm_topup<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    caller: Caller,
    Path(topup_id): Path<TopupId>,
) -> WebResult<Json<Topup>> {
    if !caller.role.can_confirm_topups() {
        return Err(SettlementError::Unauthorized.into());
    }

    tracing::info!(admin_id = %caller.user_id, topup_id = %topup_id, "Confirming top-up");
    Ok(Json(state.engine.confirm_topup(topup_id).await?))
}

/// The caller's ledger entries, newest first.
pub async fn list_transactions<E: SettlementEnvironment>(
    State(state): State<AppState<E>>,
    caller: Caller,
) -> WebResult<Json<Vec<Transaction>>> {
    Ok(Json(state.engine.list_transactions(caller.user_id).await?))
}
