use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::domain::entities::Transfer;
use crate::use_cases::get_transfer::GetTransferUseCase;
use crate::use_cases::initiate_transfer::InitiateTransferUseCase;

pub struct AppState {
    pub initiate_transfer_use_case: InitiateTransferUseCase,
    pub get_transfer_use_case: GetTransferUseCase,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct InitiateTransferRequest {
    pub sender_wallet_id: Uuid,
    pub receiver_wallet_id: Uuid,
    pub amount: i64,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/transfers", post(initiate_transfer))
        .route("/transfers/{id}", get(get_transfer))
        .with_state(state)
}

/// POST /transfers — opens a new saga between two wallets (spec §4.1, §6).
#[utoipa::path(
    post,
    path = "/transfers",
    request_body = InitiateTransferRequest,
    responses((status = 202, description = "Transfer initiated"))
)]
pub async fn initiate_transfer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitiateTransferRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Transfer>>), ApiError> {
    let transfer = state
        .initiate_transfer_use_case
        .execute(req.sender_wallet_id, req.receiver_wallet_id, req.amount)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(transfer))))
}

/// GET /transfers/{id} — current saga status (spec §4.1, §6).
#[utoipa::path(
    get,
    path = "/transfers/{id}",
    responses((status = 200, description = "Transfer found"))
)]
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Transfer>>, ApiError> {
    let transfer = state.get_transfer_use_case.execute(id).await?;
    Ok(Json(ApiResponse::success(transfer)))
}
