use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::response::ApiResponse;
use crate::domain::entities::{DeadLetter, DeadLetterStatus, Wallet};
use crate::domain::types::{DeadLetterId, UserId, WalletId};
use crate::use_cases::create_wallet::CreateWalletUseCase;
use crate::use_cases::get_dead_letter::GetDeadLetterUseCase;
use crate::use_cases::get_wallet::GetWalletUseCase;
use crate::use_cases::list_dead_letters::ListDeadLettersUseCase;
use crate::use_cases::replay_dead_letter::ReplayDeadLetterUseCase;

pub struct AppState {
    pub create_wallet_use_case: CreateWalletUseCase,
    pub get_wallet_use_case: GetWalletUseCase,
    pub list_dead_letters_use_case: ListDeadLettersUseCase,
    pub get_dead_letter_use_case: GetDeadLetterUseCase,
    pub replay_dead_letter_use_case: ReplayDeadLetterUseCase,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateWalletRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ListDeadLettersQuery {
    pub status: Option<DeadLetterStatus>,
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/wallets", post(create_wallet))
        .route("/wallets/{id}", get(get_wallet_details))
        .route("/admin/dlq", get(list_dead_letters))
        .route("/admin/dlq/{id}", get(get_dead_letter))
        .route("/admin/dlq/{id}/replay", post(replay_dead_letter))
        .with_state(state)
}

/// POST /wallets — opens a wallet for a user (spec §4.1).
#[utoipa::path(
    post,
    path = "/wallets",
    request_body = CreateWalletRequest,
    responses((status = 201, description = "Wallet created"))
)]
pub async fn create_wallet(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Wallet>>), ApiError> {
    let wallet = state
        .create_wallet_use_case
        .execute(UserId(req.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(wallet))))
}

/// GET /wallets/{id} — balance and metadata for one wallet (spec §4.1, §6).
#[utoipa::path(
    get,
    path = "/wallets/{id}",
    responses((status = 200, description = "Wallet found"))
)]
pub async fn get_wallet_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Wallet>>, ApiError> {
    let wallet = state.get_wallet_use_case.execute(WalletId(id)).await?;
    Ok(Json(ApiResponse::success(wallet)))
}

/// GET /admin/dlq[?status=] — dead-letter queue listing (spec §4.6, §6).
#[utoipa::path(
    get,
    path = "/admin/dlq",
    responses((status = 200, description = "Dead letters"))
)]
pub async fn list_dead_letters(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDeadLettersQuery>,
) -> Result<Json<ApiResponse<Vec<DeadLetter>>>, ApiError> {
    let letters = state
        .list_dead_letters_use_case
        .execute(query.status)
        .await?;
    Ok(Json(ApiResponse::success(letters)))
}

/// GET /admin/dlq/{id} — a single dead letter (spec §4.6, §6).
#[utoipa::path(
    get,
    path = "/admin/dlq/{id}",
    responses((status = 200, description = "Dead letter found"))
)]
pub async fn get_dead_letter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeadLetter>>, ApiError> {
    let letter = state
        .get_dead_letter_use_case
        .execute(DeadLetterId(id))
        .await?;
    Ok(Json(ApiResponse::success(letter)))
}

/// POST /admin/dlq/{id}/replay — re-attempts the refund a dead letter
/// parked (spec §4.6, §6).
#[utoipa::path(
    post,
    path = "/admin/dlq/{id}/replay",
    responses((status = 200, description = "Replay attempted"))
)]
pub async fn replay_dead_letter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<crate::use_cases::replay_dead_letter::ReplayOutcome>>, ApiError> {
    let outcome = state
        .replay_dead_letter_use_case
        .execute(DeadLetterId(id))
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}
