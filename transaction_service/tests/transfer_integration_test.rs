use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, Utc};
use mockall::mock;
use mockall::predicate::*;
use uuid::Uuid;

use common::outbox::OutboxDraft;
use transaction_service::api::http_routes::{get_transfer, initiate_transfer, AppState, InitiateTransferRequest};
use transaction_service::domain::entities::{Transfer, TransferStatus};
use transaction_service::domain::error::TransferError;
use transaction_service::domain::repository::TransferRepository;
use transaction_service::use_cases::get_transfer::GetTransferUseCase;
use transaction_service::use_cases::initiate_transfer::InitiateTransferUseCase;

mock! {
    pub TransferRepositoryImpl {}

    #[async_trait]
    impl TransferRepository for TransferRepositoryImpl {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Transfer>, TransferError>;
        async fn create_with_outbox(&self, transfer: Transfer, outbox: OutboxDraft) -> Result<Transfer, TransferError>;
        async fn try_transition(
            &self,
            transfer_id: Uuid,
            expected: TransferStatus,
            new: TransferStatus,
            failure_reason: Option<String>,
            outbox: Vec<OutboxDraft>,
        ) -> Result<bool, TransferError>;
        async fn find_expired(&self, now: chrono::DateTime<Utc>, limit: i64) -> Result<Vec<Transfer>, TransferError>;
    }
}

fn state(repo: MockTransferRepositoryImpl) -> Arc<AppState> {
    let repo = Arc::new(repo);
    Arc::new(AppState {
        initiate_transfer_use_case: InitiateTransferUseCase::new(repo.clone(), Duration::seconds(60)),
        get_transfer_use_case: GetTransferUseCase::new(repo),
    })
}

/// `POST /transfers` persists the saga as PENDING and returns it
/// immediately — no wait on the Ledger (spec §4.1 "Initiation contract").
#[tokio::test]
async fn initiating_a_transfer_returns_pending_with_no_wallet_round_trip() {
    let mut mock_repo = MockTransferRepositoryImpl::new();
    mock_repo
        .expect_create_with_outbox()
        .times(1)
        .returning(|transfer, _outbox| Ok(transfer));

    let state = state(mock_repo);
    let payload = InitiateTransferRequest {
        sender_wallet_id: Uuid::new_v4(),
        receiver_wallet_id: Uuid::new_v4(),
        amount: 5000,
    };

    let result = initiate_transfer(State(state), Json(payload)).await;
    let (status, body) = result.expect("initiate_transfer should succeed");

    assert_eq!(status, axum::http::StatusCode::ACCEPTED);
    assert_eq!(body.0.data.status, TransferStatus::Pending);
    assert_eq!(body.0.data.amount, 5000);
}

/// Same sender and receiver wallet is rejected before any repository
/// call (spec §4.1 "two distinct UUID wallet ids").
#[tokio::test]
async fn initiating_a_transfer_with_equal_wallets_is_rejected() {
    let mock_repo = MockTransferRepositoryImpl::new();
    let state = state(mock_repo);
    let wallet = Uuid::new_v4();

    let payload = InitiateTransferRequest {
        sender_wallet_id: wallet,
        receiver_wallet_id: wallet,
        amount: 5000,
    };

    let result = initiate_transfer(State(state), Json(payload)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn get_transfer_returns_the_current_projection() {
    let transfer_id = Uuid::new_v4();
    let now = Utc::now();
    let transfer = Transfer::reconstitute(
        transfer_id,
        Uuid::new_v4(),
        Uuid::new_v4(),
        5000,
        TransferStatus::Completed,
        None,
        now,
        now,
        now,
    );

    let mut mock_repo = MockTransferRepositoryImpl::new();
    mock_repo
        .expect_find_by_id()
        .with(eq(transfer_id))
        .times(1)
        .returning(move |_| Ok(Some(transfer.clone())));

    let state = state(mock_repo);
    let result = get_transfer(State(state), Path(transfer_id)).await;
    let body = result.expect("get_transfer should succeed");

    assert_eq!(body.0.data.status, TransferStatus::Completed);
}

#[tokio::test]
async fn get_transfer_surfaces_not_found_as_an_error() {
    let transfer_id = Uuid::new_v4();
    let mut mock_repo = MockTransferRepositoryImpl::new();
    mock_repo.expect_find_by_id().returning(|_| Ok(None));

    let state = state(mock_repo);
    let result = get_transfer(State(state), Path(transfer_id)).await;
    assert!(result.is_err());
}
