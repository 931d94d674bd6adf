use std::sync::Arc;

use chrono::{Duration, Utc};
use common::events::{OutboxEventType, TransferInitiated};
use common::outbox::OutboxDraft;
use uuid::Uuid;

use crate::domain::entities::Transfer;
use crate::domain::error::TransferError;
use crate::domain::repository::TransferRepository;

/// `POST /transfers` (spec §4.1 "Initiation contract", §6). Persists the
/// new saga and its `TransferInitiated` outbox row in one local
/// transaction and returns immediately — no network I/O happens in the
/// request path, the Ledger only ever learns about this transfer once
/// the outbox publisher ships the event.
pub struct InitiateTransferUseCase {
    transfers: Arc<dyn TransferRepository>,
    saga_timeout: Duration,
}

impl InitiateTransferUseCase {
    pub fn new(transfers: Arc<dyn TransferRepository>, saga_timeout: Duration) -> Self {
        Self {
            transfers,
            saga_timeout,
        }
    }

    #[tracing::instrument(name = "InitiateTransferUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        sender_wallet_id: Uuid,
        receiver_wallet_id: Uuid,
        amount: i64,
    ) -> Result<Transfer, TransferError> {
        let transfer = Transfer::initiate(
            sender_wallet_id,
            receiver_wallet_id,
            amount,
            self.saga_timeout,
        )?;

        let event = TransferInitiated {
            transfer_id: transfer.id,
            sender_wallet_id: transfer.sender_wallet_id,
            receiver_wallet_id: transfer.receiver_wallet_id,
            amount: transfer.amount,
            timestamp: Utc::now(),
        };
        let draft = OutboxDraft::new(
            "transfer",
            transfer.id,
            OutboxEventType::TransferInitiated,
            &event,
        )?;

        self.transfers.create_with_outbox(transfer, draft).await
    }
}
