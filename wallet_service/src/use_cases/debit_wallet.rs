use std::sync::Arc;

use chrono::Utc;
use common::events::{OutboxEventType, TransferInitiated, WalletDebitFailed, WalletDebited};
use common::outbox::OutboxDraft;

use crate::domain::entities::LedgerEntryType;
use crate::domain::error::WalletError;
use crate::domain::ledger::LedgerEngine;
use crate::domain::outbox::OutboxRepository;
use crate::domain::types::WalletId;

/// Reacts to `transfer.initiated` (spec §4.4). Debits the sender and
/// emits `WalletDebited` in the same transaction as the movement; on a
/// business failure (wallet missing, insufficient balance) no ledger
/// entry is written and `WalletDebitFailed` is appended to the outbox
/// as a standalone row instead.
pub struct DebitWalletUseCase {
    ledger: Arc<dyn LedgerEngine>,
    outbox: Arc<dyn OutboxRepository>,
}

impl DebitWalletUseCase {
    pub fn new(ledger: Arc<dyn LedgerEngine>, outbox: Arc<dyn OutboxRepository>) -> Self {
        Self { ledger, outbox }
    }

    #[tracing::instrument(name = "DebitWalletUseCase::execute", skip(self))]
    pub async fn execute(&self, event: TransferInitiated) -> Result<(), WalletError> {
        let wallet_id = WalletId(event.sender_wallet_id);
        let debited = WalletDebited {
            transfer_id: event.transfer_id,
            wallet_id: event.sender_wallet_id,
            receiver_wallet_id: event.receiver_wallet_id,
            amount: event.amount,
            timestamp: Utc::now(),
        };
        let draft = OutboxDraft::new(
            "transfer",
            event.transfer_id,
            OutboxEventType::WalletDebited,
            &debited,
        )?;

        match self
            .ledger
            .apply(wallet_id, event.transfer_id, LedgerEntryType::Debit, event.amount, Some(draft))
            .await
        {
            Ok(_) => Ok(()),
            Err(e @ (WalletError::NotFound(_) | WalletError::InsufficientBalance { .. })) => {
                self.fail(event, e).await
            }
            Err(e) => Err(e),
        }
    }

    async fn fail(&self, event: TransferInitiated, error: WalletError) -> Result<(), WalletError> {
        let failed = WalletDebitFailed {
            transfer_id: event.transfer_id,
            reason: error.to_string(),
            timestamp: Utc::now(),
        };
        let draft = OutboxDraft::new(
            "transfer",
            event.transfer_id,
            OutboxEventType::WalletDebitFailed,
            &failed,
        )?;
        self.outbox.insert(draft).await
    }
}
