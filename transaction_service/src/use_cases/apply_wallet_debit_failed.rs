use std::sync::Arc;

use chrono::Utc;
use common::events::{OutboxEventType, TransferFailed, WalletDebitFailed};
use common::outbox::OutboxDraft;

use crate::domain::entities::TransferStatus;
use crate::domain::error::TransferError;
use crate::domain::repository::TransferRepository;

/// Reacts to `wallet.debit-failed` (spec §4.1, §4.4): `PENDING → FAILED`,
/// emitting `TransferFailed`. No compensation is needed — the debit
/// never happened, so there is nothing to refund.
pub struct ApplyWalletDebitFailedUseCase {
    transfers: Arc<dyn TransferRepository>,
}

impl ApplyWalletDebitFailedUseCase {
    pub fn new(transfers: Arc<dyn TransferRepository>) -> Self {
        Self { transfers }
    }

    #[tracing::instrument(name = "ApplyWalletDebitFailedUseCase::execute", skip(self))]
    pub async fn execute(&self, event: WalletDebitFailed) -> Result<(), TransferError> {
        let failed = TransferFailed {
            transfer_id: event.transfer_id,
            reason: event.reason.clone(),
            timestamp: Utc::now(),
        };
        let draft = OutboxDraft::new(
            "transfer",
            event.transfer_id,
            OutboxEventType::TransferFailed,
            &failed,
        )?;

        self.transfers
            .try_transition(
                event.transfer_id,
                TransferStatus::Pending,
                TransferStatus::Failed,
                Some(event.reason),
                vec![draft],
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::MockTransferRepository;
    use uuid::Uuid;

    fn event() -> WalletDebitFailed {
        WalletDebitFailed {
            transfer_id: Uuid::new_v4(),
            reason: "insufficient balance or wallet not found".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn transitions_pending_to_failed_and_emits_transfer_failed() {
        let mut mock = MockTransferRepository::new();
        mock.expect_try_transition()
            .withf(|_, expected, new, reason, outbox| {
                *expected == TransferStatus::Pending
                    && *new == TransferStatus::Failed
                    && reason.is_some()
                    && outbox.len() == 1
            })
            .returning(|_, _, _, _, _| Ok(true));

        let use_case = ApplyWalletDebitFailedUseCase::new(Arc::new(mock));
        use_case.execute(event()).await.unwrap();
    }
}
