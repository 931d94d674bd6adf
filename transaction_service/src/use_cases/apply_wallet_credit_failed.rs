use std::sync::Arc;

use chrono::Utc;
use common::events::{OutboxEventType, TransferFailed, WalletCreditFailed};
use common::outbox::OutboxDraft;

use crate::domain::entities::TransferStatus;
use crate::domain::error::TransferError;
use crate::domain::repository::TransferRepository;

/// Reacts to `wallet.credit-failed` (spec §4.1, §4.4): `DEBITED →
/// FAILED`, emitting `TransferFailed`. Compensation (the refund) is
/// driven entirely by the Ledger reacting to the same topic — the
/// Coordinator's only job here is to record the saga's outcome.
pub struct ApplyWalletCreditFailedUseCase {
    transfers: Arc<dyn TransferRepository>,
}

impl ApplyWalletCreditFailedUseCase {
    pub fn new(transfers: Arc<dyn TransferRepository>) -> Self {
        Self { transfers }
    }

    #[tracing::instrument(name = "ApplyWalletCreditFailedUseCase::execute", skip(self))]
    pub async fn execute(&self, event: WalletCreditFailed) -> Result<(), TransferError> {
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
                TransferStatus::Debited,
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

    fn event() -> WalletCreditFailed {
        WalletCreditFailed {
            transfer_id: Uuid::new_v4(),
            sender_wallet_id: Uuid::new_v4(),
            amount: 500,
            reason: "receiver wallet not found".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn transitions_debited_to_failed_and_emits_transfer_failed() {
        let mut mock = MockTransferRepository::new();
        mock.expect_try_transition()
            .withf(|_, expected, new, reason, outbox| {
                *expected == TransferStatus::Debited
                    && *new == TransferStatus::Failed
                    && reason.is_some()
                    && outbox.len() == 1
            })
            .returning(|_, _, _, _, _| Ok(true));

        let use_case = ApplyWalletCreditFailedUseCase::new(Arc::new(mock));
        use_case.execute(event()).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_wallet_credit_failed_delivery_is_a_no_op() {
        let mut mock = MockTransferRepository::new();
        mock.expect_try_transition().returning(|_, _, _, _, _| Ok(false));

        let use_case = ApplyWalletCreditFailedUseCase::new(Arc::new(mock));
        use_case.execute(event()).await.unwrap();
    }
}
