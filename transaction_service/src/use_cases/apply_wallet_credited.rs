use std::sync::Arc;

use chrono::Utc;
use common::events::{OutboxEventType, TransferCompleted, WalletCredited};
use common::outbox::OutboxDraft;

use crate::domain::entities::TransferStatus;
use crate::domain::error::TransferError;
use crate::domain::repository::TransferRepository;

/// Reacts to `wallet.credited` (spec §4.1, §4.4): `DEBITED → COMPLETED`,
/// emitting `TransferCompleted`. This is the saga's only success path.
pub struct ApplyWalletCreditedUseCase {
    transfers: Arc<dyn TransferRepository>,
}

impl ApplyWalletCreditedUseCase {
    pub fn new(transfers: Arc<dyn TransferRepository>) -> Self {
        Self { transfers }
    }

    #[tracing::instrument(name = "ApplyWalletCreditedUseCase::execute", skip(self))]
    pub async fn execute(&self, event: WalletCredited) -> Result<(), TransferError> {
        let completed = TransferCompleted {
            transfer_id: event.transfer_id,
            timestamp: Utc::now(),
        };
        let draft = OutboxDraft::new(
            "transfer",
            event.transfer_id,
            OutboxEventType::TransferCompleted,
            &completed,
        )?;

        self.transfers
            .try_transition(
                event.transfer_id,
                TransferStatus::Debited,
                TransferStatus::Completed,
                None,
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

    fn event() -> WalletCredited {
        WalletCredited {
            transfer_id: Uuid::new_v4(),
            wallet_id: Uuid::new_v4(),
            amount: 500,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn transitions_debited_to_completed_and_emits_transfer_completed() {
        let mut mock = MockTransferRepository::new();
        mock.expect_try_transition()
            .withf(|_, expected, new, reason, outbox| {
                *expected == TransferStatus::Debited
                    && *new == TransferStatus::Completed
                    && reason.is_none()
                    && outbox.len() == 1
            })
            .returning(|_, _, _, _, _| Ok(true));

        let use_case = ApplyWalletCreditedUseCase::new(Arc::new(mock));
        use_case.execute(event()).await.unwrap();
    }
}
