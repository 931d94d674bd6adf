use std::sync::Arc;

use common::events::WalletDebited;

use crate::domain::entities::TransferStatus;
use crate::domain::error::TransferError;
use crate::domain::repository::TransferRepository;

/// Reacts to `wallet.debited` (spec §4.1, §4.4): `PENDING → DEBITED`,
/// no outbox event of its own. The conditional `WHERE status =
/// PENDING` guard makes this idempotent under redelivery and safe to
/// race against the timeout scanner — whichever wins the single-row
/// update is the only one with an observable effect.
pub struct ApplyWalletDebitedUseCase {
    transfers: Arc<dyn TransferRepository>,
}

impl ApplyWalletDebitedUseCase {
    pub fn new(transfers: Arc<dyn TransferRepository>) -> Self {
        Self { transfers }
    }

    #[tracing::instrument(name = "ApplyWalletDebitedUseCase::execute", skip(self))]
    pub async fn execute(&self, event: WalletDebited) -> Result<(), TransferError> {
        self.transfers
            .try_transition(
                event.transfer_id,
                TransferStatus::Pending,
                TransferStatus::Debited,
                None,
                Vec::new(),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::MockTransferRepository;
    use chrono::Utc;
    use uuid::Uuid;

    fn event() -> WalletDebited {
        WalletDebited {
            transfer_id: Uuid::new_v4(),
            wallet_id: Uuid::new_v4(),
            receiver_wallet_id: Uuid::new_v4(),
            amount: 500,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn transitions_pending_to_debited_with_no_outbox() {
        let mut mock = MockTransferRepository::new();
        mock.expect_try_transition()
            .withf(|_, expected, new, reason, outbox| {
                *expected == TransferStatus::Pending
                    && *new == TransferStatus::Debited
                    && reason.is_none()
                    && outbox.is_empty()
            })
            .returning(|_, _, _, _, _| Ok(true));

        let use_case = ApplyWalletDebitedUseCase::new(Arc::new(mock));
        use_case.execute(event()).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_delivery_is_a_silent_no_op() {
        let mut mock = MockTransferRepository::new();
        mock.expect_try_transition().returning(|_, _, _, _, _| Ok(false));

        let use_case = ApplyWalletDebitedUseCase::new(Arc::new(mock));
        use_case.execute(event()).await.unwrap();
    }
}
