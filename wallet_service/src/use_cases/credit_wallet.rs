use std::sync::Arc;

use chrono::Utc;
use common::events::{OutboxEventType, WalletCredited, WalletCreditFailed, WalletDebited};
use common::outbox::OutboxDraft;

use crate::domain::entities::LedgerEntryType;
use crate::domain::error::WalletError;
use crate::domain::ledger::LedgerEngine;
use crate::domain::outbox::OutboxRepository;
use crate::domain::types::WalletId;

/// Reacts to `wallet.debited` (spec §4.4). Credits the receiver and
/// emits `WalletCredited`; on failure writes `WalletCreditFailed`
/// carrying the sender wallet id, so the subsequent refund handler
/// knows which wallet to pay back without looking anything up.
pub struct CreditWalletUseCase {
    ledger: Arc<dyn LedgerEngine>,
    outbox: Arc<dyn OutboxRepository>,
}

impl CreditWalletUseCase {
    pub fn new(ledger: Arc<dyn LedgerEngine>, outbox: Arc<dyn OutboxRepository>) -> Self {
        Self { ledger, outbox }
    }

    #[tracing::instrument(name = "CreditWalletUseCase::execute", skip(self))]
    pub async fn execute(&self, event: WalletDebited) -> Result<(), WalletError> {
        let receiver_id = WalletId(event.receiver_wallet_id);
        let credited = WalletCredited {
            transfer_id: event.transfer_id,
            wallet_id: event.receiver_wallet_id,
            amount: event.amount,
            timestamp: Utc::now(),
        };
        let draft = OutboxDraft::new(
            "transfer",
            event.transfer_id,
            OutboxEventType::WalletCredited,
            &credited,
        )?;

        match self
            .ledger
            .apply(receiver_id, event.transfer_id, LedgerEntryType::Credit, event.amount, Some(draft))
            .await
        {
            Ok(_) => Ok(()),
            Err(e @ (WalletError::NotFound(_) | WalletError::InsufficientBalance { .. })) => {
                self.fail(event, e).await
            }
            Err(e) => Err(e),
        }
    }

    async fn fail(&self, event: WalletDebited, error: WalletError) -> Result<(), WalletError> {
        let failed = WalletCreditFailed {
            transfer_id: event.transfer_id,
            sender_wallet_id: event.wallet_id,
            amount: event.amount,
            reason: error.to_string(),
            timestamp: Utc::now(),
        };
        let draft = OutboxDraft::new(
            "transfer",
            event.transfer_id,
            OutboxEventType::WalletCreditFailed,
            &failed,
        )?;
        self.outbox.insert(draft).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{LedgerEntry, Wallet};
    use crate::domain::ledger::{LedgerApplyOutcome, MockLedgerEngine};
    use crate::domain::outbox::MockOutboxRepository;
    use crate::domain::types::UserId;
    use uuid::Uuid;

    fn debited() -> WalletDebited {
        WalletDebited {
            transfer_id: Uuid::new_v4(),
            wallet_id: Uuid::new_v4(),
            receiver_wallet_id: Uuid::new_v4(),
            amount: 500,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn credits_receiver_and_emits_wallet_credited() {
        let mut ledger = MockLedgerEngine::new();
        let outbox = MockOutboxRepository::new();
        let event = debited();
        let receiver_id = WalletId(event.receiver_wallet_id);

        ledger.expect_apply().returning(move |wid, txn_id, ty, amount, draft| {
            assert_eq!(wid, receiver_id);
            assert!(matches!(ty, LedgerEntryType::Credit));
            assert!(draft.is_some());
            Ok(LedgerApplyOutcome {
                wallet: Wallet::new(UserId(Uuid::new_v4())),
                entry: LedgerEntry::new(wid, txn_id, ty, amount).unwrap(),
                already_applied: false,
            })
        });

        let use_case = CreditWalletUseCase::new(Arc::new(ledger), Arc::new(outbox));
        use_case.execute(event).await.unwrap();
    }

    #[tokio::test]
    async fn writes_credit_failed_carrying_sender_wallet_id() {
        let mut ledger = MockLedgerEngine::new();
        let mut outbox = MockOutboxRepository::new();
        let event = debited();
        let sender_id = event.wallet_id;

        ledger
            .expect_apply()
            .returning(|_, _, _, _, _| Err(WalletError::NotFound(WalletId(Uuid::new_v4()))));
        outbox.expect_insert().returning(move |draft| {
            let payload: WalletCreditFailed = serde_json::from_value(draft.payload.clone()).unwrap();
            assert_eq!(payload.sender_wallet_id, sender_id);
            Ok(())
        });

        let use_case = CreditWalletUseCase::new(Arc::new(ledger), Arc::new(outbox));
        use_case.execute(event).await.unwrap();
    }

    /// Spec §8 scenario 4: the receiver-missing compensation path must
    /// carry the real error message so it contains "Wallet not found".
    #[tokio::test]
    async fn writes_credit_failed_reason_for_missing_receiver() {
        let mut ledger = MockLedgerEngine::new();
        let mut outbox = MockOutboxRepository::new();
        let event = debited();
        let missing = WalletId(event.receiver_wallet_id);

        ledger
            .expect_apply()
            .returning(move |_, _, _, _, _| Err(WalletError::NotFound(missing)));
        outbox.expect_insert().returning(|draft| {
            let payload: WalletCreditFailed = serde_json::from_value(draft.payload.clone()).unwrap();
            assert!(payload.reason.contains("Wallet not found"));
            Ok(())
        });

        let use_case = CreditWalletUseCase::new(Arc::new(ledger), Arc::new(outbox));
        use_case.execute(event).await.unwrap();
    }
}
