use std::sync::Arc;

use chrono::Utc;
use common::events::{OutboxEventType, WalletCreditFailed, WalletRefunded};
use common::ids::refund_transaction_id;
use common::outbox::OutboxDraft;
use common::retry::{retry_with_backoff, Attempt, BackoffPolicy};

use crate::domain::entities::{DeadLetter, DeadLetterStatus, LedgerEntryType};
use crate::domain::error::WalletError;
use crate::domain::ledger::LedgerEngine;
use crate::domain::repository::DeadLetterRepository;
use crate::domain::types::WalletId;

/// Reacts to `wallet.credit-failed` (spec §4.4, §4.6). Refunds the
/// sender using a deterministic `transactionId` derived from
/// `transferId` so the refund is idempotent across retries, broker
/// redelivery, and DLQ replay alike — this is the only handler in
/// either service that retries in-process, and only on transient
/// store errors.
pub struct RefundWalletUseCase {
    ledger: Arc<dyn LedgerEngine>,
    dead_letters: Arc<dyn DeadLetterRepository>,
    policy: BackoffPolicy,
}

impl RefundWalletUseCase {
    pub fn new(ledger: Arc<dyn LedgerEngine>, dead_letters: Arc<dyn DeadLetterRepository>) -> Self {
        Self {
            ledger,
            dead_letters,
            policy: BackoffPolicy::default(),
        }
    }

    #[cfg(test)]
    fn with_policy(
        ledger: Arc<dyn LedgerEngine>,
        dead_letters: Arc<dyn DeadLetterRepository>,
        policy: BackoffPolicy,
    ) -> Self {
        Self {
            ledger,
            dead_letters,
            policy,
        }
    }

    #[tracing::instrument(name = "RefundWalletUseCase::execute", skip(self))]
    pub async fn execute(&self, event: WalletCreditFailed) -> Result<(), WalletError> {
        let wallet_id = WalletId(event.sender_wallet_id);
        let refund_txn_id = refund_transaction_id(event.transfer_id);

        let result = retry_with_backoff(self.policy, || {
            let ledger = self.ledger.clone();
            let event = event.clone();
            async move {
                let refunded = WalletRefunded {
                    transfer_id: event.transfer_id,
                    wallet_id: event.sender_wallet_id,
                    amount: event.amount,
                    timestamp: Utc::now(),
                };
                let draft = match OutboxDraft::new(
                    "transfer",
                    event.transfer_id,
                    OutboxEventType::WalletRefunded,
                    &refunded,
                ) {
                    Ok(d) => d,
                    Err(e) => return Attempt::Permanent(WalletError::from(e)),
                };

                match ledger
                    .apply(wallet_id, refund_txn_id, LedgerEntryType::Refund, event.amount, Some(draft))
                    .await
                {
                    Ok(_) => Attempt::Ok(()),
                    Err(e) if e.is_transient() => Attempt::Transient(e),
                    Err(e) => Attempt::Permanent(e),
                }
            }
        })
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) => self.dead_letter(&event, e).await,
        }
    }

    async fn dead_letter(&self, event: &WalletCreditFailed, error: WalletError) -> Result<(), WalletError> {
        let payload = serde_json::to_value(event)
            .map_err(|e| WalletError::InvalidData(format!("failed to serialize DLQ payload: {e}")))?;
        let dead_letter = DeadLetter {
            id: crate::domain::types::DeadLetterId::new(),
            original_topic: OutboxEventType::WalletCreditFailed.topic().to_string(),
            original_payload: payload,
            error_message: error.to_string(),
            error_stack: format!("{error:?}"),
            attempt_count: self.policy.max_attempts as i32,
            status: DeadLetterStatus::Pending,
            created_at: Utc::now(),
            processed_at: None,
        };
        self.dead_letters
            .insert(dead_letter)
            .await
            .map_err(|e| WalletError::RepositoryError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{LedgerEntry, Wallet};
    use crate::domain::ledger::{LedgerApplyOutcome, MockLedgerEngine};
    use crate::domain::repository::MockDeadLetterRepository;
    use crate::domain::types::UserId;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    fn fast_policy() -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            multiplier: 2,
            cap: Duration::from_millis(5),
        }
    }

    fn credit_failed() -> WalletCreditFailed {
        WalletCreditFailed {
            transfer_id: Uuid::new_v4(),
            sender_wallet_id: Uuid::new_v4(),
            amount: 500,
            reason: "receiver wallet not found".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn refunds_successfully_without_touching_dlq() {
        let mut ledger = MockLedgerEngine::new();
        let dead_letters = MockDeadLetterRepository::new();
        let event = credit_failed();
        let wallet_id = WalletId(event.sender_wallet_id);

        ledger.expect_apply().returning(move |wid, txn_id, ty, amount, _| {
            assert_eq!(wid, wallet_id);
            assert!(matches!(ty, LedgerEntryType::Refund));
            Ok(LedgerApplyOutcome {
                wallet: Wallet::new(UserId(Uuid::new_v4())),
                entry: LedgerEntry::new(wid, txn_id, ty, amount).unwrap(),
                already_applied: false,
            })
        });

        let use_case =
            RefundWalletUseCase::with_policy(Arc::new(ledger), Arc::new(dead_letters), fast_policy());
        use_case.execute(event).await.unwrap();
    }

    #[tokio::test]
    async fn business_errors_skip_retry_and_go_straight_to_dlq() {
        let mut ledger = MockLedgerEngine::new();
        let mut dead_letters = MockDeadLetterRepository::new();
        let calls = AtomicU32::new(0);
        let event = credit_failed();

        ledger.expect_apply().returning(move |wid, _, _, _, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(WalletError::NotFound(wid))
        });
        dead_letters.expect_insert().returning(|dl| Ok(dl));

        let use_case =
            RefundWalletUseCase::with_policy(Arc::new(ledger), Arc::new(dead_letters), fast_policy());
        use_case.execute(event).await.unwrap();
    }

    #[tokio::test]
    async fn transient_errors_retry_then_dead_letter_on_exhaustion() {
        let mut ledger = MockLedgerEngine::new();
        let mut dead_letters = MockDeadLetterRepository::new();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let event = credit_failed();

        ledger.expect_apply().returning(move |_, _, _, _, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            Err(WalletError::Transient("serialization failure".into()))
        });
        dead_letters.expect_insert().returning(|dl| Ok(dl));

        let use_case =
            RefundWalletUseCase::with_policy(Arc::new(ledger), Arc::new(dead_letters), fast_policy());
        use_case.execute(event).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
