use std::sync::Arc;

use chrono::Utc;
use common::events::{OutboxEventType, WalletCreditFailed, WalletRefunded};
use common::ids::refund_transaction_id;
use common::outbox::OutboxDraft;
use serde::Serialize;

use crate::domain::entities::{DeadLetterStatus, LedgerEntryType};
use crate::domain::error::DeadLetterError;
use crate::domain::ledger::LedgerEngine;
use crate::domain::repository::DeadLetterRepository;
use crate::domain::types::{DeadLetterId, WalletId};

#[derive(Debug, Clone, Serialize)]
pub struct ReplayOutcome {
    pub success: bool,
    pub message: String,
}

/// `POST /admin/dlq/{id}/replay` (spec §4.6). Every dead letter in
/// this service comes from the refund path, so replay always means
/// re-running the refund's ledger movement once (no further retry —
/// that already happened before this row was written) and resolving
/// the row to PROCESSED or FAILED. Idempotent on an already-PROCESSED
/// entry because the underlying movement is idempotent on
/// `(walletId, transactionId)`.
pub struct ReplayDeadLetterUseCase {
    dead_letters: Arc<dyn DeadLetterRepository>,
    ledger: Arc<dyn LedgerEngine>,
}

impl ReplayDeadLetterUseCase {
    pub fn new(dead_letters: Arc<dyn DeadLetterRepository>, ledger: Arc<dyn LedgerEngine>) -> Self {
        Self { dead_letters, ledger }
    }

    #[tracing::instrument(name = "ReplayDeadLetterUseCase::execute", skip(self))]
    pub async fn execute(&self, id: DeadLetterId) -> Result<ReplayOutcome, DeadLetterError> {
        let dead_letter = self
            .dead_letters
            .find_by_id(id)
            .await?
            .ok_or(DeadLetterError::NotFound)?;

        if dead_letter.status == DeadLetterStatus::Processed {
            return Ok(ReplayOutcome {
                success: true,
                message: "already processed".to_string(),
            });
        }

        let event: WalletCreditFailed = match serde_json::from_value(dead_letter.original_payload) {
            Ok(event) => event,
            Err(e) => {
                self.dead_letters.mark_failed(id).await?;
                return Ok(ReplayOutcome {
                    success: false,
                    message: format!("unreadable payload: {e}"),
                });
            }
        };

        let wallet_id = WalletId(event.sender_wallet_id);
        let refund_txn_id = refund_transaction_id(event.transfer_id);
        let refunded = WalletRefunded {
            transfer_id: event.transfer_id,
            wallet_id: event.sender_wallet_id,
            amount: event.amount,
            timestamp: Utc::now(),
        };
        let draft = OutboxDraft::new(
            "transfer",
            event.transfer_id,
            OutboxEventType::WalletRefunded,
            &refunded,
        )
        .map_err(|e| DeadLetterError::RepositoryError(e.to_string()))?;

        match self
            .ledger
            .apply(wallet_id, refund_txn_id, LedgerEntryType::Refund, event.amount, Some(draft))
            .await
        {
            Ok(_) => {
                self.dead_letters.mark_processed(id).await?;
                Ok(ReplayOutcome {
                    success: true,
                    message: "replay succeeded".to_string(),
                })
            }
            Err(e) => {
                self.dead_letters.mark_failed(id).await?;
                Ok(ReplayOutcome {
                    success: false,
                    message: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DeadLetter, LedgerEntry, Wallet};
    use crate::domain::error::WalletError;
    use crate::domain::ledger::{LedgerApplyOutcome, MockLedgerEngine};
    use crate::domain::repository::MockDeadLetterRepository;
    use crate::domain::types::UserId;
    use uuid::Uuid;

    fn dead_letter_row(status: DeadLetterStatus, event: &WalletCreditFailed) -> DeadLetter {
        DeadLetter {
            id: DeadLetterId::new(),
            original_topic: OutboxEventType::WalletCreditFailed.topic().to_string(),
            original_payload: serde_json::to_value(event).unwrap(),
            error_message: "serialization failure".to_string(),
            error_stack: String::new(),
            attempt_count: 3,
            status,
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    #[tokio::test]
    async fn replay_success_marks_processed() {
        let event = WalletCreditFailed {
            transfer_id: Uuid::new_v4(),
            sender_wallet_id: Uuid::new_v4(),
            amount: 500,
            reason: "receiver wallet not found".into(),
            timestamp: Utc::now(),
        };
        let row = dead_letter_row(DeadLetterStatus::Pending, &event);
        let id = row.id;

        let mut dead_letters = MockDeadLetterRepository::new();
        dead_letters.expect_find_by_id().returning(move |_| Ok(Some(row.clone())));
        dead_letters.expect_mark_processed().returning(|_| Ok(()));

        let mut ledger = MockLedgerEngine::new();
        ledger.expect_apply().returning(|wid, txn_id, ty, amount, _| {
            Ok(LedgerApplyOutcome {
                wallet: Wallet::new(UserId(Uuid::new_v4())),
                entry: LedgerEntry::new(wid, txn_id, ty, amount).unwrap(),
                already_applied: false,
            })
        });

        let use_case = ReplayDeadLetterUseCase::new(Arc::new(dead_letters), Arc::new(ledger));
        let outcome = use_case.execute(id).await.unwrap();
        assert!(outcome.success);
    }

    #[tokio::test]
    async fn replay_is_idempotent_on_already_processed() {
        let event = WalletCreditFailed {
            transfer_id: Uuid::new_v4(),
            sender_wallet_id: Uuid::new_v4(),
            amount: 500,
            reason: "receiver wallet not found".into(),
            timestamp: Utc::now(),
        };
        let row = dead_letter_row(DeadLetterStatus::Processed, &event);
        let id = row.id;

        let mut dead_letters = MockDeadLetterRepository::new();
        dead_letters.expect_find_by_id().returning(move |_| Ok(Some(row.clone())));

        let ledger = MockLedgerEngine::new();

        let use_case = ReplayDeadLetterUseCase::new(Arc::new(dead_letters), Arc::new(ledger));
        let outcome = use_case.execute(id).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.message, "already processed");
    }

    #[tokio::test]
    async fn replay_failure_marks_failed() {
        let event = WalletCreditFailed {
            transfer_id: Uuid::new_v4(),
            sender_wallet_id: Uuid::new_v4(),
            amount: 500,
            reason: "receiver wallet not found".into(),
            timestamp: Utc::now(),
        };
        let row = dead_letter_row(DeadLetterStatus::Pending, &event);
        let id = row.id;

        let mut dead_letters = MockDeadLetterRepository::new();
        dead_letters.expect_find_by_id().returning(move |_| Ok(Some(row.clone())));
        dead_letters.expect_mark_failed().returning(|_| Ok(()));

        let mut ledger = MockLedgerEngine::new();
        ledger
            .expect_apply()
            .returning(|wid, _, _, _, _| Err(WalletError::NotFound(wid)));

        let use_case = ReplayDeadLetterUseCase::new(Arc::new(dead_letters), Arc::new(ledger));
        let outcome = use_case.execute(id).await.unwrap();
        assert!(!outcome.success);
    }
}
