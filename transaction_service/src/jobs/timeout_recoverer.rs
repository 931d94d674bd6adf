//! The periodic timeout scanner (spec §4.5). Runs on a fixed period,
//! independent of any handler: a stuck saga is one whose `timeout_at`
//! has passed while still `PENDING` or `DEBITED`. The scanner's own
//! conditional transition uses the same `WHERE status = expected`
//! guard the event handlers use, so a real event racing the scanner
//! always leaves exactly one winner.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use common::events::{OutboxEventType, TransferFailed, WalletCreditFailed};
use common::outbox::OutboxDraft;
use tracing::{error, info, warn};

use crate::domain::entities::{Transfer, TransferStatus};
use crate::domain::error::TransferError;
use crate::domain::repository::TransferRepository;

pub struct TimeoutRecoverer {
    transfers: Arc<dyn TransferRepository>,
    period: StdDuration,
    batch_size: i64,
}

impl TimeoutRecoverer {
    pub fn new(transfers: Arc<dyn TransferRepository>, period: StdDuration, batch_size: i64) -> Self {
        Self {
            transfers,
            period,
            batch_size,
        }
    }

    /// Runs a single scan: finds expired sagas and fails each one,
    /// oldest deadline first. Returns the number of transfers it
    /// actually transitioned (duplicates/races that lost are not
    /// counted). Used directly by tests; [`run`](Self::run) wraps this
    /// in the periodic loop.
    pub async fn tick(&self) -> Result<usize, TransferError> {
        let expired = self
            .transfers
            .find_expired(Utc::now(), self.batch_size)
            .await?;

        let mut recovered = 0;
        for transfer in expired {
            match self.recover_one(&transfer).await {
                Ok(true) => recovered += 1,
                Ok(false) => {
                    info!(transfer_id = %transfer.id, "timeout scan lost the race, already terminal");
                }
                Err(e) => error!(transfer_id = %transfer.id, error = %e, "failed to recover stuck transfer"),
            }
        }
        Ok(recovered)
    }

    async fn recover_one(&self, transfer: &Transfer) -> Result<bool, TransferError> {
        match transfer.status {
            TransferStatus::Pending => self.recover_pending(transfer).await,
            TransferStatus::Debited => self.recover_debited(transfer).await,
            TransferStatus::Completed | TransferStatus::Failed => Ok(false),
        }
    }

    async fn recover_pending(&self, transfer: &Transfer) -> Result<bool, TransferError> {
        let reason = "saga timeout: debit not processed".to_string();
        let failed = TransferFailed {
            transfer_id: transfer.id,
            reason: reason.clone(),
            timestamp: Utc::now(),
        };
        let draft = OutboxDraft::new("transfer", transfer.id, OutboxEventType::TransferFailed, &failed)?;

        let won = self
            .transfers
            .try_transition(
                transfer.id,
                TransferStatus::Pending,
                TransferStatus::Failed,
                Some(reason),
                vec![draft],
            )
            .await?;
        if won {
            warn!(transfer_id = %transfer.id, "failed stuck PENDING transfer on timeout");
        }
        Ok(won)
    }

    /// A DEBITED timeout must also drive compensation: the synthetic
    /// `WalletCreditFailed` flows to the Ledger and triggers the normal
    /// refund path, reusing its deterministic idempotency key so a
    /// genuine in-flight credit can never produce a double refund
    /// (spec §4.5, §9 Open Question).
    async fn recover_debited(&self, transfer: &Transfer) -> Result<bool, TransferError> {
        let reason = "saga timeout: credit not processed".to_string();
        let now = Utc::now();

        let failed = TransferFailed {
            transfer_id: transfer.id,
            reason: reason.clone(),
            timestamp: now,
        };
        let failed_draft =
            OutboxDraft::new("transfer", transfer.id, OutboxEventType::TransferFailed, &failed)?;

        let synthetic_credit_failed = WalletCreditFailed {
            transfer_id: transfer.id,
            sender_wallet_id: transfer.sender_wallet_id,
            amount: transfer.amount,
            reason: "saga timeout".to_string(),
            timestamp: now,
        };
        let credit_failed_draft = OutboxDraft::new(
            "transfer",
            transfer.id,
            OutboxEventType::WalletCreditFailed,
            &synthetic_credit_failed,
        )?;

        let won = self
            .transfers
            .try_transition(
                transfer.id,
                TransferStatus::Debited,
                TransferStatus::Failed,
                Some(reason),
                vec![failed_draft, credit_failed_draft],
            )
            .await?;
        if won {
            warn!(transfer_id = %transfer.id, "failed stuck DEBITED transfer on timeout, compensation triggered");
        }
        Ok(won)
    }

    /// Runs [`tick`](Self::tick) forever on `period`, logging and
    /// continuing on error — a missed tick is harmless because every
    /// effect here is idempotent (spec §5 "Cancellation and timeouts").
    pub async fn run(self) -> ! {
        let mut interval = tokio::time::interval(self.period);
        loop {
            interval.tick().await;
            if let Err(e) = self.tick().await {
                error!(error = %e, "timeout scan tick failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::MockTransferRepository;
    use chrono::Duration;
    use uuid::Uuid;

    fn stuck(status: TransferStatus) -> Transfer {
        let now = Utc::now();
        Transfer::reconstitute(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            3000,
            status,
            None,
            now - Duration::seconds(60),
            now - Duration::seconds(120),
            now - Duration::seconds(120),
        )
    }

    #[tokio::test]
    async fn fails_stuck_pending_transfer_with_timeout_reason() {
        let transfer = stuck(TransferStatus::Pending);
        let mut mock = MockTransferRepository::new();
        mock.expect_find_expired()
            .returning(move |_, _| Ok(vec![transfer.clone()]));
        mock.expect_try_transition()
            .withf(|_, expected, new, reason, outbox| {
                *expected == TransferStatus::Pending
                    && *new == TransferStatus::Failed
                    && reason.as_deref() == Some("saga timeout: debit not processed")
                    && outbox.len() == 1
            })
            .returning(|_, _, _, _, _| Ok(true));

        let recoverer = TimeoutRecoverer::new(Arc::new(mock), StdDuration::from_secs(10), 50);
        assert_eq!(recoverer.tick().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn fails_stuck_debited_transfer_and_emits_synthetic_credit_failed() {
        let transfer = stuck(TransferStatus::Debited);
        let mut mock = MockTransferRepository::new();
        mock.expect_find_expired()
            .returning(move |_, _| Ok(vec![transfer.clone()]));
        mock.expect_try_transition()
            .withf(|_, expected, new, reason, outbox| {
                *expected == TransferStatus::Debited
                    && *new == TransferStatus::Failed
                    && reason.as_deref() == Some("saga timeout: credit not processed")
                    && outbox.len() == 2
            })
            .returning(|_, _, _, _, _| Ok(true));

        let recoverer = TimeoutRecoverer::new(Arc::new(mock), StdDuration::from_secs(10), 50);
        assert_eq!(recoverer.tick().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn a_lost_race_is_not_counted_as_recovered() {
        let transfer = stuck(TransferStatus::Pending);
        let mut mock = MockTransferRepository::new();
        mock.expect_find_expired()
            .returning(move |_, _| Ok(vec![transfer.clone()]));
        mock.expect_try_transition().returning(|_, _, _, _, _| Ok(false));

        let recoverer = TimeoutRecoverer::new(Arc::new(mock), StdDuration::from_secs(10), 50);
        assert_eq!(recoverer.tick().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_scan_is_a_no_op() {
        let mut mock = MockTransferRepository::new();
        mock.expect_find_expired().returning(|_, _| Ok(vec![]));

        let recoverer = TimeoutRecoverer::new(Arc::new(mock), StdDuration::from_secs(10), 50);
        assert_eq!(recoverer.tick().await.unwrap(), 0);
    }
}
