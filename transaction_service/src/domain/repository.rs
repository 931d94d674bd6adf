use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{Transfer, TransferStatus};
use crate::domain::error::TransferError;

/// Port for persisting and transitioning the saga record (spec §4.1,
/// §5). Every transition that crosses the durable boundary — the
/// conditional status update and the outbox insert of the event it
/// produces — happens inside exactly one local transaction, which is
/// why this trait owns both instead of splitting them across a plain
/// repository and a separate outbox call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransferRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transfer>, TransferError>;

    /// Inserts a brand-new `PENDING` transfer and its `TransferInitiated`
    /// outbox row atomically (spec §4.1 "Initiation contract").
    async fn create_with_outbox(
        &self,
        transfer: Transfer,
        outbox: common::outbox::OutboxDraft,
    ) -> Result<Transfer, TransferError>;

    /// Conditionally transitions `transfer_id` from `expected` to `new`,
    /// writing `failure_reason` (if any) and appending every draft in
    /// `outbox` in the same local transaction. Returns `true` if this
    /// call won the transition (one affected row); `false` means a
    /// duplicate delivery or a racing scanner/handler already moved the
    /// row, and the caller MUST treat that as a no-op (spec §4.1, §4.5).
    async fn try_transition(
        &self,
        transfer_id: Uuid,
        expected: TransferStatus,
        new: TransferStatus,
        failure_reason: Option<String>,
        outbox: Vec<common::outbox::OutboxDraft>,
    ) -> Result<bool, TransferError>;

    /// Finds transfers past `timeout_at` still in a non-terminal state,
    /// oldest deadline first, up to `limit` (spec §4.5).
    async fn find_expired(
        &self,
        now: chrono::DateTime<chrono::Utc>,
        limit: i64,
    ) -> Result<Vec<Transfer>, TransferError>;
}
