use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::TransferError;

/// The saga's lifecycle (spec §3, §4.1). `Completed` and `Failed` are
/// absorbing: once reached, no further transition is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transfer_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Pending,
    Debited,
    Completed,
    Failed,
}

impl TransferStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Failed)
    }
}

/// The saga record itself. `id` is a time-ordered UUID used as the
/// broker message key so all events for one saga land in total order
/// on a single partition (spec §3, §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub sender_wallet_id: Uuid,
    pub receiver_wallet_id: Uuid,
    pub amount: i64,
    pub status: TransferStatus,
    pub failure_reason: Option<String>,
    pub timeout_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transfer {
    /// Validates and constructs a brand-new saga in `PENDING`, with
    /// `timeout_at = now + saga_timeout` (spec §4.1 "Initiation contract").
    pub fn initiate(
        sender_wallet_id: Uuid,
        receiver_wallet_id: Uuid,
        amount: i64,
        saga_timeout: Duration,
    ) -> Result<Self, TransferError> {
        if sender_wallet_id == receiver_wallet_id {
            return Err(TransferError::Validation(
                "sender and receiver wallet must differ".to_string(),
            ));
        }
        if amount < 1 {
            return Err(TransferError::Validation(
                "amount must be a positive integer".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: common::ids::new_id(),
            sender_wallet_id,
            receiver_wallet_id,
            amount,
            status: TransferStatus::Pending,
            failure_reason: None,
            timeout_at: now + saga_timeout,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn reconstitute(
        id: Uuid,
        sender_wallet_id: Uuid,
        receiver_wallet_id: Uuid,
        amount: i64,
        status: TransferStatus,
        failure_reason: Option<String>,
        timeout_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sender_wallet_id,
            receiver_wallet_id,
            amount,
            status,
            failure_reason,
            timeout_at,
            created_at,
            updated_at,
        }
    }
}
