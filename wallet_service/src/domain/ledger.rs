//! The idempotent ledger engine (spec §4.2).
//!
//! Every balance mutation in the wallet service — debit, credit,
//! refund — goes through [`LedgerEngine::apply`] rather than a direct
//! repository call, because the idempotency guarantee and the
//! non-negative-balance invariant only hold if every mutation is
//! routed through the same algorithm:
//!
//! 1. Look up an existing ledger entry for `(wallet_id, transaction_id)`.
//!    If one exists, the event has already been applied — return the
//!    current wallet unchanged (this is what makes broker redelivery
//!    and DLQ replay safe).
//! 2. Otherwise, for a debit, conditionally update the balance with
//!    `WHERE balance >= amount` so a concurrent debit can never drive
//!    it negative; for a credit or refund, update unconditionally.
//! 3. If the conditional update affected zero rows, the debit is
//!    rejected with [`crate::domain::error::WalletError::InsufficientBalance`].
//! 4. Insert the new ledger entry.
//! 5. Optionally insert an outbox draft in the same local transaction,
//!    so the resulting domain event can never be published without the
//!    mutation that produced it (or vice versa).
//! 6. Commit.
//!
//! All of this happens inside one database transaction; the trait
//! itself stays transport-agnostic so unit tests can swap in a fake
//! without Postgres.

use async_trait::async_trait;
use uuid::Uuid;

use common::outbox::OutboxDraft;

use crate::domain::entities::{LedgerEntry, LedgerEntryType, Wallet};
use crate::domain::error::WalletError;

/// Outcome of a single [`LedgerEngine::apply`] call.
#[derive(Debug, Clone)]
pub struct LedgerApplyOutcome {
    pub wallet: Wallet,
    pub entry: LedgerEntry,
    /// `true` if `(wallet_id, transaction_id)` had already been applied
    /// and this call was a no-op replay (step 1 of the algorithm).
    pub already_applied: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerEngine: Send + Sync {
    /// Applies a single ledger movement idempotently. `outbox` is
    /// inserted in the same local transaction as the movement when the
    /// movement is newly applied; it is never inserted on a replay.
    async fn apply(
        &self,
        wallet_id: crate::domain::types::WalletId,
        transaction_id: Uuid,
        entry_type: LedgerEntryType,
        amount: i64,
        outbox: Option<OutboxDraft>,
    ) -> Result<LedgerApplyOutcome, WalletError>;
}
