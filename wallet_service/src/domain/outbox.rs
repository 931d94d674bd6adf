//! Port for writing a standalone outbox row outside of a ledger
//! mutation — used by handlers that react to a business failure
//! (spec §4.4: "On failure writes `WalletDebitFailed` to outbox
//! instead (no ledger change)") where there is no balance movement to
//! pair the event with.

use async_trait::async_trait;
use common::outbox::OutboxDraft;

use crate::domain::error::WalletError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    async fn insert(&self, draft: OutboxDraft) -> Result<(), WalletError>;
}
