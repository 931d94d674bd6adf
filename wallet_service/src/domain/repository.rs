use async_trait::async_trait;

use crate::domain::entities::{DeadLetter, DeadLetterStatus, Wallet};
use crate::domain::error::{DeadLetterError, WalletError};
use crate::domain::types::{DeadLetterId, UserId, WalletId};

/// Port para la persistencia de billeteras. No expone mutación de
/// saldo directamente — eso vive detrás de
/// [`crate::domain::ledger::LedgerEngine`], que es quien garantiza la
/// invariante de idempotencia y balance no-negativo (spec §4.2).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, WalletError>;
    async fn find_by_user_id(&self, user_id: UserId) -> Result<Option<Wallet>, WalletError>;
    async fn create(&self, wallet: Wallet) -> Result<Wallet, WalletError>;
}

/// Port para la dead-letter queue (spec §4.6, §6).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeadLetterRepository: Send + Sync {
    async fn insert(&self, dead_letter: DeadLetter) -> Result<DeadLetter, DeadLetterError>;
    async fn find_by_id(&self, id: DeadLetterId) -> Result<Option<DeadLetter>, DeadLetterError>;
    async fn list(&self, status: Option<DeadLetterStatus>) -> Result<Vec<DeadLetter>, DeadLetterError>;
    async fn mark_processed(&self, id: DeadLetterId) -> Result<(), DeadLetterError>;
    async fn mark_failed(&self, id: DeadLetterId) -> Result<(), DeadLetterError>;
}
