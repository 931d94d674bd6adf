use crate::domain::types::{UserId, WalletId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet not found with ID: {0}")]
    NotFound(WalletId),

    #[error("Wallet already exists for user: {0}")]
    DuplicateUser(UserId),

    #[error("Invalid wallet data: {0}")]
    InvalidData(String),

    /// Insufficient balance: the wallet holds `current`, the operation
    /// needed `required` (spec §4.2 step 3, §8 scenario 2).
    #[error("Insufficient balance: have {current}, need {required}")]
    InsufficientBalance { current: i64, required: i64 },

    /// A transient store error (serialization failure, connection
    /// loss). Only the refund path retries on this; everywhere else it
    /// propagates and relies on broker redelivery (spec §4.6, §7).
    #[error("transient store error: {0}")]
    Transient(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl WalletError {
    /// Classifies whether this error is worth retrying in-process
    /// (used only by the refund path's backoff wrapper, spec §4.6).
    pub fn is_transient(&self) -> bool {
        matches!(self, WalletError::Transient(_))
    }
}

impl From<common::outbox::OutboxError> for WalletError {
    fn from(e: common::outbox::OutboxError) -> Self {
        WalletError::RepositoryError(e.to_string())
    }
}

impl From<DeadLetterError> for WalletError {
    fn from(e: DeadLetterError) -> Self {
        WalletError::RepositoryError(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum DeadLetterError {
    #[error("dead letter not found")]
    NotFound,

    #[error("repository error: {0}")]
    RepositoryError(String),
}
