use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Transfer not found with ID: {0}")]
    NotFound(Uuid),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<common::outbox::OutboxError> for TransferError {
    fn from(e: common::outbox::OutboxError) -> Self {
        TransferError::RepositoryError(e.to_string())
    }
}
