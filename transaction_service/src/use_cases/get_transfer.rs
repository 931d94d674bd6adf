use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::Transfer;
use crate::domain::error::TransferError;
use crate::domain::repository::TransferRepository;

/// `GET /transfers/{id}` (spec §4.1 "Query contract", §6).
pub struct GetTransferUseCase {
    transfers: Arc<dyn TransferRepository>,
}

impl GetTransferUseCase {
    pub fn new(transfers: Arc<dyn TransferRepository>) -> Self {
        Self { transfers }
    }

    #[tracing::instrument(name = "GetTransferUseCase::execute", skip(self))]
    pub async fn execute(&self, id: Uuid) -> Result<Transfer, TransferError> {
        self.transfers
            .find_by_id(id)
            .await?
            .ok_or(TransferError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::MockTransferRepository;

    #[tokio::test]
    async fn returns_not_found_when_missing() {
        let mut mock = MockTransferRepository::new();
        mock.expect_find_by_id().returning(|_| Ok(None));

        let use_case = GetTransferUseCase::new(Arc::new(mock));
        let result = use_case.execute(Uuid::new_v4()).await;
        assert!(matches!(result, Err(TransferError::NotFound(_))));
    }
}
