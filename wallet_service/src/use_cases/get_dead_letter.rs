use std::sync::Arc;

use crate::domain::entities::DeadLetter;
use crate::domain::error::DeadLetterError;
use crate::domain::repository::DeadLetterRepository;
use crate::domain::types::DeadLetterId;

/// `GET /admin/dlq/{id}` (spec §4.6, §6).
pub struct GetDeadLetterUseCase {
    dead_letters: Arc<dyn DeadLetterRepository>,
}

impl GetDeadLetterUseCase {
    pub fn new(dead_letters: Arc<dyn DeadLetterRepository>) -> Self {
        Self { dead_letters }
    }

    pub async fn execute(&self, id: DeadLetterId) -> Result<DeadLetter, DeadLetterError> {
        self.dead_letters
            .find_by_id(id)
            .await?
            .ok_or(DeadLetterError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::MockDeadLetterRepository;

    #[tokio::test]
    async fn returns_not_found_when_missing() {
        let mut mock = MockDeadLetterRepository::new();
        mock.expect_find_by_id().returning(|_| Ok(None));

        let use_case = GetDeadLetterUseCase::new(Arc::new(mock));
        let result = use_case.execute(DeadLetterId::new()).await;
        assert!(matches!(result, Err(DeadLetterError::NotFound)));
    }
}
