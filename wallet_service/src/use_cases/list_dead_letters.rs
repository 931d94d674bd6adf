use std::sync::Arc;

use crate::domain::entities::{DeadLetter, DeadLetterStatus};
use crate::domain::error::DeadLetterError;
use crate::domain::repository::DeadLetterRepository;

/// `GET /admin/dlq[?status=]` (spec §4.6, §6).
pub struct ListDeadLettersUseCase {
    dead_letters: Arc<dyn DeadLetterRepository>,
}

impl ListDeadLettersUseCase {
    pub fn new(dead_letters: Arc<dyn DeadLetterRepository>) -> Self {
        Self { dead_letters }
    }

    pub async fn execute(&self, status: Option<DeadLetterStatus>) -> Result<Vec<DeadLetter>, DeadLetterError> {
        self.dead_letters.list(status).await
    }
}
