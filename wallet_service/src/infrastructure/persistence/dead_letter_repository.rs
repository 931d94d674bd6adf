use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::{DeadLetter, DeadLetterStatus};
use crate::domain::error::DeadLetterError;
use crate::domain::repository::DeadLetterRepository;
use crate::domain::types::DeadLetterId;
use crate::infrastructure::persistence::models::DeadLetterModel;

/// Repositorio de la dead-letter queue basado en PostgreSQL (spec §4.6, §6).
pub struct PostgresDeadLetterRepository {
    pool: PgPool,
}

impl PostgresDeadLetterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeadLetterRepository for PostgresDeadLetterRepository {
    async fn insert(&self, dead_letter: DeadLetter) -> Result<DeadLetter, DeadLetterError> {
        let model = DeadLetterModel::from(dead_letter);

        let saved = sqlx::query_as::<_, DeadLetterModel>(
            r#"
            INSERT INTO dead_letter_queue (
                id, original_topic, original_payload, error_message, error_stack,
                attempt_count, status, created_at, processed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, original_topic, original_payload, error_message, error_stack,
                      attempt_count, status, created_at, processed_at
            "#,
        )
        .bind(model.id)
        .bind(model.original_topic)
        .bind(model.original_payload)
        .bind(model.error_message)
        .bind(model.error_stack)
        .bind(model.attempt_count)
        .bind(model.status)
        .bind(model.created_at)
        .bind(model.processed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DeadLetterError::RepositoryError(e.to_string()))?;

        Ok(saved.into())
    }

    async fn find_by_id(&self, id: DeadLetterId) -> Result<Option<DeadLetter>, DeadLetterError> {
        let model_opt = sqlx::query_as::<_, DeadLetterModel>(
            r#"
            SELECT id, original_topic, original_payload, error_message, error_stack,
                   attempt_count, status, created_at, processed_at
            FROM dead_letter_queue WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DeadLetterError::RepositoryError(e.to_string()))?;

        Ok(model_opt.map(Into::into))
    }

    async fn list(
        &self,
        status: Option<DeadLetterStatus>,
    ) -> Result<Vec<DeadLetter>, DeadLetterError> {
        let models = match status {
            Some(status) => {
                sqlx::query_as::<_, DeadLetterModel>(
                    r#"
                    SELECT id, original_topic, original_payload, error_message, error_stack,
                           attempt_count, status, created_at, processed_at
                    FROM dead_letter_queue
                    WHERE status = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(status)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, DeadLetterModel>(
                    r#"
                    SELECT id, original_topic, original_payload, error_message, error_stack,
                           attempt_count, status, created_at, processed_at
                    FROM dead_letter_queue
                    ORDER BY created_at DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| DeadLetterError::RepositoryError(e.to_string()))?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn mark_processed(&self, id: DeadLetterId) -> Result<(), DeadLetterError> {
        let result = sqlx::query(
            r#"UPDATE dead_letter_queue SET status = 'PROCESSED', processed_at = now() WHERE id = $1"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DeadLetterError::RepositoryError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DeadLetterError::NotFound);
        }
        Ok(())
    }

    async fn mark_failed(&self, id: DeadLetterId) -> Result<(), DeadLetterError> {
        let result = sqlx::query(
            r#"UPDATE dead_letter_queue SET status = 'FAILED', processed_at = now() WHERE id = $1"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DeadLetterError::RepositoryError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DeadLetterError::NotFound);
        }
        Ok(())
    }
}
