use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use common::outbox::OutboxDraft;

use crate::domain::entities::{Transfer, TransferStatus};
use crate::domain::error::TransferError;
use crate::domain::repository::TransferRepository;
use crate::infrastructure::persistence::models::TransferModel;

/// PostgreSQL-backed saga store (spec §4.1). `try_transition` is the
/// one place the conditional `WHERE status = expected` update lives;
/// every handler and the timeout scanner go through it so the
/// single-row-affected check is never duplicated or gotten wrong.
pub struct PostgresTransferRepository {
    pool: PgPool,
}

impl PostgresTransferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_outbox(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        draft: &OutboxDraft,
    ) -> Result<(), TransferError> {
        sqlx::query(
            r#"
            INSERT INTO outbox (id, aggregate_type, aggregate_id, event_type, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            "#,
        )
        .bind(common::ids::new_id())
        .bind(draft.aggregate_type)
        .bind(draft.aggregate_id)
        .bind(draft.event_type.as_str())
        .bind(draft.payload.clone())
        .execute(&mut **tx)
        .await
        .map_err(|e| TransferError::RepositoryError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl TransferRepository for PostgresTransferRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Transfer>, TransferError> {
        let model_opt = sqlx::query_as::<_, TransferModel>(
            r#"
            SELECT id, sender_wallet_id, receiver_wallet_id, amount, status,
                   failure_reason, timeout_at, created_at, updated_at
            FROM transfers WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TransferError::RepositoryError(e.to_string()))?;

        Ok(model_opt.map(Into::into))
    }

    async fn create_with_outbox(
        &self,
        transfer: Transfer,
        outbox: OutboxDraft,
    ) -> Result<Transfer, TransferError> {
        let model = TransferModel::from(transfer);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TransferError::RepositoryError(e.to_string()))?;

        let saved = sqlx::query_as::<_, TransferModel>(
            r#"
            INSERT INTO transfers (
                id, sender_wallet_id, receiver_wallet_id, amount, status,
                failure_reason, timeout_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, sender_wallet_id, receiver_wallet_id, amount, status,
                      failure_reason, timeout_at, created_at, updated_at
            "#,
        )
        .bind(model.id)
        .bind(model.sender_wallet_id)
        .bind(model.receiver_wallet_id)
        .bind(model.amount)
        .bind(model.status)
        .bind(model.failure_reason)
        .bind(model.timeout_at)
        .bind(model.created_at)
        .bind(model.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| TransferError::RepositoryError(e.to_string()))?;

        Self::insert_outbox(&mut tx, &outbox).await?;

        tx.commit()
            .await
            .map_err(|e| TransferError::RepositoryError(e.to_string()))?;

        Ok(saved.into())
    }

    async fn try_transition(
        &self,
        transfer_id: Uuid,
        expected: TransferStatus,
        new: TransferStatus,
        failure_reason: Option<String>,
        outbox: Vec<OutboxDraft>,
    ) -> Result<bool, TransferError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TransferError::RepositoryError(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE transfers
            SET status = $1, failure_reason = COALESCE($2, failure_reason), updated_at = now()
            WHERE id = $3 AND status = $4
            "#,
        )
        .bind(new)
        .bind(failure_reason)
        .bind(transfer_id)
        .bind(expected)
        .execute(&mut *tx)
        .await
        .map_err(|e| TransferError::RepositoryError(e.to_string()))?;

        if result.rows_affected() != 1 {
            tx.rollback()
                .await
                .map_err(|e| TransferError::RepositoryError(e.to_string()))?;
            return Ok(false);
        }

        for draft in &outbox {
            Self::insert_outbox(&mut tx, draft).await?;
        }

        tx.commit()
            .await
            .map_err(|e| TransferError::RepositoryError(e.to_string()))?;

        Ok(true)
    }

    async fn find_expired(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Transfer>, TransferError> {
        let models = sqlx::query_as::<_, TransferModel>(
            r#"
            SELECT id, sender_wallet_id, receiver_wallet_id, amount, status,
                   failure_reason, timeout_at, created_at, updated_at
            FROM transfers
            WHERE timeout_at < $1 AND status IN ('PENDING', 'DEBITED')
            ORDER BY timeout_at ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| TransferError::RepositoryError(e.to_string()))?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}
