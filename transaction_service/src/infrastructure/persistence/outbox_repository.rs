use async_trait::async_trait;
use sqlx::PgPool;

use common::events::OutboxEventType;
use common::outbox::{EventPublisher, OutboxError, OutboxRecord, OutboxStore};

use crate::infrastructure::persistence::models::OutboxRowModel;

/// PostgreSQL adapter onto the Coordinator's own `outbox` table, used
/// only by the polling publisher's skip-locked drain (spec §4.3).
/// Unlike the Ledger, nothing here writes a standalone outbox row
/// outside of [`crate::domain::repository::TransferRepository`] — every
/// Coordinator-side event is paired with a saga transition.
pub struct PostgresOutboxRepository {
    pool: PgPool,
}

impl PostgresOutboxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxStore for PostgresOutboxRepository {
    /// Holds one transaction for the whole select-emit-mark span so the
    /// `FOR UPDATE SKIP LOCKED` row lock stays in effect until commit —
    /// otherwise a second publisher replica could select the same rows
    /// between this call's SELECT and its UPDATE (spec §4.3, §9).
    async fn drain(&self, limit: i64, publisher: &dyn EventPublisher) -> Result<usize, OutboxError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| OutboxError::Store(e.to_string()))?;

        let models = sqlx::query_as::<_, OutboxRowModel>(
            r#"
            SELECT id, aggregate_type, aggregate_id, event_type, payload, created_at, published_at
            FROM outbox
            WHERE published_at IS NULL
            ORDER BY created_at ASC
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| OutboxError::Store(e.to_string()))?;

        let records = models
            .into_iter()
            .map(|m| {
                let event_type = OutboxEventType::from_str_name(&m.event_type).ok_or_else(|| {
                    OutboxError::Store(format!("unknown outbox event_type: {}", m.event_type))
                })?;
                Ok(OutboxRecord {
                    id: m.id,
                    aggregate_type: m.aggregate_type,
                    aggregate_id: m.aggregate_id,
                    event_type,
                    payload: m.payload,
                    created_at: m.created_at,
                    published_at: m.published_at,
                })
            })
            .collect::<Result<Vec<_>, OutboxError>>()?;

        if records.is_empty() {
            tx.commit().await.map_err(|e| OutboxError::Store(e.to_string()))?;
            return Ok(0);
        }

        let mut published_ids = Vec::with_capacity(records.len());
        for record in &records {
            if publisher
                .publish(record.event_type.topic(), record.aggregate_id, &record.payload)
                .await
                .is_ok()
            {
                published_ids.push(record.id);
            }
        }

        if !published_ids.is_empty() {
            sqlx::query(r#"UPDATE outbox SET published_at = now() WHERE id = ANY($1)"#)
                .bind(&published_ids)
                .execute(&mut *tx)
                .await
                .map_err(|e| OutboxError::Store(e.to_string()))?;
        }

        tx.commit().await.map_err(|e| OutboxError::Store(e.to_string()))?;
        Ok(published_ids.len())
    }
}
