use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::entities::{Transfer, TransferStatus};

/// Fila de la tabla `transfers`.
#[derive(Debug, FromRow)]
pub struct TransferModel {
    pub id: Uuid,
    pub sender_wallet_id: Uuid,
    pub receiver_wallet_id: Uuid,
    pub amount: i64,
    pub status: TransferStatus,
    pub failure_reason: Option<String>,
    pub timeout_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Transfer> for TransferModel {
    fn from(t: Transfer) -> Self {
        Self {
            id: t.id,
            sender_wallet_id: t.sender_wallet_id,
            receiver_wallet_id: t.receiver_wallet_id,
            amount: t.amount,
            status: t.status,
            failure_reason: t.failure_reason,
            timeout_at: t.timeout_at,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

impl From<TransferModel> for Transfer {
    fn from(m: TransferModel) -> Self {
        Transfer::reconstitute(
            m.id,
            m.sender_wallet_id,
            m.receiver_wallet_id,
            m.amount,
            m.status,
            m.failure_reason,
            m.timeout_at,
            m.created_at,
            m.updated_at,
        )
    }
}

/// Fila de la tabla `outbox`. Misma forma que la del wallet service,
/// pero cada servicio posee y consulta únicamente la suya.
#[derive(Debug, FromRow)]
pub struct OutboxRowModel {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}
