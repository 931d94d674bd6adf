use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::entities::{DeadLetter, DeadLetterStatus, LedgerEntry, LedgerEntryType, Wallet};
use crate::domain::types::{DeadLetterId, LedgerEntryId, UserId, WalletId};

/// Fila de la tabla `wallets`.
#[derive(Debug, FromRow)]
pub struct WalletModel {
    pub id: WalletId,
    pub user_id: UserId,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for WalletModel {
    fn from(w: Wallet) -> Self {
        Self {
            id: w.id,
            user_id: w.user_id,
            balance: w.balance,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

impl From<WalletModel> for Wallet {
    fn from(m: WalletModel) -> Self {
        Wallet::reconstitute(m.id, m.user_id, m.balance, m.created_at, m.updated_at)
    }
}

/// Fila de la tabla `wallet_ledger_entries`. Append-only: no hay
/// conversión de vuelta a modelo de escritura porque nunca se
/// actualiza ni se reconstruye fuera de lectura (spec §3).
#[derive(Debug, FromRow)]
pub struct LedgerEntryModel {
    pub id: LedgerEntryId,
    pub wallet_id: WalletId,
    pub transaction_id: Uuid,
    pub entry_type: LedgerEntryType,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntryModel> for LedgerEntry {
    fn from(m: LedgerEntryModel) -> Self {
        Self {
            id: m.id,
            wallet_id: m.wallet_id,
            transaction_id: m.transaction_id,
            entry_type: m.entry_type,
            amount: m.amount,
            created_at: m.created_at,
        }
    }
}

impl From<&LedgerEntry> for LedgerEntryModel {
    fn from(e: &LedgerEntry) -> Self {
        Self {
            id: e.id,
            wallet_id: e.wallet_id,
            transaction_id: e.transaction_id,
            entry_type: e.entry_type,
            amount: e.amount,
            created_at: e.created_at,
        }
    }
}

/// Fila de la tabla `dead_letter_queue`.
#[derive(Debug, FromRow)]
pub struct DeadLetterModel {
    pub id: DeadLetterId,
    pub original_topic: String,
    pub original_payload: serde_json::Value,
    pub error_message: String,
    pub error_stack: String,
    pub attempt_count: i32,
    pub status: DeadLetterStatus,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<DeadLetter> for DeadLetterModel {
    fn from(d: DeadLetter) -> Self {
        Self {
            id: d.id,
            original_topic: d.original_topic,
            original_payload: d.original_payload,
            error_message: d.error_message,
            error_stack: d.error_stack,
            attempt_count: d.attempt_count,
            status: d.status,
            created_at: d.created_at,
            processed_at: d.processed_at,
        }
    }
}

impl From<DeadLetterModel> for DeadLetter {
    fn from(m: DeadLetterModel) -> Self {
        Self {
            id: m.id,
            original_topic: m.original_topic,
            original_payload: m.original_payload,
            error_message: m.error_message,
            error_stack: m.error_stack,
            attempt_count: m.attempt_count,
            status: m.status,
            created_at: m.created_at,
            processed_at: m.processed_at,
        }
    }
}

/// Fila de la tabla `outbox`. Compartida a nivel de forma con
/// `transaction_service`, pero cada servicio lee solo la suya.
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
