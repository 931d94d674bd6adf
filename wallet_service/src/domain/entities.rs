use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::WalletError;
use crate::domain::types::{DeadLetterId, LedgerEntryId, UserId, WalletId};

/// Modelo de Entidad: Wallet.
///
/// Identidad `id` (única), `user_id` (único — una wallet por usuario).
/// `balance` son unidades enteras (minor units); la invariante
/// `balance >= 0` se refuerza tanto en BD (check constraint) como en
/// el motor de ledger antes de escribir (spec §3, §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: UserId,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Crea una wallet nueva en saldo cero. La unicidad de `user_id` la
    /// hace cumplir el repositorio vía constraint de BD.
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: WalletId::new(),
            user_id,
            balance: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn reconstitute(
        id: WalletId,
        user_id: UserId,
        balance: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            balance,
            created_at,
            updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ledger_entry_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryType {
    Debit,
    Credit,
    Refund,
}

/// Modelo de Entidad: LedgerEntry. Append-only; nunca se muta ni se
/// elimina. La unicidad de `(wallet_id, transaction_id)` es la clave
/// de idempotencia de todo el sistema del lado Ledger (spec §3, §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub wallet_id: WalletId,
    pub transaction_id: uuid::Uuid,
    pub entry_type: LedgerEntryType,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        wallet_id: WalletId,
        transaction_id: uuid::Uuid,
        entry_type: LedgerEntryType,
        amount: i64,
    ) -> Result<Self, WalletError> {
        if amount <= 0 {
            return Err(WalletError::InvalidData(
                "el monto de una entrada de ledger debe ser positivo".into(),
            ));
        }
        Ok(Self {
            id: LedgerEntryId::new(),
            wallet_id,
            transaction_id,
            entry_type,
            amount,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dead_letter_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeadLetterStatus {
    Pending,
    Processed,
    Failed,
}

/// Modelo de Entidad: DeadLetter. Cuarentena para mensajes cuyo
/// reintento en proceso (solo el camino de refund, spec §4.6) se agotó
/// o cuyo error fue de negocio y no admite reintento.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
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
