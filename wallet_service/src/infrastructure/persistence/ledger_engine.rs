use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use common::outbox::OutboxDraft;

use crate::domain::entities::{LedgerEntry, LedgerEntryType, Wallet};
use crate::domain::error::WalletError;
use crate::domain::ledger::{LedgerApplyOutcome, LedgerEngine};
use crate::domain::types::WalletId;
use crate::infrastructure::persistence::models::{LedgerEntryModel, WalletModel};

/// PostgreSQL implementation of the idempotent ledger engine (spec §4.2).
///
/// Every step of `apply` runs inside a single `sqlx::Transaction` so the
/// idempotency check, balance mutation, ledger insert, and outbox insert
/// either all land together or none do.
pub struct PostgresLedgerEngine {
    pool: PgPool,
}

impl PostgresLedgerEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerEngine for PostgresLedgerEngine {
    async fn apply(
        &self,
        wallet_id: WalletId,
        transaction_id: Uuid,
        entry_type: LedgerEntryType,
        amount: i64,
        outbox: Option<OutboxDraft>,
    ) -> Result<LedgerApplyOutcome, WalletError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| WalletError::Transient(e.to_string()))?;

        // Step 1: idempotency short-circuit on (wallet_id, transaction_id).
        let existing = sqlx::query_as::<_, LedgerEntryModel>(
            r#"
            SELECT id, wallet_id, transaction_id, entry_type, amount, created_at
            FROM wallet_ledger_entries
            WHERE wallet_id = $1 AND transaction_id = $2
            "#,
        )
        .bind(wallet_id)
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| WalletError::Transient(e.to_string()))?;

        if let Some(entry_model) = existing {
            let wallet_model = sqlx::query_as::<_, WalletModel>(
                r#"SELECT id, user_id, balance, created_at, updated_at FROM wallets WHERE id = $1"#,
            )
            .bind(wallet_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| WalletError::Transient(e.to_string()))?;

            tx.commit()
                .await
                .map_err(|e| WalletError::Transient(e.to_string()))?;

            return Ok(LedgerApplyOutcome {
                wallet: wallet_model.into(),
                entry: entry_model.into(),
                already_applied: true,
            });
        }

        // Step 2/3: conditional balance update under the row lock it acquires.
        let updated_wallet = match entry_type {
            LedgerEntryType::Debit => sqlx::query_as::<_, WalletModel>(
                r#"
                UPDATE wallets SET balance = balance - $1, updated_at = now()
                WHERE id = $2 AND balance >= $1
                RETURNING id, user_id, balance, created_at, updated_at
                "#,
            )
            .bind(amount)
            .bind(wallet_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| WalletError::Transient(e.to_string()))?,
            LedgerEntryType::Credit | LedgerEntryType::Refund => sqlx::query_as::<_, WalletModel>(
                r#"
                UPDATE wallets SET balance = balance + $1, updated_at = now()
                WHERE id = $2
                RETURNING id, user_id, balance, created_at, updated_at
                "#,
            )
            .bind(amount)
            .bind(wallet_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| WalletError::Transient(e.to_string()))?,
        };

        let updated_wallet = match updated_wallet {
            Some(w) => w,
            None => {
                // Rows-affected 0: distinguish missing wallet from a
                // rejected debit predicate (spec §4.2 step 3).
                let current = sqlx::query_as::<_, WalletModel>(
                    r#"SELECT id, user_id, balance, created_at, updated_at FROM wallets WHERE id = $1"#,
                )
                .bind(wallet_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| WalletError::Transient(e.to_string()))?;

                tx.rollback()
                    .await
                    .map_err(|e| WalletError::Transient(e.to_string()))?;

                return match current {
                    None => Err(WalletError::NotFound(wallet_id)),
                    Some(w) => Err(WalletError::InsufficientBalance {
                        current: w.balance,
                        required: amount,
                    }),
                };
            }
        };

        // Step 4: append the ledger entry.
        let entry = LedgerEntry::new(wallet_id, transaction_id, entry_type, amount)?;
        let entry_model = LedgerEntryModel::from(&entry);
        sqlx::query(
            r#"
            INSERT INTO wallet_ledger_entries (id, wallet_id, transaction_id, entry_type, amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry_model.id)
        .bind(entry_model.wallet_id)
        .bind(entry_model.transaction_id)
        .bind(entry_model.entry_type)
        .bind(entry_model.amount)
        .bind(entry_model.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| WalletError::Transient(e.to_string()))?;

        // Step 5: outbox insert in the same transaction, if any.
        if let Some(draft) = outbox {
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
            .bind(draft.payload)
            .execute(&mut *tx)
            .await
            .map_err(|e| WalletError::Transient(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| WalletError::Transient(e.to_string()))?;

        Ok(LedgerApplyOutcome {
            wallet: updated_wallet.into(),
            entry,
            already_applied: false,
        })
    }
}
