use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entities::Wallet;
use crate::domain::error::WalletError;
use crate::domain::repository::WalletRepository;
use crate::domain::types::{UserId, WalletId};
use crate::infrastructure::persistence::models::WalletModel;

/// Repositorio de Billeteras basado en PostgreSQL.
///
/// No expone mutación de saldo: eso vive detrás de
/// [`crate::infrastructure::persistence::ledger_engine::PostgresLedgerEngine`],
/// que es el único camino autorizado a tocar `balance` (spec §4.2).
pub struct PostgresWalletRepository {
    pool: PgPool,
}

impl PostgresWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for PostgresWalletRepository {
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, WalletError> {
        let model_opt = sqlx::query_as::<_, WalletModel>(
            r#"SELECT id, user_id, balance, created_at, updated_at FROM wallets WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WalletError::RepositoryError(e.to_string()))?;

        Ok(model_opt.map(Into::into))
    }

    async fn find_by_user_id(&self, user_id: UserId) -> Result<Option<Wallet>, WalletError> {
        let model_opt = sqlx::query_as::<_, WalletModel>(
            r#"SELECT id, user_id, balance, created_at, updated_at FROM wallets WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WalletError::RepositoryError(e.to_string()))?;

        Ok(model_opt.map(Into::into))
    }

    /// Crea una billetera a saldo cero. La unicidad de `user_id` la hace
    /// cumplir la constraint de BD; una violación se traduce en
    /// `DuplicateUser` en vez de propagarse como un error genérico (spec §7).
    async fn create(&self, wallet: Wallet) -> Result<Wallet, WalletError> {
        let model = WalletModel::from(wallet);

        let saved = sqlx::query_as::<_, WalletModel>(
            r#"
            INSERT INTO wallets (id, user_id, balance, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, balance, created_at, updated_at
            "#,
        )
        .bind(model.id)
        .bind(model.user_id)
        .bind(model.balance)
        .bind(model.created_at)
        .bind(model.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23505") {
                    return WalletError::DuplicateUser(model.user_id);
                }
            }
            WalletError::RepositoryError(e.to_string())
        })?;

        Ok(saved.into())
    }
}
