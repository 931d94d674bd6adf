use std::sync::Arc;

use crate::domain::{
    entities::Wallet,
    error::WalletError,
    repository::WalletRepository,
    types::UserId,
};

/// Crea una billetera nueva para un usuario. No hay entidad `User` en
/// este servicio — `user_id` llega ya resuelto desde fuera y solo se
/// exige que sea único por billetera (spec §3, §4.1).
pub struct CreateWalletUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
}

impl CreateWalletUseCase {
    pub fn new(wallet_repo: Arc<dyn WalletRepository>) -> Self {
        Self { wallet_repo }
    }

    #[tracing::instrument(name = "CreateWalletUseCase::execute", skip(self))]
    pub async fn execute(&self, user_id: UserId) -> Result<Wallet, WalletError> {
        if self.wallet_repo.find_by_user_id(user_id).await?.is_some() {
            return Err(WalletError::DuplicateUser(user_id));
        }

        self.wallet_repo.create(Wallet::new(user_id)).await
    }
}
