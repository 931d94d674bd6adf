use crate::domain::{
    entities::Wallet, error::WalletError, repository::WalletRepository, types::WalletId,
};
use std::sync::Arc;

/// Caso de uso para obtener los detalles de una billetera en particular.
///
/// Encapsula la lógica necesaria para consultar una única billetera y
/// devolver un error `WalletError::NotFound` estándar si la base de datos
/// no arroja resultados.
#[derive(Clone)]
pub struct GetWalletUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
}

impl GetWalletUseCase {
    pub fn new(wallet_repo: Arc<dyn WalletRepository>) -> Self {
        Self { wallet_repo }
    }

    #[tracing::instrument(name = "GetWalletUseCase::execute", skip(self))]
    pub async fn execute(&self, wallet_id: WalletId) -> Result<Wallet, WalletError> {
        self.wallet_repo
            .find_by_id(wallet_id)
            .await?
            .ok_or(WalletError::NotFound(wallet_id))
    }
}
