use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::error::{DeadLetterError, WalletError};

/// Error unificado de la capa HTTP. Traduce los errores de dominio a
/// códigos de estado; ningún handler construye un `StatusCode` a mano.
pub enum ApiError {
    Wallet(WalletError),
    DeadLetter(DeadLetterError),
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        ApiError::Wallet(err)
    }
}

impl From<DeadLetterError> for ApiError {
    fn from(err: DeadLetterError) -> Self {
        ApiError::DeadLetter(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Wallet(e) => match e {
                WalletError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
                WalletError::DuplicateUser(_) => (StatusCode::CONFLICT, e.to_string()),
                WalletError::InvalidData(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                WalletError::InsufficientBalance { .. } => (StatusCode::BAD_REQUEST, e.to_string()),
                WalletError::Transient(_) | WalletError::RepositoryError(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                ),
            },
            ApiError::DeadLetter(e) => match e {
                DeadLetterError::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
                DeadLetterError::RepositoryError(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                ),
            },
        };

        let body = Json(json!({
            "status": "error",
            "message": error_message,
        }));

        (status, body).into_response()
    }
}
