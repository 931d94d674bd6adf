use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::error::TransferError;

/// Error unificado de la capa HTTP. Traduce los errores de dominio a
/// códigos de estado; ningún handler construye un `StatusCode` a mano.
pub struct ApiError(pub TransferError);

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.0 {
            TransferError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            TransferError::Validation(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            TransferError::RepositoryError(ref e) => {
                tracing::error!("Repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": error_message,
        }));

        (status, body).into_response()
    }
}
