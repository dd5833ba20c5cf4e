//! Error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;
use walletd_core::LedgerError;
use walletd_shared::AppError;

/// An application error rendered as `{"error": ..., "message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() && !self.0.is_retryable() {
            error!(error = %self.0, "Request failed");
        }

        let body = json!({
            "error": self.0.error_code().to_lowercase(),
            "message": self.0.client_message(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walletd_shared::types::WalletId;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = ApiError::from(LedgerError::WalletNotFound(WalletId::new())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_lock_timeout_maps_to_503() {
        let response = ApiError::from(LedgerError::LockTimeout(WalletId::new())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_database_error_maps_to_500() {
        let response = ApiError(AppError::Database("relation missing".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
