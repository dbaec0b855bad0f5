//! HTTP層のエラー
//!
//! `XlsxFinError`をステータスコードと`{"error": message}`形式のボディに対応付けます。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::XlsxFinError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Processing timed out after {0}s")]
    Timeout(u64),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<XlsxFinError> for ApiError {
    fn from(err: XlsxFinError) -> Self {
        match err {
            XlsxFinError::InvalidInput(_) | XlsxFinError::SecurityViolation(_) => {
                ApiError::BadRequest(err.to_string())
            }
            XlsxFinError::NotFound(_) => ApiError::NotFound(err.to_string()),
            XlsxFinError::Timeout(secs) => ApiError::Timeout(secs),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(msg) => tracing::error!("Request failed: {}", msg),
            ApiError::Timeout(secs) => tracing::error!("Processing timed out after {}s", secs),
            other => tracing::warn!("Rejected request: {}", other),
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
