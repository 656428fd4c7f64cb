//! Application error type mapping to HTTP status codes and the error envelope.
//!
//! Every failure body has the shape
//! `{"error": {"provider": ..., "status": ..., "message": ...}}`, and the
//! HTTP status always equals `error.status`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use polychat_types::error::ProxyError;
use polychat_types::proxy::ProviderFailure;

#[derive(Debug)]
pub enum AppError {
    /// A provider call failed or was rejected.
    Provider(ProxyError),
    /// The path named a provider that does not exist.
    UnknownProvider(String),
    /// A body that could not be tied to any provider.
    BadRequest(String),
}

impl From<ProxyError> for AppError {
    fn from(e: ProxyError) -> Self {
        AppError::Provider(e)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Provider(e) => {
                StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AppError::UnknownProvider(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The `error` object of the envelope.
    pub fn body(&self) -> serde_json::Value {
        match self {
            AppError::Provider(e) => {
                let failure = ProviderFailure {
                    status: self.status().as_u16(),
                    ..e.to_failure()
                };
                serde_json::to_value(failure).unwrap_or_default()
            }
            AppError::UnknownProvider(name) => json!({
                "provider": name,
                "status": StatusCode::NOT_FOUND.as_u16(),
                "message": format!("Unknown provider '{name}'"),
            }),
            AppError::BadRequest(message) => json!({
                "provider": null,
                "status": StatusCode::BAD_REQUEST.as_u16(),
                "message": message,
            }),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self, "request failed");
        }
        (status, Json(json!({ "error": self.body() }))).into_response()
    }
}
