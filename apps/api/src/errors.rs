use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::render;
use crate::review::LoadFault;
use crate::storage::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Session is still resolving")]
    SessionPending,

    #[error("Malformed record: {0}")]
    MalformedRecord(#[from] LoadFault),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Status, machine code and user-facing message. Server-side details are
    /// logged here and never sent to the client.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::SessionPending => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SESSION_PENDING",
                "Session is still being resolved, retry shortly".to_string(),
            ),
            AppError::MalformedRecord(e) => {
                tracing::error!("Malformed record: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MALFORMED_RECORD",
                    "The stored review for this resume is corrupt".to_string(),
                )
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Template(e) => {
                tracing::error!("Template error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// The same errors rendered as an HTML page, for routes a browser navigates to.
#[derive(Debug)]
pub struct HtmlError(pub AppError);

impl From<AppError> for HtmlError {
    fn from(err: AppError) -> Self {
        HtmlError(err)
    }
}

impl From<LoadFault> for HtmlError {
    fn from(err: LoadFault) -> Self {
        HtmlError(AppError::MalformedRecord(err))
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.0.parts();
        match render::render_fault(status, code, &message) {
            Ok(page) => (status, Html(page)).into_response(),
            Err(e) => {
                tracing::error!("Failed to render error page: {e}");
                (status, message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed() -> AppError {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        AppError::MalformedRecord(LoadFault::Malformed {
            id: "42".to_string(),
            source,
        })
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            malformed().into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_json_body_shape() {
        let response = malformed().into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["code"], "MALFORMED_RECORD");
    }

    #[tokio::test]
    async fn test_html_error_is_a_page() {
        let response = HtmlError(malformed()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("MALFORMED_RECORD"));
        assert!(html.contains("corrupt"));
    }
}
