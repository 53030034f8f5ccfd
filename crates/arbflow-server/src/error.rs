use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant implements [`IntoResponse`] so Axum handlers can use
/// `Result<impl IntoResponse, AppError>` as their return type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("email already registered")]
    EmailTaken,

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token expired")]
    TokenExpired,

    /// The OAuth provider answered with an `error` field.
    #[error("oauth error: {0}")]
    OAuth(String),

    /// The OAuth provider could not be reached or answered garbage.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("not configured: {0}")]
    NotConfigured(&'static str),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            AppError::EmailTaken => (
                StatusCode::BAD_REQUEST,
                "email_taken",
                "Email already registered".to_string(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Could not validate credentials".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Incorrect email or password".to_string(),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "token_expired",
                "Token has expired. Please log in again.".to_string(),
            ),
            AppError::OAuth(msg) => (StatusCode::BAD_REQUEST, "oauth_error", msg.clone()),
            AppError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream provider failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    "The analytics provider could not be reached".to_string(),
                )
            }
            AppError::NotConfigured(what) => (
                StatusCode::NOT_IMPLEMENTED,
                "not_configured",
                format!("{what} is not configured on this server"),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let mut response = (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                    "field": null
                }
            })),
        )
            .into_response();

        if matches!(self, AppError::Unauthorized | AppError::TokenExpired) {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}
