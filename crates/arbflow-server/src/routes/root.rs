use axum::{response::IntoResponse, Json};
use serde_json::json;

/// `GET /`: identifies the API to anyone hitting the bare host.
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to the ArbFlow Marketing API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
