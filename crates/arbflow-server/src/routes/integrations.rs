use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use arbflow_core::credential::{StoredCredential, GOOGLE_ANALYTICS};
use arbflow_metadata::UpsertIntegrationParams;

use crate::{auth::middleware::AuthContext, error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SaveIntegrationRequest {
    pub provider: String,
    pub property_id: String,
    pub service_account_json: String,
}

/// `POST /api/v1/integrations`: Store a service-account credential for one
/// property.
///
/// Saving again for the same (provider, property) replaces the credential and
/// keeps the integration id.
pub async fn save_integration(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<SaveIntegrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let provider = req.provider.trim();
    if provider != GOOGLE_ANALYTICS {
        return Err(AppError::BadRequest(format!(
            "unsupported provider '{provider}'"
        )));
    }
    let property_id = normalize_property_id(&req.property_id)?;

    let credential = StoredCredential::parse(&req.service_account_json)
        .map_err(|e| AppError::BadRequest(format!("service_account_json: {e}")))?;
    if !matches!(credential, StoredCredential::ServiceAccount(_)) {
        return Err(AppError::BadRequest(
            "service_account_json: expected a service account key file".to_string(),
        ));
    }
    let encrypted_credentials = credential
        .seal(&state.cipher)
        .map_err(|e| AppError::Internal(e.into()))?;

    let integration = state
        .store
        .upsert_integration(UpsertIntegrationParams {
            tenant_id: ctx.tenant_id.clone(),
            provider: provider.to_string(),
            property_id: Some(property_id),
            encrypted_credentials,
        })
        .await
        .map_err(AppError::Internal)?;

    tracing::info!(
        tenant_id = %ctx.tenant_id,
        integration_id = %integration.id,
        provider = %integration.provider,
        "Integration credentials stored"
    );

    Ok(Json(json!({
        "data": {
            "id": integration.id,
            "provider": integration.provider,
            "property_id": integration.property_id,
        }
    })))
}

/// `GET /api/v1/integrations`: The tenant's integrations, without secrets.
pub async fn list_integrations(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    let integrations = state
        .store
        .list_integrations(&ctx.tenant_id, None)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(json!({ "data": integrations })))
}

/// `DELETE /api/v1/integrations/{id}`
pub async fn delete_integration(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(integration_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state
        .store
        .delete_integration(&ctx.tenant_id, &integration_id)
        .await
        .map_err(AppError::Internal)?;

    if !deleted {
        return Err(AppError::NotFound("Integration not found".to_string()));
    }
    tracing::info!(tenant_id = %ctx.tenant_id, integration_id = %integration_id, "Integration deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Accept `123456789` or the `properties/123456789` resource name.
pub(crate) fn normalize_property_id(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let id = trimmed.strip_prefix("properties/").unwrap_or(trimmed);
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest(
            "property_id must be a numeric GA4 property id".to_string(),
        ));
    }
    Ok(id.to_string())
}
