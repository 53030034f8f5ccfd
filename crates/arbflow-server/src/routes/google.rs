use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use arbflow_core::credential::{StoredCredential, GOOGLE_ANALYTICS};
use arbflow_metadata::UpsertIntegrationParams;

use crate::{
    auth::{
        jwt::{decode_oauth_state, encode_oauth_state},
        middleware::{authenticate, AuthContext},
    },
    error::AppError,
    providers::{OAuthClient, ProviderError},
    state::AppState,
};

fn oauth_client(state: &AppState) -> Result<&Arc<dyn OAuthClient>, AppError> {
    state
        .oauth
        .as_ref()
        .ok_or(AppError::NotConfigured("Google OAuth"))
}

fn authorize_url(state: &AppState, tenant_id: &str) -> Result<String, AppError> {
    let client = oauth_client(state)?;
    let oauth_state = encode_oauth_state(&state.config.jwt_secret, tenant_id)
        .map_err(|e| AppError::Internal(e.into()))?;
    client
        .authorize_url(&oauth_state)
        .map_err(|e| AppError::Internal(e.into()))
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// `GET /api/v1/integrations/google/link`: Authorization URL for a frontend
/// that navigates itself.
pub async fn link(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    let url = authorize_url(&state, &ctx.tenant_id)?;
    Ok(Json(json!({ "data": { "url": url } })))
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub token: Option<String>,
}

/// `GET /api/v1/integrations/google/login?token=`: Redirect straight to
/// Google. A browser navigation cannot carry an `Authorization` header, so
/// the session token rides in the query string.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    let token = query
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or(AppError::Unauthorized)?;
    let ctx = authenticate(&state, token.trim()).await?;
    let url = authorize_url(&state, &ctx.tenant_id)?;
    Ok(found(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// `GET /api/v1/integrations/google/callback`: Google redirects here after
/// consent. The `state` token identifies the tenant; the code is exchanged
/// and the tokens stored encrypted.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    if let Some(error) = query.error {
        tracing::info!(error = %error, "Google consent was not granted");
        return Err(AppError::OAuth(query.error_description.unwrap_or(error)));
    }

    let client = oauth_client(&state)?;

    let tenant_id = query
        .state
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("state is required".to_string()))
        .and_then(|s| {
            decode_oauth_state(s, &state.config.jwt_secret)
                .map_err(|_| AppError::BadRequest("state is invalid or expired".to_string()))
        })?;
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("code is required".to_string()))?;

    state
        .store
        .get_tenant(&tenant_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::Unauthorized)?;

    let tokens = client.exchange_code(&code).await.map_err(|e| match e {
        ProviderError::OAuth { description, .. } => AppError::OAuth(description),
        other => AppError::Upstream(other.to_string()),
    })?;

    let encrypted_credentials = StoredCredential::OAuth(tokens)
        .seal(&state.cipher)
        .map_err(|e| AppError::Internal(e.into()))?;

    let integration = state
        .store
        .upsert_integration(UpsertIntegrationParams {
            tenant_id: tenant_id.clone(),
            provider: GOOGLE_ANALYTICS.to_string(),
            property_id: None,
            encrypted_credentials,
        })
        .await
        .map_err(AppError::Internal)?;

    tracing::info!(
        tenant_id = %tenant_id,
        integration_id = %integration.id,
        "Google Analytics linked via OAuth"
    );

    let target = format!(
        "{}/integrations?connected={GOOGLE_ANALYTICS}",
        state.config.frontend_url.trim_end_matches('/')
    );
    Ok(found(&target))
}
