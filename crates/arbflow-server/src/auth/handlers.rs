use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;

use arbflow_metadata::{CreateTenantParams, EMAIL_TAKEN};

use crate::{error::AppError, state::AppState};

use super::jwt::encode_jwt;
use super::middleware::AuthContext;
use super::password::{hash_password, validate_password_strength, verify_password};

// ---------------------------------------------------------------------------
// POST /api/v1/auth/register
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub company_name: String,
    pub email: String,
    pub password: String,
}

/// `POST /api/v1/auth/register`: Create a tenant account.
///
/// Returns 201 with the public tenant fields; the password hash never leaves
/// the server.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let company_name = req.company_name.trim().to_string();
    if company_name.is_empty() {
        return Err(AppError::BadRequest("company_name is required".to_string()));
    }
    let email = normalize_email(&req.email)?;
    validate_password_strength(&req.password).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let existing = state
        .store
        .find_tenant_by_email(&email)
        .await
        .map_err(AppError::Internal)?;
    if existing.is_some() {
        return Err(AppError::EmailTaken);
    }

    let password_hash =
        hash_password(&req.password, state.config.argon2_memory_kb).map_err(AppError::Internal)?;
    let tenant = state
        .store
        .create_tenant(CreateTenantParams {
            company_name,
            email,
            password_hash,
        })
        .await
        .map_err(|e| {
            // A concurrent registration can win between the lookup and the insert.
            if e.to_string() == EMAIL_TAKEN {
                AppError::EmailTaken
            } else {
                AppError::Internal(e)
            }
        })?;

    tracing::info!(tenant_id = %tenant.id, "Tenant registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": {
                "id": tenant.id,
                "email": tenant.email,
                "company_name": tenant.company_name,
            }
        })),
    ))
}

// ---------------------------------------------------------------------------
// POST /api/v1/auth/login
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/v1/auth/login`: Exchange email + password for a bearer token.
///
/// Unknown email and wrong password answer identically.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = req.email.trim().to_lowercase();
    let tenant = state
        .store
        .find_tenant_by_email(&email)
        .await
        .map_err(AppError::Internal)?;

    let Some(tenant) = tenant.filter(|t| verify_password(&req.password, &t.password_hash)) else {
        tracing::info!("Login rejected");
        return Err(AppError::InvalidCredentials);
    };

    let (token, expires_at) = encode_jwt(
        &state.config.jwt_secret,
        &tenant.id,
        state.config.session_hours,
    )
    .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(tenant_id = %tenant.id, "Login succeeded");

    Ok(Json(json!({
        "data": {
            "access_token": token,
            "token_type": "bearer",
            "expires_at": expires_at,
            "user_id": tenant.id,
            "company_name": tenant.company_name,
        }
    })))
}

// ---------------------------------------------------------------------------
// GET /api/v1/auth/me
// ---------------------------------------------------------------------------

/// `GET /api/v1/auth/me`: The authenticated tenant.
pub async fn me(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    Json(json!({
        "data": {
            "id": ctx.tenant_id,
            "email": ctx.email,
            "company_name": ctx.company_name,
        }
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::BadRequest("email is invalid".to_string()));
    }
    Ok(email)
}
