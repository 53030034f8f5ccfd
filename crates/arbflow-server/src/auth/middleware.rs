use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::AppError, state::AppState};

use super::jwt::{decode_jwt, JwtError};

/// Auth context injected into request extensions after successful auth.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub tenant_id: String,
    pub company_name: String,
    pub email: String,
}

/// Require a valid `Authorization: Bearer <session token>` for the tenant.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return AppError::Unauthorized.into_response();
    };

    match authenticate(&state, &token).await {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Resolve a session token to the tenant it belongs to.
///
/// A valid token for a tenant that no longer exists is treated as
/// unauthenticated.
pub async fn authenticate(state: &AppState, token: &str) -> Result<AuthContext, AppError> {
    let claims = decode_jwt(token, &state.config.jwt_secret).map_err(|e| match e {
        JwtError::Expired => AppError::TokenExpired,
        _ => AppError::Unauthorized,
    })?;

    let tenant = state
        .store
        .get_tenant(&claims.sub)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::Unauthorized)?;

    Ok(AuthContext {
        tenant_id: tenant.id,
        company_name: tenant.company_name,
        email: tenant.email,
    })
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
