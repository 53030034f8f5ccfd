use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Purpose tag carried by OAuth `state` tokens. Session tokens carry none, so
/// a leaked `state` value can never be replayed as a bearer token.
pub const OAUTH_STATE_PURPOSE: &str = "ga_link";

/// Lifetime of an OAuth `state` token.
pub const OAUTH_STATE_MINUTES: i64 = 10;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Tenant id.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("encode failed: {0}")]
    Encode(String),
}

fn encode_claims(secret: &str, claims: &Claims) -> Result<String, JwtError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::Encode(e.to_string()))
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Invalid,
    })
}

/// Encode a session token for `tenant_id`.
///
/// Returns (token_string, expires_at_rfc3339).
pub fn encode_jwt(
    secret: &str,
    tenant_id: &str,
    session_hours: u32,
) -> Result<(String, String), JwtError> {
    let now = Utc::now();
    let exp = now + Duration::hours(i64::from(session_hours));
    let claims = Claims {
        sub: tenant_id.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
        purpose: None,
    };
    Ok((encode_claims(secret, &claims)?, exp.to_rfc3339()))
}

/// Decode and validate a session token.
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = decode_claims(token, secret)?;
    if claims.purpose.is_some() {
        return Err(JwtError::Invalid);
    }
    Ok(claims)
}

/// Encode the OAuth `state` parameter binding a callback to `tenant_id`.
pub fn encode_oauth_state(secret: &str, tenant_id: &str) -> Result<String, JwtError> {
    let now = Utc::now();
    let claims = Claims {
        sub: tenant_id.to_string(),
        exp: (now + Duration::minutes(OAUTH_STATE_MINUTES)).timestamp(),
        iat: now.timestamp(),
        purpose: Some(OAUTH_STATE_PURPOSE.to_string()),
    };
    encode_claims(secret, &claims)
}

/// Decode an OAuth `state` parameter and return the tenant id it carries.
pub fn decode_oauth_state(state: &str, secret: &str) -> Result<String, JwtError> {
    let claims = decode_claims(state, secret)?;
    if claims.purpose.as_deref() != Some(OAUTH_STATE_PURPOSE) {
        return Err(JwtError::Invalid);
    }
    Ok(claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn session_token_round_trips() {
        let (token, expires_at) = encode_jwt(SECRET, "tenant-1", 24).expect("encode");
        assert!(!expires_at.is_empty());
        let claims = decode_jwt(&token, SECRET).expect("decode");
        assert_eq!(claims.sub, "tenant-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let (token, _) = encode_jwt(SECRET, "tenant-1", 24).expect("encode");
        assert_eq!(decode_jwt(&token, "other").map(|c| c.sub), Err(JwtError::Invalid));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let now = Utc::now();
        let claims = Claims {
            sub: "tenant-1".to_string(),
            exp: (now - Duration::hours(1)).timestamp(),
            iat: (now - Duration::hours(25)).timestamp(),
            purpose: None,
        };
        let token = encode_claims(SECRET, &claims).expect("encode");
        assert_eq!(decode_jwt(&token, SECRET).map(|c| c.sub), Err(JwtError::Expired));
    }

    #[test]
    fn state_and_session_tokens_are_not_interchangeable() {
        let state = encode_oauth_state(SECRET, "tenant-1").expect("encode");
        assert_eq!(decode_oauth_state(&state, SECRET), Ok("tenant-1".to_string()));
        assert_eq!(decode_jwt(&state, SECRET).map(|c| c.sub), Err(JwtError::Invalid));

        let (session, _) = encode_jwt(SECRET, "tenant-1", 24).expect("encode");
        assert_eq!(decode_oauth_state(&session, SECRET), Err(JwtError::Invalid));
    }
}
