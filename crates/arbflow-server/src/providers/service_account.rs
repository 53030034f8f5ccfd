//! Service-account authentication: a signed RS256 assertion exchanged for a
//! short-lived access token via the JWT-bearer grant.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use arbflow_core::credential::ServiceAccountKey;

use super::google_oauth::ANALYTICS_READONLY_SCOPE;
use super::{error_message, ProviderError, GOOGLE_TOKEN_URL};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct AccessTokenBody {
    access_token: String,
}

/// Build the signed assertion for `key`. The audience is always Google's
/// token endpoint; the key file's own `token_uri` is never used as a target.
///
/// A private key that is not valid RSA PEM is reported as
/// [`ProviderError::Unauthorized`]: the stored credential itself is unusable.
pub fn sign_assertion(key: &ServiceAccountKey, now: i64) -> Result<String, ProviderError> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: ANALYTICS_READONLY_SCOPE,
        aud: GOOGLE_TOKEN_URL,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| ProviderError::Unauthorized(format!("invalid private key: {e}")))?;
    encode(&header, &claims, &signing_key)
        .map_err(|e| ProviderError::Unauthorized(format!("could not sign assertion: {e}")))
}

/// Exchange a service-account key for an access token.
pub async fn fetch_access_token(
    http: &reqwest::Client,
    key: &ServiceAccountKey,
) -> Result<String, ProviderError> {
    let assertion = sign_assertion(key, Utc::now().timestamp())?;

    let response = http
        .post(GOOGLE_TOKEN_URL)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status().as_u16();
    let body = response.text().await?;
    parse_access_token(status, &body)
}

/// Google answers a rejected assertion with 400 `invalid_grant`, which means
/// the key was revoked or the account deleted.
fn parse_access_token(status: u16, body: &str) -> Result<String, ProviderError> {
    match status {
        200..=299 => serde_json::from_str::<AccessTokenBody>(body)
            .map(|b| b.access_token)
            .map_err(|e| ProviderError::Malformed(e.to_string())),
        400 | 401 | 403 => Err(ProviderError::Unauthorized(error_message(body))),
        _ => Err(ProviderError::from_status(status, error_message(body))),
    }
}
