use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use arbflow_core::config::GoogleOAuthConfig;
use arbflow_core::credential::OAuthTokens;

use super::{error_message, OAuthClient, ProviderError, GOOGLE_TOKEN_URL};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const ANALYTICS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";

/// Authorization-code flow for the `analytics.readonly` scope.
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    config: GoogleOAuthConfig,
}

impl GoogleOAuthClient {
    pub fn new(http: reqwest::Client, config: GoogleOAuthConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl OAuthClient for GoogleOAuthClient {
    fn authorize_url(&self, state: &str) -> Result<String, ProviderError> {
        build_authorize_url(&self.config, state)
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, ProviderError> {
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), "Google token exchange answered");
        parse_token_response(status.as_u16(), &body)
    }
}

pub fn build_authorize_url(config: &GoogleOAuthConfig, state: &str) -> Result<String, ProviderError> {
    let url = Url::parse_with_params(
        AUTHORIZE_URL,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", ANALYTICS_READONLY_SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ],
    )
    .map_err(|e| ProviderError::Malformed(e.to_string()))?;
    Ok(url.to_string())
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Interpret a token-endpoint response.
///
/// Google reports a refused code as a 4xx with an `error` field; the
/// description is preferred over the bare error code for display.
pub fn parse_token_response(status: u16, body: &str) -> Result<OAuthTokens, ProviderError> {
    if let Ok(err) = serde_json::from_str::<TokenErrorBody>(body) {
        return Err(ProviderError::OAuth {
            description: err.error_description.unwrap_or_else(|| err.error.clone()),
            error: err.error,
        });
    }
    if !(200..300).contains(&status) {
        return Err(ProviderError::Status {
            status,
            message: error_message(body),
        });
    }
    serde_json::from_str::<OAuthTokens>(body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GoogleOAuthConfig {
        GoogleOAuthConfig {
            client_id: "client-123.apps.googleusercontent.com".to_string(),
            client_secret: "shh".to_string(),
            redirect_uri: "http://localhost:8000/api/v1/integrations/google/callback".to_string(),
        }
    }

    #[test]
    fn authorize_url_carries_offline_consent_and_state() {
        let url = build_authorize_url(&config(), "state-token").expect("url");
        let parsed = Url::parse(&url).expect("parse");
        assert_eq!(parsed.host_str(), Some("accounts.google.com"));
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client-123.apps.googleusercontent.com");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], ANALYTICS_READONLY_SCOPE);
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["prompt"], "consent");
        assert_eq!(params["state"], "state-token");
        assert_eq!(
            params["redirect_uri"],
            "http://localhost:8000/api/v1/integrations/google/callback"
        );
        assert!(!params.contains_key("client_secret"));
    }

    #[test]
    fn token_response_is_parsed() {
        let tokens = parse_token_response(
            200,
            r#"{"access_token":"ya29.a","expires_in":3599,"refresh_token":"1//r","scope":"x","token_type":"Bearer"}"#,
        )
        .expect("tokens");
        assert_eq!(tokens.access_token, "ya29.a");
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//r"));
        assert_eq!(tokens.expires_in, Some(3599));
    }

    #[test]
    fn error_field_becomes_oauth_error_with_description() {
        let err = parse_token_response(
            400,
            r#"{"error":"invalid_grant","error_description":"Malformed auth code."}"#,
        )
        .expect_err("error");
        match err {
            ProviderError::OAuth { error, description } => {
                assert_eq!(error, "invalid_grant");
                assert_eq!(description, "Malformed auth code.");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_without_description_falls_back_to_code() {
        let err = parse_token_response(400, r#"{"error":"invalid_client"}"#).expect_err("error");
        assert_eq!(err.to_string(), "invalid_client: invalid_client");
    }

    #[test]
    fn server_failure_is_a_status_error() {
        let err = parse_token_response(503, "unavailable").expect_err("error");
        assert!(matches!(err, ProviderError::Status { status: 503, .. }));
    }
}
