//! Outbound calls to Google: the OAuth token endpoint and the GA4 APIs.
//!
//! Route handlers only see the [`AnalyticsProvider`] and [`OAuthClient`]
//! traits, so tests can inject canned responses.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use arbflow_core::credential::{OAuthTokens, StoredCredential};
use arbflow_core::metrics::{MetricsRow, PropertySummary};

pub mod ga4;
pub mod google_oauth;
pub mod service_account;

pub use ga4::GoogleAnalyticsClient;
pub use google_oauth::GoogleOAuthClient;

pub use arbflow_core::credential::GOOGLE_TOKEN_URI as GOOGLE_TOKEN_URL;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the credential (401/403, `invalid_grant`, or an
    /// unusable service-account key). The tenant has to re-authenticate.
    #[error("credential rejected: {0}")]
    Unauthorized(String),

    /// The OAuth token endpoint answered with an `error` field.
    #[error("{error}: {description}")]
    OAuth { error: String, description: String },

    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed upstream response: {0}")]
    Malformed(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ProviderError {
    /// Classify a non-success HTTP status from a Google API.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ProviderError::Unauthorized(message),
            _ => ProviderError::Status { status, message },
        }
    }
}

/// Reads GA4 data on behalf of a stored credential.
#[async_trait]
pub trait AnalyticsProvider: Send + Sync + 'static {
    /// Turn a stored credential into a bearer access token.
    async fn authorize(&self, credential: &StoredCredential) -> Result<String, ProviderError>;

    /// Properties visible to the token, as `{id, name}` with bare numeric ids.
    async fn list_properties(&self, access_token: &str)
        -> Result<Vec<PropertySummary>, ProviderError>;

    /// Per-channel rows for `property_id` over the last `window_days` days.
    async fn run_report(
        &self,
        access_token: &str,
        property_id: &str,
        window_days: u32,
    ) -> Result<Vec<MetricsRow>, ProviderError>;
}

/// The fixed authorization-code flow against Google.
#[async_trait]
pub trait OAuthClient: Send + Sync + 'static {
    fn authorize_url(&self, state: &str) -> Result<String, ProviderError>;
    async fn exchange_code(&self, code: &str) -> Result<OAuthTokens, ProviderError>;
}

/// Shared outbound client. Requests are bounded so a slow Google endpoint
/// cannot pin a request handler indefinitely.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .user_agent(concat!("arbflow/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Pull a human-readable message out of a Google error body, falling back to
/// the raw body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error_description"))
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}
