use std::sync::Arc;

use anyhow::Context;

use arbflow_core::config::Config;
use arbflow_core::crypto::CredentialCipher;
use arbflow_duckdb::DuckDbBackend;

use crate::metadata::{CredentialStore, DuckDbCredentialStore};
use crate::providers::{
    build_http_client, AnalyticsProvider, GoogleAnalyticsClient, GoogleOAuthClient, OAuthClient,
};

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
pub struct AppState {
    /// Tenants and integrations. DuckDB in production; the trait keeps route
    /// handlers storage-agnostic.
    pub store: Arc<dyn CredentialStore>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// Encrypts credential blobs before they reach the store.
    pub cipher: CredentialCipher,

    pub analytics: Arc<dyn AnalyticsProvider>,

    /// `None` when the Google OAuth client variables are not set; the OAuth
    /// routes then answer 501.
    pub oauth: Option<Arc<dyn OAuthClient>>,
}

impl AppState {
    /// Construct the production state: DuckDB store and live Google clients.
    ///
    /// Fails when the encryption key is malformed, so a misconfigured server
    /// refuses to start instead of failing on the first credential.
    pub fn new(db: DuckDbBackend, config: Config) -> anyhow::Result<Self> {
        let cipher = CredentialCipher::from_base64(&config.encryption_key)
            .context("ARBFLOW_ENCRYPTION_KEY")?;
        let http = build_http_client(config.upstream_timeout())
            .context("building outbound HTTP client")?;

        let oauth = config.google.clone().map(|google| {
            Arc::new(GoogleOAuthClient::new(http.clone(), google)) as Arc<dyn OAuthClient>
        });

        Ok(Self {
            store: Arc::new(DuckDbCredentialStore::new(Arc::new(db))),
            config: Arc::new(config),
            cipher,
            analytics: Arc::new(GoogleAnalyticsClient::new(http)),
            oauth,
        })
    }

    /// Replace the analytics client (tests inject canned responses).
    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsProvider>) -> Self {
        self.analytics = analytics;
        self
    }

    /// Replace (or enable) the OAuth client.
    pub fn with_oauth(mut self, oauth: Arc<dyn OAuthClient>) -> Self {
        self.oauth = Some(oauth);
        self
    }
}
