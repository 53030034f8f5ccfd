use serde::{Deserialize, Serialize};

use crate::crypto::CredentialCipher;
use crate::error::CoreError;

/// Provider tag for Google Analytics 4 integrations.
pub const GOOGLE_ANALYTICS: &str = "google_analytics";

/// The only token endpoint a service-account key may name. Assertions are
/// always exchanged here, whatever the uploaded key file says.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens returned by the OAuth token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// The fields of a Google service-account key file that the fetcher needs.
/// Other fields of the key file are accepted and ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

/// Decrypted credential blob of an integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredCredential {
    ServiceAccount(ServiceAccountKey),
    OAuth(OAuthTokens),
}

impl StoredCredential {
    /// Parse a credential JSON document, accepting either a service-account
    /// key file or a stored OAuth token set.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let credential: StoredCredential = serde_json::from_str(raw)
            .map_err(|e| CoreError::MalformedCredential(e.to_string()))?;
        if let StoredCredential::ServiceAccount(key) = &credential {
            if key.key_type != "service_account" {
                return Err(CoreError::MalformedCredential(format!(
                    "unsupported key type '{}'",
                    key.key_type
                )));
            }
            if let Some(uri) = key.token_uri.as_deref() {
                if uri.trim_end_matches('/') != GOOGLE_TOKEN_URI {
                    return Err(CoreError::MalformedCredential(format!(
                        "unsupported token_uri '{uri}'"
                    )));
                }
            }
        }
        Ok(credential)
    }

    pub fn seal(&self, cipher: &CredentialCipher) -> Result<String, CoreError> {
        let json = serde_json::to_string(self)?;
        Ok(cipher.encrypt(&json)?)
    }

    pub fn open(cipher: &CredentialCipher, blob: &str) -> Result<Self, CoreError> {
        let json = cipher.decrypt(blob)?;
        Self::parse(&json)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StoredCredential::ServiceAccount(_) => "service_account",
            StoredCredential::OAuth(_) => "oauth",
        }
    }
}
