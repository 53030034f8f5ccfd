use std::time::Duration;

/// Runtime configuration, loaded once at startup from environment variables
/// and handed to every component through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    /// HS256 secret for session tokens and OAuth `state` tokens.
    pub jwt_secret: String,
    /// Base64-encoded 32-byte AES-256-GCM key for stored credentials.
    pub encryption_key: String,
    pub session_hours: u32,
    pub argon2_memory_kb: u32,
    pub cors_origins: Vec<String>,
    pub frontend_url: String,
    pub google: Option<GoogleOAuthConfig>,
    pub upstream_timeout_secs: u64,
    pub report_window_days: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("ARBFLOW_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("ARBFLOW_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("ARBFLOW_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            jwt_secret: required("ARBFLOW_JWT_SECRET")?,
            encryption_key: required("ARBFLOW_ENCRYPTION_KEY")?,
            session_hours: std::env::var("ARBFLOW_SESSION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap_or(24),
            argon2_memory_kb: std::env::var("ARBFLOW_ARGON2_MEMORY_KB")
                .unwrap_or_else(|_| "65536".to_string())
                .parse()
                .unwrap_or(65536),
            cors_origins: std::env::var("ARBFLOW_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_else(|_| vec!["http://localhost:3000".to_string()]),
            frontend_url: std::env::var("ARBFLOW_FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            google: google_from_env(),
            upstream_timeout_secs: std::env::var("ARBFLOW_UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            report_window_days: std::env::var("ARBFLOW_REPORT_WINDOW_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

fn required(key: &str) -> Result<String, String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(format!("{key} is required")),
    }
}

/// The OAuth routes are only served when all three Google variables are set.
fn google_from_env() -> Option<GoogleOAuthConfig> {
    let client_id = std::env::var("GOOGLE_CLIENT_ID").ok()?;
    let client_secret = std::env::var("GOOGLE_CLIENT_SECRET").ok()?;
    let redirect_uri = std::env::var("GOOGLE_REDIRECT_URI").ok()?;
    if client_id.trim().is_empty() || client_secret.trim().is_empty() || redirect_uri.is_empty() {
        return None;
    }
    Some(GoogleOAuthConfig {
        client_id,
        client_secret,
        redirect_uri,
    })
}
