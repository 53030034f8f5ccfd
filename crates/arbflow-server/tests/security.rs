/// Security integration tests.
///
/// Covers: CORS origin allow-list, credentials encrypted at rest, hostile
/// input reaching the store, and malformed request bodies.
use std::io;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

use arbflow_core::crypto::CredentialCipher;
use arbflow_duckdb::DuckDbBackend;
use arbflow_server::app::build_app;
use arbflow_server::metadata::DuckDbCredentialStore;
use arbflow_server::state::AppState;

mod common;

use common::{
    json_body, register_and_login, save_service_account, send, setup, test_config,
    FakeAnalytics, TEST_ENCRYPTION_KEY, TEST_PASSWORD,
};

// ─────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────

/// App whose DuckDB handle stays reachable for raw row inspection.
fn setup_with_db() -> (Arc<DuckDbBackend>, axum::Router) {
    let db = Arc::new(DuckDbBackend::open_in_memory().expect("in-memory DuckDB"));
    let state = AppState {
        store: Arc::new(DuckDbCredentialStore::new(Arc::clone(&db))),
        config: Arc::new(test_config()),
        cipher: CredentialCipher::from_base64(TEST_ENCRYPTION_KEY).expect("key"),
        analytics: Arc::new(FakeAnalytics::default()),
        oauth: None,
    };
    (db, build_app(Arc::new(state)))
}

// ─────────────────────────────────────────────────────────────
// Feature: CORS behaviour
// ─────────────────────────────────────────────────────────────

async fn preflight(app: &axum::Router, origin: &str) -> Option<String> {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/v1/analytics/dashboard")
        .header("origin", origin)
        .header("access-control-request-method", "GET")
        .header("access-control-request-headers", "authorization")
        .body(Body::empty())
        .expect("build request");
    let response = app.clone().oneshot(request).await.expect("request");
    response
        .headers()
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[tokio::test]
async fn test_cors_allows_listed_frontend_origin() {
    let (_state, app) = setup(Arc::new(FakeAnalytics::default()));
    assert_eq!(
        preflight(&app, "http://localhost:3000").await.as_deref(),
        Some("http://localhost:3000"),
        "listed origin must be reflected in ACAO"
    );
}

#[tokio::test]
async fn test_cors_blocks_unlisted_origin() {
    let (_state, app) = setup(Arc::new(FakeAnalytics::default()));
    assert_eq!(preflight(&app, "https://evil.example").await, None);
}

// ─────────────────────────────────────────────────────────────
// Feature: credentials at rest
// ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_stored_credentials_are_encrypted() {
    let (db, app) = setup_with_db();
    let session = register_and_login(&app, "owner@acme.test").await;
    save_service_account(&app, &session.token, "123").await;

    let conn = db.conn_for_test().await;
    let blob: String = conn
        .query_row(
            "SELECT encrypted_credentials FROM integrations WHERE property_id = '123'",
            arbflow_duckdb::duckdb::params![],
            |row| row.get(0),
        )
        .expect("stored row");
    assert!(!blob.contains("PRIVATE KEY"));
    assert!(!blob.contains("service_account"));

    let cipher = CredentialCipher::from_base64(TEST_ENCRYPTION_KEY).expect("key");
    let plaintext = cipher.decrypt(&blob).expect("decrypt");
    assert!(plaintext.contains("reporter@acme-analytics.iam.gserviceaccount.com"));
}

#[tokio::test]
async fn test_password_is_stored_as_argon2id_hash() {
    let (db, app) = setup_with_db();
    register_and_login(&app, "owner@acme.test").await;

    let conn = db.conn_for_test().await;
    let hash: String = conn
        .query_row(
            "SELECT password_hash FROM tenants WHERE email = 'owner@acme.test'",
            arbflow_duckdb::duckdb::params![],
            |row| row.get(0),
        )
        .expect("stored row");
    assert!(hash.starts_with("$argon2id$"));
    assert!(!hash.contains(TEST_PASSWORD));
}

// ─────────────────────────────────────────────────────────────
// Feature: hostile input
// ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sql_injection_in_login_is_plain_auth_failure() {
    let (_state, app) = setup(Arc::new(FakeAnalytics::default()));
    register_and_login(&app, "owner@acme.test").await;

    let response = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "' OR 1=1; DROP TABLE tenants; --", "password": "x" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The table survived.
    register_and_login(&app, "second@acme.test").await;
}

#[tokio::test]
async fn test_malformed_json_body_is_client_error() {
    let (_state, app) = setup(Arc::new(FakeAnalytics::default()));
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("build request");
    let response = app.oneshot(request).await.expect("request");
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_error_bodies_never_echo_stored_secrets() {
    let (_state, app) = setup(Arc::new(FakeAnalytics::default()));
    let session = register_and_login(&app, "owner@acme.test").await;
    save_service_account(&app, &session.token, "123").await;

    let response = send(
        &app,
        "POST",
        "/api/v1/integrations",
        Some(&session.token),
        Some(json!({
            "provider": "google_analytics",
            "property_id": "not-a-number",
            "service_account_json": common::SERVICE_ACCOUNT_JSON,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await.to_string();
    assert!(!body.contains("PRIVATE KEY"));
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_request_logs_omit_query_string_tokens() {
    let (_state, app) = setup(Arc::new(FakeAnalytics::default()));
    let session = register_and_login(&app, "owner@acme.test").await;

    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let uri = format!("/api/v1/integrations/google/login?token={}", session.token);
    let response = send(&app, "GET", &uri, None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);

    let output = logs.text();
    assert!(output.contains("/api/v1/integrations/google/login"), "{output}");
    assert!(!output.contains(&session.token));
    assert!(!output.contains("token="));
}
