use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use arbflow_server::state::AppState;

/// `arbflow health`: liveness probe for Docker HEALTHCHECK.
///
/// Calls `GET http://localhost:$ARBFLOW_PORT/health`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("ARBFLOW_PORT").unwrap_or_else(|_| "8000".to_string());
    let url = format!("http://localhost:{}/health", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The probe must not need the secrets the server itself requires.
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }
    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("arbflow=info".parse()?),
        )
        .json()
        .init();

    let cfg = arbflow_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/arbflow.db", cfg.data_dir);
    let db = arbflow_duckdb::DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;

    if cfg.google.is_none() {
        tracing::warn!(
            "GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET / GOOGLE_REDIRECT_URI not set; \
             OAuth linking is disabled, service-account integrations still work"
        );
    }

    let state = Arc::new(AppState::new(db, cfg.clone())?);

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = arbflow_server::app::build_app(Arc::clone(&state));

    info!(
        port = cfg.port,
        report_window_days = cfg.report_window_days,
        "ArbFlow listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    info!("ArbFlow stopped");
    Ok(())
}
