use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth, routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer`: structured request/response logging via `tracing`. The
///    span carries the path only; query strings can hold session tokens.
/// 2. `CorsLayer`: only the configured frontend origins may call the API
///    from a browser.
///
/// Routes under `protected` pass through `require_auth`, which resolves the
/// bearer token to an [`auth::middleware::AuthContext`] extension.
pub fn build_app(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/v1/auth/me", get(auth::handlers::me))
        .route(
            "/api/v1/integrations",
            post(routes::integrations::save_integration).get(routes::integrations::list_integrations),
        )
        .route(
            "/api/v1/integrations/{id}",
            delete(routes::integrations::delete_integration),
        )
        .route("/api/v1/integrations/google/link", get(routes::google::link))
        .route("/api/v1/analytics/dashboard", get(routes::dashboard::dashboard))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::middleware::require_auth,
        ));

    Router::new()
        .route("/", get(routes::root::index))
        .route("/health", get(routes::health::health))
        .route("/api/v1/auth/register", post(auth::handlers::register))
        .route("/api/v1/auth/login", post(auth::handlers::login))
        .route("/api/v1/integrations/google/login", get(routes::google::login))
        .route(
            "/api/v1/integrations/google/callback",
            get(routes::google::callback),
        )
        .merge(protected)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn request_span(request: &Request) -> tracing::Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
