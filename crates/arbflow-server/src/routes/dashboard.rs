use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use arbflow_core::credential::{StoredCredential, GOOGLE_ANALYTICS};
use arbflow_core::dashboard::{build_dashboard, FetchOutcome, Report};
use arbflow_metadata::IntegrationRecord;

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    providers::{AnalyticsProvider, ProviderError},
    state::AppState,
};

use super::integrations::normalize_property_id;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub property_id: Option<String>,
}

/// `GET /api/v1/analytics/dashboard[?property_id=]`: Live GA4 metrics with
/// forecast and recommendation for the authenticated tenant.
///
/// Provider failures never fail the request; they show up as
/// `status: "pending_integration"`. Only a credential blob that cannot be
/// decrypted is a client error.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let requested = match query.property_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(normalize_property_id(raw)?),
        _ => None,
    };

    let integrations = state
        .store
        .list_integrations(&ctx.tenant_id, Some(GOOGLE_ANALYTICS))
        .await
        .map_err(AppError::Internal)?;

    let outcome = match select_integration(&integrations, requested.as_deref()) {
        None => FetchOutcome::NotConnected,
        Some(integration) => {
            let credential =
                StoredCredential::open(&state.cipher, &integration.encrypted_credentials)
                    .map_err(|e| {
                        tracing::warn!(
                            tenant_id = %ctx.tenant_id,
                            integration_id = %integration.id,
                            error = %e,
                            "Stored credential could not be opened"
                        );
                        AppError::BadRequest(e.to_string())
                    })?;
            let target = requested
                .as_deref()
                .or(integration.property_id.as_deref());
            tracing::info!(
                tenant_id = %ctx.tenant_id,
                integration_id = %integration.id,
                credential = credential.kind(),
                property_id = target.unwrap_or(""),
                "Fetching GA4 dashboard"
            );
            fetch_report(
                state.analytics.as_ref(),
                &credential,
                target,
                state.config.report_window_days,
            )
            .await
        }
    };

    Ok(Json(json!({
        "data": build_dashboard(&ctx.company_name, outcome)
    })))
}

/// Pick the integration that serves `requested`.
///
/// An exact property match wins; otherwise the OAuth link (no property of its
/// own) can read any property the user granted. Without a request, a
/// property-bound integration is preferred over the bare OAuth link.
pub(crate) fn select_integration<'a>(
    integrations: &'a [IntegrationRecord],
    requested: Option<&str>,
) -> Option<&'a IntegrationRecord> {
    let oauth_link = || integrations.iter().find(|i| i.property_id.is_none());
    match requested {
        Some(property_id) => integrations
            .iter()
            .find(|i| i.property_id.as_deref() == Some(property_id))
            .or_else(oauth_link)
            .or_else(|| integrations.first()),
        None => integrations
            .iter()
            .find(|i| i.property_id.is_some())
            .or_else(oauth_link),
    }
}

/// Run the authorize → list → report sequence and classify the result.
///
/// A failed property listing is tolerated when the target property is
/// already known: service-account keys are often granted Data API access
/// without Admin API access.
pub(crate) async fn fetch_report(
    analytics: &dyn AnalyticsProvider,
    credential: &StoredCredential,
    target: Option<&str>,
    window_days: u32,
) -> FetchOutcome {
    let access_token = match analytics.authorize(credential).await {
        Ok(token) => token,
        Err(e) => return degrade("authorize", e),
    };

    let properties = match analytics.list_properties(&access_token).await {
        Ok(properties) => properties,
        Err(e) if target.is_some() => {
            tracing::warn!(error = %e, "GA4 property listing failed; using stored property");
            Vec::new()
        }
        Err(e) => return degrade("list_properties", e),
    };

    let Some(property_id) = target
        .map(str::to_string)
        .or_else(|| properties.first().map(|p| p.id.clone()))
    else {
        return FetchOutcome::Success(Report {
            properties,
            active_property_id: None,
            rows: Vec::new(),
        });
    };

    match analytics
        .run_report(&access_token, &property_id, window_days)
        .await
    {
        Ok(rows) => FetchOutcome::Success(Report {
            properties,
            active_property_id: Some(property_id),
            rows,
        }),
        Err(e) => degrade("run_report", e),
    }
}

fn degrade(step: &'static str, error: ProviderError) -> FetchOutcome {
    match error {
        ProviderError::Unauthorized(msg) => {
            tracing::warn!(step, error = %msg, "GA4 rejected the stored credential");
            FetchOutcome::AuthExpired
        }
        other => {
            tracing::warn!(step, error = %other, "GA4 request failed");
            FetchOutcome::UpstreamError(other.to_string())
        }
    }
}
