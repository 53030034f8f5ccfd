//! Dashboard payload assembly.
//!
//! The fetch layer reports what happened as a [`FetchOutcome`]; this module
//! turns that into the response body without any error-driven control flow.

use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::forecast::{forecast, ForecastPoint};
use crate::metrics::{MetricsRow, MetricsSummary, PropertySummary};
use crate::recommend::{recommend, Recommendation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardStatus {
    /// A credential is on file but the provider rejected it or failed; the
    /// tenant should re-authenticate.
    PendingIntegration,
    /// No credential on file.
    Pending,
    /// Credential works but no property is selected or visible.
    Connected,
    /// Metrics were fetched for `active_property_id`.
    Active,
}

/// Report data returned by a successful fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub properties: Vec<PropertySummary>,
    pub active_property_id: Option<String>,
    pub rows: Vec<MetricsRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    NotConnected,
    AuthExpired,
    UpstreamError(String),
    Success(Report),
}

/// Anomaly detection is not implemented; this is always the "nothing found"
/// placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub detected: bool,
    pub message: String,
}

impl AnomalyReport {
    pub fn none() -> Self {
        Self {
            detected: false,
            message: "No anomalies detected".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardPayload {
    pub status: DashboardStatus,
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<PropertySummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_property_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<MetricsSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_level: Option<Vec<MetricsRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<ForecastPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<AnomalyReport>,
}

impl DashboardPayload {
    fn bare(status: DashboardStatus, company_name: &str) -> Self {
        Self {
            status,
            company_name: company_name.to_string(),
            properties: None,
            active_property_id: None,
            summary: None,
            post_level: None,
            forecast: None,
            suggestions: None,
            anomaly: None,
        }
    }
}

pub fn build_dashboard(company_name: &str, outcome: FetchOutcome) -> DashboardPayload {
    let report = match outcome {
        FetchOutcome::NotConnected => {
            return DashboardPayload::bare(DashboardStatus::Pending, company_name)
        }
        FetchOutcome::AuthExpired | FetchOutcome::UpstreamError(_) => {
            return DashboardPayload::bare(DashboardStatus::PendingIntegration, company_name)
        }
        FetchOutcome::Success(report) => report,
    };

    let Some(property_id) = report.active_property_id else {
        let mut payload = DashboardPayload::bare(DashboardStatus::Connected, company_name);
        payload.properties = Some(report.properties);
        return payload;
    };

    let projection = forecast(&report.rows);
    let suggestions = recommend(&report.rows);
    let agg = aggregate(report.rows);

    DashboardPayload {
        status: DashboardStatus::Active,
        company_name: company_name.to_string(),
        properties: Some(report.properties),
        active_property_id: Some(property_id),
        summary: Some(agg.summary),
        post_level: Some(agg.post_level),
        forecast: Some(projection),
        suggestions: Some(suggestions),
        anomaly: Some(AnomalyReport::none()),
    }
}
