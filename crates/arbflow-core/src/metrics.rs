use serde::{Deserialize, Serialize};

/// One row of a traffic report: a (source, medium, campaign) channel and its
/// numbers over the report window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub source: String,
    #[serde(default)]
    pub medium: String,
    pub campaign: String,
    pub users: u64,
    pub views: u64,
    /// Fraction in `0.0..=1.0`.
    pub bounce_rate: f64,
    /// Seconds.
    pub avg_duration: f64,
}

/// Rendered KPI block of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub active_users: u64,
    pub page_views: String,
    pub bounce_rate: String,
    pub avg_duration: String,
}

/// An analytics property the credential can read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub id: String,
    pub name: String,
}
