//! GA4 Admin API (property listing) and Data API (`runReport`) client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use arbflow_core::credential::StoredCredential;
use arbflow_core::metrics::{MetricsRow, PropertySummary};

use super::service_account::fetch_access_token;
use super::{error_message, AnalyticsProvider, ProviderError};

const ADMIN_API: &str = "https://analyticsadmin.googleapis.com/v1beta";
const DATA_API: &str = "https://analyticsdata.googleapis.com/v1beta";

/// Requested in this order; [`parse_report_rows`] reads values by position.
const DIMENSIONS: [&str; 3] = ["sessionSource", "sessionMedium", "sessionCampaignName"];
const METRICS: [&str; 4] = [
    "activeUsers",
    "screenPageViews",
    "bounceRate",
    "averageSessionDuration",
];

/// Upper bound on account-summary pages followed per listing.
const MAX_SUMMARY_PAGES: usize = 10;

pub struct GoogleAnalyticsClient {
    http: reqwest::Client,
}

impl GoogleAnalyticsClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn get_json(&self, url: &str, access_token: &str) -> Result<String, ProviderError> {
        let response = self.http.get(url).bearer_auth(access_token).send().await?;
        read_body(response).await
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    if !(200..300).contains(&status) {
        return Err(ProviderError::from_status(status, error_message(&body)));
    }
    Ok(body)
}

#[async_trait]
impl AnalyticsProvider for GoogleAnalyticsClient {
    async fn authorize(&self, credential: &StoredCredential) -> Result<String, ProviderError> {
        match credential {
            StoredCredential::OAuth(tokens) => Ok(tokens.access_token.clone()),
            StoredCredential::ServiceAccount(key) => fetch_access_token(&self.http, key).await,
        }
    }

    async fn list_properties(
        &self,
        access_token: &str,
    ) -> Result<Vec<PropertySummary>, ProviderError> {
        let mut properties = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_SUMMARY_PAGES {
            let mut url = format!("{ADMIN_API}/accountSummaries?pageSize=200");
            if let Some(token) = &page_token {
                url.push_str("&pageToken=");
                url.push_str(&url::form_urlencoded::byte_serialize(token.as_bytes()).collect::<String>());
            }
            let body = self.get_json(&url, access_token).await?;
            let (page, next) = parse_account_summaries(&body)?;
            properties.extend(page);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = properties.len(), "GA4 properties listed");
        Ok(properties)
    }

    async fn run_report(
        &self,
        access_token: &str,
        property_id: &str,
        window_days: u32,
    ) -> Result<Vec<MetricsRow>, ProviderError> {
        let url = format!("{DATA_API}/properties/{property_id}:runReport");
        let request = report_request(window_days);

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await?;
        let body = read_body(response).await?;
        let rows = parse_report_rows(&body)?;

        tracing::debug!(property_id, rows = rows.len(), "GA4 report fetched");
        Ok(rows)
    }
}

pub fn report_request(window_days: u32) -> serde_json::Value {
    json!({
        "dateRanges": [{ "startDate": format!("{window_days}daysAgo"), "endDate": "today" }],
        "dimensions": DIMENSIONS.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>(),
        "metrics": METRICS.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>(),
    })
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountSummariesPage {
    #[serde(default)]
    account_summaries: Vec<AccountSummary>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountSummary {
    #[serde(default)]
    property_summaries: Vec<PropertySummaryBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertySummaryBody {
    property: String,
    #[serde(default)]
    display_name: String,
}

/// Flatten one `accountSummaries` page into properties, stripping the
/// `properties/` resource prefix from ids.
pub fn parse_account_summaries(
    body: &str,
) -> Result<(Vec<PropertySummary>, Option<String>), ProviderError> {
    let page: AccountSummariesPage =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    let properties = page
        .account_summaries
        .into_iter()
        .flat_map(|account| account.property_summaries)
        .map(|p| PropertySummary {
            id: p
                .property
                .strip_prefix("properties/")
                .unwrap_or(&p.property)
                .to_string(),
            name: p.display_name,
        })
        .collect();

    let next = page.next_page_token.filter(|t| !t.is_empty());
    Ok((properties, next))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportBody {
    #[serde(default)]
    rows: Vec<ReportRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRow {
    #[serde(default)]
    dimension_values: Vec<ReportValue>,
    #[serde(default)]
    metric_values: Vec<ReportValue>,
}

#[derive(Debug, Deserialize)]
struct ReportValue {
    #[serde(default)]
    value: String,
}

/// Convert a `runReport` response into rows, keeping the API's row order.
/// A report with no data omits `rows` entirely, which yields an empty list.
pub fn parse_report_rows(body: &str) -> Result<Vec<MetricsRow>, ProviderError> {
    let report: ReportBody =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    report
        .rows
        .into_iter()
        .map(|row| {
            if row.dimension_values.len() < DIMENSIONS.len()
                || row.metric_values.len() < METRICS.len()
            {
                return Err(ProviderError::Malformed(format!(
                    "report row has {} dimensions and {} metrics",
                    row.dimension_values.len(),
                    row.metric_values.len()
                )));
            }
            let dim = |i: usize| row.dimension_values[i].value.clone();
            let metric = |i: usize| parse_metric(METRICS[i], &row.metric_values[i].value);
            Ok(MetricsRow {
                source: dim(0),
                medium: dim(1),
                campaign: dim(2),
                users: metric(0)?.max(0.0).round() as u64,
                views: metric(1)?.max(0.0).round() as u64,
                bounce_rate: metric(2)?,
                avg_duration: metric(3)?,
            })
        })
        .collect()
}

/// GA4 serialises every metric value as a string.
fn parse_metric(name: &str, raw: &str) -> Result<f64, ProviderError> {
    raw.parse::<f64>()
        .map_err(|_| ProviderError::Malformed(format!("metric {name} has value '{raw}'")))
}
