//! Reduce raw report rows into the dashboard KPI block.

use crate::metrics::{MetricsRow, MetricsSummary};

/// Result of [`aggregate`]: the KPI block plus the untouched rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub summary: MetricsSummary,
    pub post_level: Vec<MetricsRow>,
}

/// Sum users and views and compute user-weighted bounce rate and session
/// duration.
pub fn aggregate(rows: Vec<MetricsRow>) -> Aggregate {
    let total_users: u64 = rows.iter().map(|r| r.users).sum();
    let total_views: u64 = rows.iter().map(|r| r.views).sum();

    let (bounce_rate, avg_duration) = if total_users == 0 {
        ("0%".to_string(), "0s".to_string())
    } else {
        let weight = total_users as f64;
        let bounce = rows
            .iter()
            .map(|r| r.bounce_rate * r.users as f64)
            .sum::<f64>()
            / weight;
        let duration = rows
            .iter()
            .map(|r| r.avg_duration * r.users as f64)
            .sum::<f64>()
            / weight;
        (format!("{:.1}%", bounce * 100.0), format!("{:.1}s", duration))
    };

    Aggregate {
        summary: MetricsSummary {
            active_users: total_users,
            page_views: format_views(total_views),
            bounce_rate,
            avg_duration,
        },
        post_level: rows,
    }
}

/// `1500` → `"1.5k"`; values up to and including 1000 stay bare.
pub fn format_views(views: u64) -> String {
    if views > 1000 {
        format!("{:.1}k", views as f64 / 1000.0)
    } else {
        views.to_string()
    }
}
