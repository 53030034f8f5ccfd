//! Linear view-count projection.
//!
//! Rows arrive per channel in the order the report returned them, so the
//! x-axis here is channel rank rather than calendar time. The "Day +k" labels
//! are kept for the dashboard contract.

use serde::{Deserialize, Serialize};

use crate::metrics::MetricsRow;

pub const MIN_POINTS: usize = 3;
pub const HORIZON: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub label: String,
    pub predicted_views: u64,
    pub is_prediction: bool,
}

/// Slope and intercept of the least-squares line `y = m·x + c` over
/// `x = 0..n-1`. `None` when fewer than two points are given.
pub fn least_squares(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let sum_x: f64 = (0..n).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_xx: f64 = (0..n).map(|i| (i * i) as f64).sum();

    let denom = n_f * sum_xx - sum_x * sum_x;
    if denom == 0.0 {
        return None;
    }
    let m = (n_f * sum_xy - sum_x * sum_y) / denom;
    let c = (sum_y - m * sum_x) / n_f;
    Some((m, c))
}

/// Project the next [`HORIZON`] points; empty below [`MIN_POINTS`] rows.
pub fn forecast(rows: &[MetricsRow]) -> Vec<ForecastPoint> {
    if rows.len() < MIN_POINTS {
        return Vec::new();
    }
    let views: Vec<f64> = rows.iter().map(|r| r.views as f64).collect();
    let Some((m, c)) = least_squares(&views) else {
        return Vec::new();
    };

    let n = rows.len();
    (0..HORIZON)
        .map(|k| {
            let x = (n + k) as f64;
            // Halves round to even: 0.5 -> 0, 2.5 -> 2.
            let predicted = (m * x + c).round_ties_even().max(0.0);
            ForecastPoint {
                label: format!("Day +{}", k + 1),
                predicted_views: predicted as u64,
                is_prediction: true,
            }
        })
        .collect()
}
