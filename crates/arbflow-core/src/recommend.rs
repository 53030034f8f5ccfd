//! Rule-based "best channel" suggestion.

use serde::{Deserialize, Serialize};

use crate::metrics::MetricsRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub primary_focus: String,
    pub reason: String,
    pub action_item: String,
}

impl Recommendation {
    pub fn no_data() -> Self {
        Self {
            primary_focus: "No data".to_string(),
            reason: "There is not enough traffic in the reporting window to rank channels."
                .to_string(),
            action_item: "Check that the tracking tag is installed and come back once traffic \
                          has been recorded."
                .to_string(),
        }
    }
}

/// Views per user; zero when the row has no users.
pub fn roi_score(row: &MetricsRow) -> f64 {
    if row.users == 0 {
        0.0
    } else {
        row.views as f64 / row.users as f64
    }
}

/// Pick the row with the highest [`roi_score`]. Ties keep the earliest row.
pub fn recommend(rows: &[MetricsRow]) -> Recommendation {
    let mut best: Option<(&MetricsRow, f64)> = None;
    for row in rows {
        let score = roi_score(row);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((row, score)),
        }
    }

    let Some((row, score)) = best else {
        return Recommendation::no_data();
    };

    let channel = if row.medium.is_empty() {
        row.source.clone()
    } else {
        format!("{} / {}", row.source, row.medium)
    };
    Recommendation {
        primary_focus: row.source.clone(),
        reason: format!(
            "{channel} drives {score:.1} page views per user, the deepest engagement of any \
             channel in the reporting window."
        ),
        action_item: format!(
            "Shift budget toward {} and reuse the creative from campaign '{}'.",
            row.source, row.campaign
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(source: &str, views: u64, users: u64) -> MetricsRow {
        MetricsRow {
            source: source.to_string(),
            medium: String::new(),
            campaign: "spring".to_string(),
            users,
            views,
            bounce_rate: 0.0,
            avg_duration: 0.0,
        }
    }

    #[test]
    fn picks_highest_views_per_user() {
        let rec = recommend(&[row("A", 10, 5), row("B", 30, 10)]);
        assert_eq!(rec.primary_focus, "B");
        assert!(rec.reason.contains("3.0"));
        assert!(rec.action_item.contains("spring"));
    }

    #[test]
    fn ties_keep_first_row() {
        let rec = recommend(&[row("first", 20, 10), row("second", 40, 20)]);
        assert_eq!(rec.primary_focus, "first");
    }

    #[test]
    fn zero_users_scores_zero() {
        assert_eq!(roi_score(&row("x", 100, 0)), 0.0);
        let rec = recommend(&[row("ghost", 100, 0), row("real", 2, 1)]);
        assert_eq!(rec.primary_focus, "real");
    }

    #[test]
    fn all_zero_scores_still_pick_first() {
        let rec = recommend(&[row("ghost", 100, 0), row("other", 0, 0)]);
        assert_eq!(rec.primary_focus, "ghost");
    }

    #[test]
    fn empty_input_is_no_data() {
        assert_eq!(recommend(&[]), Recommendation::no_data());
    }
}
