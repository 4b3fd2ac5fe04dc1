//! Heuristic churn scoring — additive recency/purchase/activity/age
//! buckets with a clamped probability.

use chrono::{DateTime, Utc};
use pulse_core::types::UserActivityRow;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// Additive bucket weights. Within a bucket only the first matching
// branch contributes, in exactly this order.
const INACTIVE_OVER_30D_WEIGHT: f64 = 0.4;
const INACTIVE_OVER_14D_WEIGHT: f64 = 0.2;
const NO_PURCHASES_WEIGHT: f64 = 0.3;
const FEW_PURCHASES_WEIGHT: f64 = 0.1;
const LOW_ACTIVITY_WEIGHT: f64 = 0.3;
const MODERATE_ACTIVITY_WEIGHT: f64 = 0.2;
const NEW_ACCOUNT_WEIGHT: f64 = 0.1;

/// Risk bands over the clamped probability: high above 0.7, medium above
/// 0.4, low otherwise (strict comparisons).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChurnPrediction {
    pub user_id: Uuid,
    pub churn_probability: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChurnReport {
    pub scored_users: u64,
    pub high_risk: u64,
    pub medium_risk: u64,
    pub low_risk: u64,
    /// Sorted by descending probability.
    pub predictions: Vec<ChurnPrediction>,
}

fn risk_level(probability: f64) -> RiskLevel {
    if probability > 0.7 {
        RiskLevel::High
    } else if probability > 0.4 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Score one user. Buckets contribute independently and the sum clamps
/// to 1.0. A user with no activity events at all scores the stalest
/// recency branch.
pub fn score_user(user: &UserActivityRow, now: DateTime<Utc>) -> ChurnPrediction {
    let mut score = 0.0;

    let days_since_activity = user
        .last_activity
        .map(|last| (now - last).num_days())
        .unwrap_or(i64::MAX);
    if days_since_activity > 30 {
        score += INACTIVE_OVER_30D_WEIGHT;
    } else if days_since_activity > 14 {
        score += INACTIVE_OVER_14D_WEIGHT;
    }

    if user.total_purchases == 0 {
        score += NO_PURCHASES_WEIGHT;
    } else if user.total_purchases < 2 {
        score += FEW_PURCHASES_WEIGHT;
    }

    // This bucket checks < 5 before < 10, unlike the others which test
    // the severe branch first. Reordering would award 0.2 instead of
    // 0.3 to every user under five events; do not "fix" it.
    if user.activity_count < 5 {
        score += LOW_ACTIVITY_WEIGHT;
    } else if user.activity_count < 10 {
        score += MODERATE_ACTIVITY_WEIGHT;
    }

    let account_age_days = (now - user.registered_at).num_days();
    if account_age_days < 7 {
        score += NEW_ACCOUNT_WEIGHT;
    }

    let churn_probability = score.min(1.0);

    ChurnPrediction {
        user_id: user.user_id,
        churn_probability,
        risk_level: risk_level(churn_probability),
    }
}

/// Score a population and aggregate risk-band counts.
pub fn score_users(users: &[UserActivityRow], now: DateTime<Utc>) -> ChurnReport {
    let mut predictions: Vec<ChurnPrediction> =
        users.iter().map(|user| score_user(user, now)).collect();
    predictions.sort_by(|a, b| b.churn_probability.total_cmp(&a.churn_probability));

    let count_level = |level: RiskLevel| {
        predictions
            .iter()
            .filter(|p| p.risk_level == level)
            .count() as u64
    };

    ChurnReport {
        scored_users: predictions.len() as u64,
        high_risk: count_level(RiskLevel::High),
        medium_risk: count_level(RiskLevel::Medium),
        low_risk: count_level(RiskLevel::Low),
        predictions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_time() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    fn user(
        purchases: i64,
        activity_count: i64,
        registered_days_ago: i64,
        last_activity_days_ago: Option<i64>,
    ) -> UserActivityRow {
        let now = base_time();
        UserActivityRow {
            user_id: Uuid::new_v4(),
            registered_at: now - Duration::days(registered_days_ago),
            total_purchases: purchases,
            avg_recent_spend_cents: 0.0,
            activity_count,
            last_activity: last_activity_days_ago.map(|d| now - Duration::days(d)),
        }
    }

    #[test]
    fn worst_case_user_clamps_to_exactly_one() {
        // 0.4 + 0.3 + 0.3 + 0.1 = 1.1 additively.
        let prediction = score_user(&user(0, 0, 3, Some(45)), base_time());
        assert_eq!(prediction.churn_probability, 1.0);
        assert_eq!(prediction.risk_level, RiskLevel::High);
    }

    #[test]
    fn never_active_user_scores_stalest_recency_branch() {
        let with_none = score_user(&user(5, 20, 100, None), base_time());
        let with_stale = score_user(&user(5, 20, 100, Some(60)), base_time());
        assert_eq!(with_none.churn_probability, with_stale.churn_probability);
        assert!((with_none.churn_probability - 0.4).abs() < 1e-9);
    }

    #[test]
    fn activity_buckets_are_first_match_wins() {
        // Three events: the < 5 branch fires for 0.3, not 0.2.
        let low = score_user(&user(5, 3, 100, Some(1)), base_time());
        assert!((low.churn_probability - 0.3).abs() < 1e-9);

        // Seven events: only the < 10 branch fires for 0.2.
        let moderate = score_user(&user(5, 7, 100, Some(1)), base_time());
        assert!((moderate.churn_probability - 0.2).abs() < 1e-9);

        // Twelve events: neither branch fires.
        let active = score_user(&user(5, 12, 100, Some(1)), base_time());
        assert_eq!(active.churn_probability, 0.0);
    }

    #[test]
    fn recency_buckets_check_severe_branch_first() {
        let very_stale = score_user(&user(5, 20, 100, Some(31)), base_time());
        assert!((very_stale.churn_probability - 0.4).abs() < 1e-9);

        let stale = score_user(&user(5, 20, 100, Some(20)), base_time());
        assert!((stale.churn_probability - 0.2).abs() < 1e-9);

        let fresh = score_user(&user(5, 20, 100, Some(3)), base_time());
        assert_eq!(fresh.churn_probability, 0.0);
    }

    #[test]
    fn risk_band_boundaries_are_strict() {
        // 0.2 + 0.2 sums to exactly 0.4: low, not medium (strict >).
        let lower = score_user(&user(5, 7, 100, Some(20)), base_time());
        assert_eq!(lower.churn_probability, 0.4);
        assert_eq!(lower.risk_level, RiskLevel::Low);

        // 0.4 + 0.2 lands above the medium threshold but below high.
        let middle = score_user(&user(5, 7, 100, Some(45)), base_time());
        assert!((middle.churn_probability - 0.6).abs() < 1e-9);
        assert_eq!(middle.risk_level, RiskLevel::Medium);

        // 0.4 + 0.3 + 0.2 is well past the high threshold.
        let upper = score_user(&user(0, 7, 100, Some(45)), base_time());
        assert!((upper.churn_probability - 0.9).abs() < 1e-9);
        assert_eq!(upper.risk_level, RiskLevel::High);
    }

    #[test]
    fn new_account_adds_weight() {
        let brand_new = score_user(&user(5, 20, 3, Some(1)), base_time());
        assert!((brand_new.churn_probability - 0.1).abs() < 1e-9);
    }

    #[test]
    fn report_sorts_descending_and_counts_bands() {
        let users = vec![
            user(5, 20, 100, Some(1)), // 0.0 low
            user(5, 7, 100, Some(20)), // 0.4 low
            user(5, 7, 100, Some(45)), // 0.6 medium
            user(0, 0, 3, Some(45)),   // 1.0 high
        ];
        let report = score_users(&users, base_time());
        assert_eq!(report.scored_users, 4);
        assert_eq!(report.high_risk, 1);
        assert_eq!(report.medium_risk, 1);
        assert_eq!(report.low_risk, 2);
        assert!(report
            .predictions
            .windows(2)
            .all(|w| w[0].churn_probability >= w[1].churn_probability));
        assert_eq!(report.predictions[0].churn_probability, 1.0);
    }
}
