//! Behavior segmentation — fixed-threshold membership and horizon-scaled
//! purchase/churn projections.

use chrono::{DateTime, Duration, Utc};
use pulse_core::config::ProjectionRates;
use pulse_core::types::UserActivityRow;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Minimum purchases to qualify as high value.
const HIGH_VALUE_MIN_PURCHASES: i64 = 5;
/// Minimum trailing-30-day average spend (minor units) for high value.
const HIGH_VALUE_MIN_RECENT_SPEND_CENTS: f64 = 5000.0;
/// Purchase range `[min, max)` for the regular segment.
const REGULAR_PURCHASE_RANGE: (i64, i64) = (2, 5);
/// Registration recency window for the new-user segment.
const NEW_USER_WINDOW_DAYS: i64 = 30;
/// Inactivity age past which a user counts as at risk.
const AT_RISK_INACTIVE_DAYS: i64 = 14;

/// Projections scale segment counts over this baseline span.
const PROJECTION_BASELINE_DAYS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SegmentName {
    HighValue,
    Regular,
    New,
    AtRisk,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSegment {
    pub name: SegmentName,
    pub members: Vec<Uuid>,
    pub count: u64,
    pub percentage_of_total: f64,
}

/// Segment counts scaled into expected purchases and churn over the
/// requested horizon.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BehaviorProjections {
    pub horizon_days: u32,
    pub expected_high_value_purchases: u64,
    pub expected_regular_purchases: u64,
    pub expected_new_user_purchases: u64,
    pub projected_churned_users: u64,
    pub projected_new_users: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SegmentationResult {
    pub total_users: u64,
    pub segments: Vec<UserSegment>,
    pub projections: BehaviorProjections,
}

/// Partition users into behavioral segments and project forward.
///
/// Membership is not mutually exclusive: a high-value user who went quiet
/// appears in both `high_value` and `at_risk`, and a user who never
/// produced an activity event is at risk the same as a stale one. The
/// dashboards rely on the overlap.
pub fn segment_users(
    users: &[UserActivityRow],
    horizon_days: u32,
    rates: &ProjectionRates,
    now: DateTime<Utc>,
) -> SegmentationResult {
    let mut high_value = Vec::new();
    let mut regular = Vec::new();
    let mut new = Vec::new();
    let mut at_risk = Vec::new();

    let new_cutoff = now - Duration::days(NEW_USER_WINDOW_DAYS);
    let stale_cutoff = now - Duration::days(AT_RISK_INACTIVE_DAYS);

    for user in users {
        if user.total_purchases >= HIGH_VALUE_MIN_PURCHASES
            && user.avg_recent_spend_cents > HIGH_VALUE_MIN_RECENT_SPEND_CENTS
        {
            high_value.push(user.user_id);
        }
        if user.total_purchases >= REGULAR_PURCHASE_RANGE.0
            && user.total_purchases < REGULAR_PURCHASE_RANGE.1
        {
            regular.push(user.user_id);
        }
        if user.total_purchases < REGULAR_PURCHASE_RANGE.0 && user.registered_at >= new_cutoff {
            new.push(user.user_id);
        }
        match user.last_activity {
            Some(last) if last >= stale_cutoff => {}
            _ => at_risk.push(user.user_id),
        }
    }

    let total = users.len() as u64;
    let span = horizon_days as f64 / PROJECTION_BASELINE_DAYS;

    let projections = BehaviorProjections {
        horizon_days,
        expected_high_value_purchases: scale(high_value.len(), rates.high_value_conversion, span),
        expected_regular_purchases: scale(regular.len(), rates.regular_conversion, span),
        expected_new_user_purchases: scale(new.len(), rates.new_user_conversion, span),
        projected_churned_users: scale(at_risk.len(), rates.churn_rate, span),
        projected_new_users: scale(new.len(), rates.growth_rate, span),
    };

    let segments = vec![
        build_segment(SegmentName::HighValue, high_value, total),
        build_segment(SegmentName::Regular, regular, total),
        build_segment(SegmentName::New, new, total),
        build_segment(SegmentName::AtRisk, at_risk, total),
    ];

    SegmentationResult {
        total_users: total,
        segments,
        projections,
    }
}

fn scale(count: usize, rate: f64, span: f64) -> u64 {
    (count as f64 * rate * span).round() as u64
}

fn build_segment(name: SegmentName, members: Vec<Uuid>, total: u64) -> UserSegment {
    let count = members.len() as u64;
    let percentage_of_total = if total > 0 {
        count as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    UserSegment {
        name,
        members,
        count,
        percentage_of_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_time() -> DateTime<Utc> {
        "2024-06-01T12:00:00Z".parse().unwrap()
    }

    fn user(
        purchases: i64,
        avg_recent_spend_cents: f64,
        registered_days_ago: i64,
        last_activity_days_ago: Option<i64>,
    ) -> UserActivityRow {
        let now = base_time();
        UserActivityRow {
            user_id: Uuid::new_v4(),
            registered_at: now - Duration::days(registered_days_ago),
            total_purchases: purchases,
            avg_recent_spend_cents,
            activity_count: 10,
            last_activity: last_activity_days_ago.map(|d| now - Duration::days(d)),
        }
    }

    fn segment<'a>(result: &'a SegmentationResult, name: SegmentName) -> &'a UserSegment {
        result.segments.iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn thresholds_assign_expected_segments() {
        let users = vec![
            user(8, 9000.0, 200, Some(2)),  // high value, active
            user(3, 1200.0, 100, Some(5)),  // regular
            user(1, 800.0, 10, Some(1)),    // new
            user(0, 0.0, 90, Some(40)),     // stale: at risk
            user(0, 0.0, 90, None),         // never active: at risk
        ];
        let result = segment_users(&users, 30, &ProjectionRates::default(), base_time());

        assert_eq!(segment(&result, SegmentName::HighValue).count, 1);
        assert_eq!(segment(&result, SegmentName::Regular).count, 1);
        assert_eq!(segment(&result, SegmentName::New).count, 1);
        assert_eq!(segment(&result, SegmentName::AtRisk).count, 2);
        assert_eq!(result.total_users, 5);
    }

    #[test]
    fn high_spender_below_purchase_floor_is_not_high_value() {
        let users = vec![user(4, 20_000.0, 200, Some(1))];
        let result = segment_users(&users, 30, &ProjectionRates::default(), base_time());
        assert_eq!(segment(&result, SegmentName::HighValue).count, 0);
    }

    #[test]
    fn stale_high_value_user_is_in_both_segments() {
        // high_value and at_risk are deliberately not exclusive.
        let users = vec![user(10, 15_000.0, 300, Some(60))];
        let result = segment_users(&users, 30, &ProjectionRates::default(), base_time());
        assert_eq!(segment(&result, SegmentName::HighValue).count, 1);
        assert_eq!(segment(&result, SegmentName::AtRisk).count, 1);
    }

    #[test]
    fn old_registration_with_few_purchases_is_not_new() {
        let users = vec![user(1, 100.0, 45, Some(2))];
        let result = segment_users(&users, 30, &ProjectionRates::default(), base_time());
        assert_eq!(segment(&result, SegmentName::New).count, 0);
    }

    #[test]
    fn projections_scale_by_rate_and_horizon() {
        // Ten high-value users, 15-day horizon: 10 * 0.8 * 0.5 = 4.
        let users: Vec<UserActivityRow> =
            (0..10).map(|_| user(8, 9000.0, 200, Some(1))).collect();
        let result = segment_users(&users, 15, &ProjectionRates::default(), base_time());
        assert_eq!(result.projections.expected_high_value_purchases, 4);
        assert_eq!(result.projections.projected_churned_users, 0);
    }

    #[test]
    fn churn_and_growth_projections_use_their_segments() {
        // Ten at-risk users: 10 * 0.3 = 3. Five new users: 5 * 1.2 = 6.
        let mut users: Vec<UserActivityRow> =
            (0..10).map(|_| user(3, 500.0, 200, None)).collect();
        users.extend((0..5).map(|_| user(0, 0.0, 5, Some(1))));
        let result = segment_users(&users, 30, &ProjectionRates::default(), base_time());
        assert_eq!(result.projections.projected_churned_users, 3);
        assert_eq!(result.projections.projected_new_users, 6);
        assert_eq!(result.projections.expected_new_user_purchases, 1);
    }

    #[test]
    fn empty_input_yields_zeroed_result() {
        let result = segment_users(&[], 30, &ProjectionRates::default(), base_time());
        assert_eq!(result.total_users, 0);
        assert!(result.segments.iter().all(|s| s.count == 0));
        assert!(result
            .segments
            .iter()
            .all(|s| s.percentage_of_total == 0.0));
    }
}
