//! Shared domain types: caller identity, roles, and the typed row shapes
//! returned by the data store (one struct per query statement).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Caller identity as resolved by the upstream auth gateway and forwarded
/// in `x-user-id` / `x-user-role` headers. This service trusts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub role: Role,
}

/// Marketplace role. Anything outside the two privileged roles is carried
/// verbatim so permission errors can name it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Developer,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => Role::Admin,
            "developer" => Role::Developer,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Developer => "developer",
            Role::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cohort bucketing granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CohortGranularity {
    Daily,
    Weekly,
    Monthly,
}

impl CohortGranularity {
    /// Postgres `date_trunc` unit for this granularity.
    pub fn trunc_unit(self) -> &'static str {
        match self {
            CohortGranularity::Daily => "day",
            CohortGranularity::Weekly => "week",
            CohortGranularity::Monthly => "month",
        }
    }

    /// Whole days per period. Months are approximated at 30 days,
    /// matching the calendar-naive arithmetic of the rest of the module.
    pub fn period_days(self) -> i64 {
        match self {
            CohortGranularity::Daily => 1,
            CohortGranularity::Weekly => 7,
            CohortGranularity::Monthly => 30,
        }
    }
}

// ─── Query row shapes ───────────────────────────────────────────────────────

/// One calendar day of marketplace sales, aggregated across purchases.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SalesDay {
    pub date: NaiveDate,
    pub units: i64,
    pub revenue_cents: i64,
}

/// Per-user purchase and activity aggregate consumed by the behavior
/// segmenter and the churn scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActivityRow {
    pub user_id: Uuid,
    pub registered_at: DateTime<Utc>,
    pub total_purchases: i64,
    /// Mean purchase amount over the trailing 30 days, minor units.
    pub avg_recent_spend_cents: f64,
    pub activity_count: i64,
    /// None for users who have never produced an activity event.
    pub last_activity: Option<DateTime<Utc>>,
}

/// One category-week of sales volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWeek {
    pub category: String,
    pub week_start: NaiveDate,
    pub units: i64,
}

/// Daily download/session counts for a single app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppDay {
    pub app_id: Uuid,
    pub app_name: String,
    pub date: NaiveDate,
    pub downloads: i64,
    pub sessions: i64,
}

/// One week of revenue for a single developer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueWeek {
    pub week_start: NaiveDate,
    pub revenue_cents: i64,
}

/// Number of users whose first activity falls in a cohort period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortSizeRow {
    pub cohort_period: NaiveDate,
    pub cohort_size: i64,
}

/// Count of a cohort's members active `period_offset` periods after start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortActivityRow {
    pub cohort_period: NaiveDate,
    pub period_offset: u32,
    pub active_users: i64,
}

/// A user's cohort assignment and cumulative revenue to date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLifetimeRow {
    pub user_id: Uuid,
    pub cohort_period: NaiveDate,
    pub lifetime_revenue_cents: i64,
}
