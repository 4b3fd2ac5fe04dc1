//! Read-only data access for the analytics service.
//!
//! Every query returns an explicitly typed row struct (one per SQL
//! statement) so schema drift surfaces at the mapping site instead of
//! deep inside a computation. The trait seam exists so the aggregator
//! and cohort engine run against fixture stores in tests.

pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use pulse_core::types::{
    AppDay, CategoryWeek, CohortActivityRow, CohortGranularity, CohortSizeRow, RevenueWeek,
    SalesDay, UserActivityRow, UserLifetimeRow,
};
use pulse_core::MarketResult;

pub use postgres::PgMarketStore;

/// Read-only marketplace queries consumed by the analytics computations.
/// Implementations must not write.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Platform-wide daily sales since `since`, ascending by date.
    async fn daily_sales(&self, since: NaiveDate) -> MarketResult<Vec<SalesDay>>;

    /// One developer's daily sales since `since`, ascending by date.
    async fn developer_daily_sales(
        &self,
        developer_id: &str,
        since: NaiveDate,
    ) -> MarketResult<Vec<SalesDay>>;

    /// Mean purchase amount (minor units) since `since`; `None` when no
    /// purchases exist in the window.
    async fn average_order_value_cents(&self, since: NaiveDate) -> MarketResult<Option<f64>>;

    /// Purchase/activity aggregates for every registered user.
    async fn user_activity(&self) -> MarketResult<Vec<UserActivityRow>>;

    /// Weekly sales volume per category over the trailing `weeks`.
    async fn weekly_category_sales(&self, weeks: u32) -> MarketResult<Vec<CategoryWeek>>;

    /// Daily download/session rows for one developer's apps since `since`.
    async fn developer_app_days(
        &self,
        developer_id: &str,
        since: NaiveDate,
    ) -> MarketResult<Vec<AppDay>>;

    /// One developer's weekly revenue over the trailing `weeks`,
    /// ascending by week.
    async fn developer_weekly_revenue(
        &self,
        developer_id: &str,
        weeks: u32,
    ) -> MarketResult<Vec<RevenueWeek>>;

    /// Cohort sizes for the trailing `num_periods` cohorts.
    async fn cohort_sizes(
        &self,
        granularity: CohortGranularity,
        num_periods: u32,
    ) -> MarketResult<Vec<CohortSizeRow>>;

    /// Active-member counts per cohort and elapsed period.
    async fn cohort_activity(
        &self,
        granularity: CohortGranularity,
        num_periods: u32,
    ) -> MarketResult<Vec<CohortActivityRow>>;

    /// Per-user cohort assignment and cumulative revenue.
    async fn user_lifetime_values(
        &self,
        granularity: CohortGranularity,
    ) -> MarketResult<Vec<UserLifetimeRow>>;
}
