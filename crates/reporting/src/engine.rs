//! Cohort engine — fetches cohort rows and assembles the analysis
//! payload served by the cohorts endpoint.

use chrono::{DateTime, Utc};
use pulse_core::types::CohortGranularity;
use pulse_core::MarketResult;
use pulse_store::MarketStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

use crate::cohort::{build_retention, engagement_curve, CohortRow, EngagementPoint};
use crate::ltv::{ltv_percentiles, LtvPercentiles};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CohortAnalysis {
    pub granularity: CohortGranularity,
    pub periods: u32,
    pub cohorts: Vec<CohortRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ltv: Option<LtvPercentiles>,
    pub engagement: Vec<EngagementPoint>,
    pub generated_at: DateTime<Utc>,
}

pub struct CohortEngine {
    store: Arc<dyn MarketStore>,
}

impl CohortEngine {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    /// Build the full cohort analysis: retention table, LTV percentiles,
    /// and the pooled engagement curve.
    pub async fn analyze(
        &self,
        granularity: CohortGranularity,
        num_periods: u32,
    ) -> MarketResult<CohortAnalysis> {
        let sizes = self.store.cohort_sizes(granularity, num_periods).await?;
        let activity = self.store.cohort_activity(granularity, num_periods).await?;
        let lifetimes = self.store.user_lifetime_values(granularity).await?;

        let cohorts = build_retention(&sizes, &activity);
        let engagement = engagement_curve(&cohorts);
        let values: Vec<i64> = lifetimes
            .iter()
            .map(|row| row.lifetime_revenue_cents)
            .collect();
        let ltv = ltv_percentiles(&values);

        debug!(
            cohorts = cohorts.len(),
            users = values.len(),
            "Cohort analysis computed"
        );

        Ok(CohortAnalysis {
            granularity,
            periods: num_periods,
            cohorts,
            ltv,
            engagement,
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pulse_core::types::*;
    use pulse_core::MarketError;
    use uuid::Uuid;

    struct FixtureStore;

    #[async_trait]
    impl MarketStore for FixtureStore {
        async fn daily_sales(&self, _since: NaiveDate) -> MarketResult<Vec<SalesDay>> {
            unreachable!("cohort engine never reads sales")
        }

        async fn developer_daily_sales(
            &self,
            _developer_id: &str,
            _since: NaiveDate,
        ) -> MarketResult<Vec<SalesDay>> {
            unreachable!()
        }

        async fn average_order_value_cents(
            &self,
            _since: NaiveDate,
        ) -> MarketResult<Option<f64>> {
            unreachable!()
        }

        async fn user_activity(&self) -> MarketResult<Vec<UserActivityRow>> {
            unreachable!()
        }

        async fn weekly_category_sales(&self, _weeks: u32) -> MarketResult<Vec<CategoryWeek>> {
            unreachable!()
        }

        async fn developer_app_days(
            &self,
            _developer_id: &str,
            _since: NaiveDate,
        ) -> MarketResult<Vec<AppDay>> {
            unreachable!()
        }

        async fn developer_weekly_revenue(
            &self,
            _developer_id: &str,
            _weeks: u32,
        ) -> MarketResult<Vec<RevenueWeek>> {
            unreachable!()
        }

        async fn cohort_sizes(
            &self,
            _granularity: CohortGranularity,
            _num_periods: u32,
        ) -> MarketResult<Vec<CohortSizeRow>> {
            Ok(vec![CohortSizeRow {
                cohort_period: "2024-01-01".parse().unwrap(),
                cohort_size: 100,
            }])
        }

        async fn cohort_activity(
            &self,
            _granularity: CohortGranularity,
            _num_periods: u32,
        ) -> MarketResult<Vec<CohortActivityRow>> {
            Ok(vec![
                CohortActivityRow {
                    cohort_period: "2024-01-01".parse().unwrap(),
                    period_offset: 0,
                    active_users: 100,
                },
                CohortActivityRow {
                    cohort_period: "2024-01-01".parse().unwrap(),
                    period_offset: 1,
                    active_users: 35,
                },
            ])
        }

        async fn user_lifetime_values(
            &self,
            _granularity: CohortGranularity,
        ) -> MarketResult<Vec<UserLifetimeRow>> {
            Ok((1..=4)
                .map(|i| UserLifetimeRow {
                    user_id: Uuid::new_v4(),
                    cohort_period: "2024-01-01".parse().unwrap(),
                    lifetime_revenue_cents: i * 1000,
                })
                .collect())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl MarketStore for FailingStore {
        async fn daily_sales(&self, _since: NaiveDate) -> MarketResult<Vec<SalesDay>> {
            Err(MarketError::Store("connection refused".into()))
        }

        async fn developer_daily_sales(
            &self,
            _developer_id: &str,
            _since: NaiveDate,
        ) -> MarketResult<Vec<SalesDay>> {
            Err(MarketError::Store("connection refused".into()))
        }

        async fn average_order_value_cents(
            &self,
            _since: NaiveDate,
        ) -> MarketResult<Option<f64>> {
            Err(MarketError::Store("connection refused".into()))
        }

        async fn user_activity(&self) -> MarketResult<Vec<UserActivityRow>> {
            Err(MarketError::Store("connection refused".into()))
        }

        async fn weekly_category_sales(&self, _weeks: u32) -> MarketResult<Vec<CategoryWeek>> {
            Err(MarketError::Store("connection refused".into()))
        }

        async fn developer_app_days(
            &self,
            _developer_id: &str,
            _since: NaiveDate,
        ) -> MarketResult<Vec<AppDay>> {
            Err(MarketError::Store("connection refused".into()))
        }

        async fn developer_weekly_revenue(
            &self,
            _developer_id: &str,
            _weeks: u32,
        ) -> MarketResult<Vec<RevenueWeek>> {
            Err(MarketError::Store("connection refused".into()))
        }

        async fn cohort_sizes(
            &self,
            _granularity: CohortGranularity,
            _num_periods: u32,
        ) -> MarketResult<Vec<CohortSizeRow>> {
            Err(MarketError::Store("connection refused".into()))
        }

        async fn cohort_activity(
            &self,
            _granularity: CohortGranularity,
            _num_periods: u32,
        ) -> MarketResult<Vec<CohortActivityRow>> {
            Err(MarketError::Store("connection refused".into()))
        }

        async fn user_lifetime_values(
            &self,
            _granularity: CohortGranularity,
        ) -> MarketResult<Vec<UserLifetimeRow>> {
            Err(MarketError::Store("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn analysis_assembles_all_sections() {
        let engine = CohortEngine::new(Arc::new(FixtureStore));
        let analysis = engine
            .analyze(CohortGranularity::Weekly, 6)
            .await
            .unwrap();

        assert_eq!(analysis.cohorts.len(), 1);
        assert_eq!(analysis.cohorts[0].retention[&1].retention_rate, 0.35);
        assert_eq!(analysis.engagement.len(), 2);
        let ltv = analysis.ltv.unwrap();
        assert_eq!(ltv.users, 4);
        assert_eq!(ltv.mean, 2500.0);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let engine = CohortEngine::new(Arc::new(FailingStore));
        let err = engine
            .analyze(CohortGranularity::Weekly, 6)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Store(_)));
    }
}
