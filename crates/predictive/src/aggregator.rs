//! The role-gated response aggregator.
//!
//! Role and ownership checks run before any store access. After that,
//! each model computes independently: an upstream failure or a short
//! history degrades that one model to an inline error while siblings
//! keep their results.

use chrono::{Duration, Utc};
use pulse_core::config::AnalyticsConfig;
use pulse_core::types::{Identity, Role};
use pulse_core::{MarketError, MarketResult};
use pulse_forecast::market::{analyze_categories, classify_growth, market_insights};
use pulse_forecast::sales::{forecast_sales, SalesForecast};
use pulse_forecast::trend::{fit, index_series};
use pulse_segmentation::behavior::segment_users;
use pulse_segmentation::churn::score_users;
use pulse_store::MarketStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::*;

/// Weeks of revenue history fetched for the developer projection.
const REVENUE_HISTORY_WEEKS: u32 = 12;

/// Days of app event history fetched for the performance model.
const APP_HISTORY_DAYS: i64 = 30;

pub struct PredictiveEngine {
    store: Arc<dyn MarketStore>,
    config: AnalyticsConfig,
}

impl PredictiveEngine {
    pub fn new(store: Arc<dyn MarketStore>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    /// Dispatch one predictions request.
    ///
    /// Terminal branches: admins get the platform models (or a single
    /// developer's scope when they name one), developers get their own
    /// scope only, and every other role is rejected before any
    /// computation runs.
    pub async fn build_predictions(
        &self,
        identity: &Identity,
        request: &PredictiveRequest,
    ) -> MarketResult<PredictionsResponse> {
        let predictions = match (&identity.role, &request.developer_id) {
            (Role::Admin, Some(developer_id)) => Predictions::Developer(
                self.developer_predictions(developer_id, request.horizon_days)
                    .await,
            ),
            (Role::Admin, None) => Predictions::Admin(
                self.admin_predictions(request.model, request.horizon_days)
                    .await,
            ),
            (Role::Developer, requested) => {
                let developer_id = requested.as_deref().unwrap_or(identity.id.as_str());
                if developer_id != identity.id {
                    return Err(MarketError::AccessDenied(format!(
                        "developer {} may not read analytics for developer {}",
                        identity.id, developer_id
                    )));
                }
                Predictions::Developer(
                    self.developer_predictions(developer_id, request.horizon_days)
                        .await,
                )
            }
            (Role::Other(role), _) => {
                return Err(MarketError::InsufficientPermissions(format!(
                    "role '{role}' may not access predictive analytics"
                )));
            }
        };

        metrics::counter!(
            "analytics.predictions.generated",
            "role" => identity.role.as_str().to_string()
        )
        .increment(1);

        Ok(PredictionsResponse {
            success: true,
            predictions,
        })
    }

    async fn admin_predictions(
        &self,
        selector: ModelSelector,
        horizon_days: u32,
    ) -> AdminPredictions {
        let sales_forecast = if selector.includes(ModelSelector::Sales) {
            Some(degrade("sales forecast", self.sales_model(horizon_days, None).await))
        } else {
            None
        };
        let user_behavior = if selector.includes(ModelSelector::UserBehavior) {
            Some(degrade(
                "user behavior predictions",
                self.behavior_model(horizon_days).await,
            ))
        } else {
            None
        };
        let market_trends = if selector.includes(ModelSelector::MarketTrends) {
            Some(degrade("market trends", self.market_model().await))
        } else {
            None
        };
        let churn = if selector.includes(ModelSelector::Churn) {
            Some(degrade("churn predictions", self.churn_model().await))
        } else {
            None
        };

        info!(horizon_days, "Admin predictions assembled");

        AdminPredictions {
            timestamp: Utc::now(),
            horizon_days,
            sales_forecast,
            user_behavior,
            market_trends,
            churn,
        }
    }

    async fn developer_predictions(
        &self,
        developer_id: &str,
        horizon_days: u32,
    ) -> DeveloperPredictions {
        let sales_forecast = degrade(
            "sales forecast",
            self.sales_model(horizon_days, Some(developer_id)).await,
        );
        let app_performance = degrade(
            "app performance",
            self.app_performance_model(developer_id).await,
        );
        let revenue_projection = degrade(
            "revenue projection",
            self.revenue_model(developer_id, horizon_days).await,
        );

        info!(developer_id, horizon_days, "Developer predictions assembled");

        DeveloperPredictions {
            timestamp: Utc::now(),
            horizon_days,
            developer_id: developer_id.to_string(),
            sales_forecast,
            app_performance,
            revenue_projection,
        }
    }

    async fn sales_model(
        &self,
        horizon_days: u32,
        developer_id: Option<&str>,
    ) -> MarketResult<ModelOutcome<SalesForecastModel>> {
        let today = Utc::now().date_naive();

        let (history, min_points) = match developer_id {
            None => {
                let since = today - Duration::days(self.config.sales_history_days as i64);
                (
                    self.store.daily_sales(since).await?,
                    self.config.min_platform_history,
                )
            }
            Some(developer_id) => {
                let since = today - Duration::days(self.config.developer_history_days as i64);
                (
                    self.store.developer_daily_sales(developer_id, since).await?,
                    self.config.min_developer_history,
                )
            }
        };

        let aov_since = today - Duration::days(self.config.aov_window_days as i64);
        let avg_order_value_cents = self
            .store
            .average_order_value_cents(aov_since)
            .await?
            .unwrap_or(self.config.fallback_avg_order_cents);

        match forecast_sales(&history, horizon_days, min_points, avg_order_value_cents)? {
            SalesForecast::Projected { model, points } => {
                Ok(ModelOutcome::Ready(SalesForecastModel {
                    history_days: history.len(),
                    avg_order_value_cents,
                    model,
                    points,
                }))
            }
            SalesForecast::InsufficientData {
                required,
                available,
            } => Ok(ModelOutcome::Failed {
                error: format!(
                    "Insufficient historical data for sales forecast: need {required} days, have {available}"
                ),
            }),
        }
    }

    async fn behavior_model(
        &self,
        horizon_days: u32,
    ) -> MarketResult<ModelOutcome<pulse_segmentation::behavior::SegmentationResult>> {
        let users = self.store.user_activity().await?;
        Ok(ModelOutcome::Ready(segment_users(
            &users,
            horizon_days,
            &self.config.projection,
            Utc::now(),
        )))
    }

    async fn market_model(&self) -> MarketResult<ModelOutcome<MarketTrendsModel>> {
        let rows = self
            .store
            .weekly_category_sales(self.config.category_history_weeks)
            .await?;
        let categories = analyze_categories(&rows);
        let insights = market_insights(&categories);
        Ok(ModelOutcome::Ready(MarketTrendsModel {
            categories,
            insights,
        }))
    }

    async fn churn_model(
        &self,
    ) -> MarketResult<ModelOutcome<pulse_segmentation::churn::ChurnReport>> {
        let users = self.store.user_activity().await?;
        Ok(ModelOutcome::Ready(score_users(&users, Utc::now())))
    }

    async fn app_performance_model(
        &self,
        developer_id: &str,
    ) -> MarketResult<ModelOutcome<AppPerformanceModel>> {
        let since = Utc::now().date_naive() - Duration::days(APP_HISTORY_DAYS);
        let rows = self.store.developer_app_days(developer_id, since).await?;

        let mut by_app: BTreeMap<Uuid, Vec<&pulse_core::types::AppDay>> = BTreeMap::new();
        for row in &rows {
            by_app.entry(row.app_id).or_default().push(row);
        }

        let mut apps = Vec::with_capacity(by_app.len());
        for (app_id, mut days) in by_app {
            days.sort_by_key(|d| d.date);

            let total_downloads: i64 = days.iter().map(|d| d.downloads).sum();
            let total_sessions: i64 = days.iter().map(|d| d.sessions).sum();
            let avg_daily_downloads = total_downloads as f64 / days.len() as f64;

            // Direction: fitted daily slope as a percentage of the mean,
            // classified with the market-trend thresholds.
            let trend = if days.len() >= 2 && avg_daily_downloads > 0.0 {
                let series = index_series(days.iter().map(|d| d.downloads as f64));
                let model = fit(&series)?;
                classify_growth(model.slope / avg_daily_downloads * 100.0)
            } else {
                pulse_forecast::market::TrendDirection::Stable
            };

            apps.push(AppTrend {
                app_id,
                app_name: days[0].app_name.clone(),
                days_tracked: days.len(),
                total_downloads,
                avg_daily_downloads,
                total_sessions,
                trend,
            });
        }

        Ok(ModelOutcome::Ready(AppPerformanceModel { apps }))
    }

    async fn revenue_model(
        &self,
        developer_id: &str,
        horizon_days: u32,
    ) -> MarketResult<ModelOutcome<RevenueProjectionModel>> {
        let weeks = self
            .store
            .developer_weekly_revenue(developer_id, REVENUE_HISTORY_WEEKS)
            .await?;

        if weeks.len() < self.config.min_revenue_weeks {
            return Ok(ModelOutcome::Failed {
                error: format!(
                    "Insufficient historical data for revenue projection: need {} weeks, have {}",
                    self.config.min_revenue_weeks,
                    weeks.len()
                ),
            });
        }

        let series = index_series(weeks.iter().map(|w| w.revenue_cents as f64));
        let model = fit(&series)?;

        let n = weeks.len();
        let last_week = weeks[n - 1].week_start;
        let horizon_weeks = horizon_days.div_ceil(7).max(1);

        let projected = (1..=horizon_weeks)
            .map(|i| RevenueWeekForecast {
                week_start: last_week + Duration::weeks(i as i64),
                projected_revenue_cents: model.predict((n as u32 + i) as f64).max(0.0).round()
                    as i64,
                confidence: (1.0 - (i as f64 / horizon_weeks as f64) * 0.5).max(0.5),
            })
            .collect();

        Ok(ModelOutcome::Ready(RevenueProjectionModel {
            history_weeks: n,
            model,
            weeks: projected,
        }))
    }
}

/// Trap a model failure: log it, count it, and surface it as that
/// model's inline error without touching its siblings.
fn degrade<T>(model: &'static str, result: MarketResult<ModelOutcome<T>>) -> ModelOutcome<T> {
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(model, error = %e, "Model computation failed");
            metrics::counter!("analytics.model_failures", "model" => model).increment(1);
            ModelOutcome::Failed {
                error: format!("Failed to generate {model}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pulse_core::types::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Spy store: every query bumps the counter and fails. Role-gating
    /// tests assert the counter stays at zero.
    #[derive(Default)]
    struct SpyStore {
        calls: AtomicUsize,
    }

    impl SpyStore {
        fn record<T>(&self) -> MarketResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(MarketError::Store("spy store has no data".into()))
        }
    }

    #[async_trait]
    impl MarketStore for SpyStore {
        async fn daily_sales(&self, _since: NaiveDate) -> MarketResult<Vec<SalesDay>> {
            self.record()
        }
        async fn developer_daily_sales(
            &self,
            _developer_id: &str,
            _since: NaiveDate,
        ) -> MarketResult<Vec<SalesDay>> {
            self.record()
        }
        async fn average_order_value_cents(
            &self,
            _since: NaiveDate,
        ) -> MarketResult<Option<f64>> {
            self.record()
        }
        async fn user_activity(&self) -> MarketResult<Vec<UserActivityRow>> {
            self.record()
        }
        async fn weekly_category_sales(&self, _weeks: u32) -> MarketResult<Vec<CategoryWeek>> {
            self.record()
        }
        async fn developer_app_days(
            &self,
            _developer_id: &str,
            _since: NaiveDate,
        ) -> MarketResult<Vec<AppDay>> {
            self.record()
        }
        async fn developer_weekly_revenue(
            &self,
            _developer_id: &str,
            _weeks: u32,
        ) -> MarketResult<Vec<RevenueWeek>> {
            self.record()
        }
        async fn cohort_sizes(
            &self,
            _granularity: CohortGranularity,
            _num_periods: u32,
        ) -> MarketResult<Vec<CohortSizeRow>> {
            self.record()
        }
        async fn cohort_activity(
            &self,
            _granularity: CohortGranularity,
            _num_periods: u32,
        ) -> MarketResult<Vec<CohortActivityRow>> {
            self.record()
        }
        async fn user_lifetime_values(
            &self,
            _granularity: CohortGranularity,
        ) -> MarketResult<Vec<UserLifetimeRow>> {
            self.record()
        }
    }

    fn engine_with_spy() -> (Arc<SpyStore>, PredictiveEngine) {
        let store = Arc::new(SpyStore::default());
        let engine = PredictiveEngine::new(store.clone(), AnalyticsConfig::default());
        (store, engine)
    }

    fn request() -> PredictiveRequest {
        PredictiveRequest {
            model: ModelSelector::All,
            horizon_days: 30,
            developer_id: None,
        }
    }

    #[tokio::test]
    async fn unknown_role_is_rejected_before_any_store_call() {
        let (store, engine) = engine_with_spy();
        let identity = Identity {
            id: "user-1".into(),
            role: Role::Other("tester".into()),
        };

        let err = engine
            .build_predictions(&identity, &request())
            .await
            .unwrap_err();

        assert!(matches!(err, MarketError::InsufficientPermissions(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn developer_cannot_read_another_developers_scope() {
        let (store, engine) = engine_with_spy();
        let identity = Identity {
            id: "dev-a".into(),
            role: Role::Developer,
        };
        let mut req = request();
        req.developer_id = Some("dev-b".into());

        let err = engine.build_predictions(&identity, &req).await.unwrap_err();

        assert!(matches!(err, MarketError::AccessDenied(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn developer_defaults_to_own_scope() {
        let (_store, engine) = engine_with_spy();
        let identity = Identity {
            id: "dev-a".into(),
            role: Role::Developer,
        };

        // All models degrade against the failing spy, but the request
        // itself succeeds and stays scoped to dev-a.
        let response = engine
            .build_predictions(&identity, &request())
            .await
            .unwrap();
        assert!(response.success);
        match response.predictions {
            Predictions::Developer(dev) => {
                assert_eq!(dev.developer_id, "dev-a");
                assert!(dev.sales_forecast.is_failed());
                assert!(dev.app_performance.is_failed());
                assert!(dev.revenue_projection.is_failed());
            }
            Predictions::Admin(_) => panic!("expected developer scope"),
        }
    }

    #[tokio::test]
    async fn admin_request_survives_total_store_failure() {
        let (_store, engine) = engine_with_spy();
        let identity = Identity {
            id: "admin-1".into(),
            role: Role::Admin,
        };

        let response = engine
            .build_predictions(&identity, &request())
            .await
            .unwrap();

        assert!(response.success);
        match response.predictions {
            Predictions::Admin(admin) => {
                assert!(admin.sales_forecast.unwrap().is_failed());
                assert!(admin.user_behavior.unwrap().is_failed());
                assert!(admin.market_trends.unwrap().is_failed());
                assert!(admin.churn.unwrap().is_failed());
            }
            Predictions::Developer(_) => panic!("expected admin scope"),
        }
    }

    #[tokio::test]
    async fn single_model_selector_omits_siblings() {
        let (store, engine) = engine_with_spy();
        let identity = Identity {
            id: "admin-1".into(),
            role: Role::Admin,
        };
        let mut req = request();
        req.model = ModelSelector::MarketTrends;

        let response = engine.build_predictions(&identity, &req).await.unwrap();

        match response.predictions {
            Predictions::Admin(admin) => {
                assert!(admin.sales_forecast.is_none());
                assert!(admin.user_behavior.is_none());
                assert!(admin.market_trends.is_some());
                assert!(admin.churn.is_none());
            }
            Predictions::Developer(_) => panic!("expected admin scope"),
        }
        // Only the category query ran.
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn admin_can_enter_developer_scope() {
        let (_store, engine) = engine_with_spy();
        let identity = Identity {
            id: "admin-1".into(),
            role: Role::Admin,
        };
        let mut req = request();
        req.developer_id = Some("dev-b".into());

        let response = engine.build_predictions(&identity, &req).await.unwrap();
        match response.predictions {
            Predictions::Developer(dev) => assert_eq!(dev.developer_id, "dev-b"),
            Predictions::Admin(_) => panic!("expected developer scope"),
        }
    }
}
