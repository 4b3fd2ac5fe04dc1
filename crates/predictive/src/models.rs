//! Request and response shapes for the predictive endpoint.

use chrono::{DateTime, NaiveDate, Utc};
use pulse_forecast::market::{CategoryGrowth, TrendDirection};
use pulse_forecast::sales::ForecastPoint;
use pulse_forecast::trend::TrendModel;
use pulse_segmentation::behavior::SegmentationResult;
use pulse_segmentation::churn::ChurnReport;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Which model family the caller wants. `all` fans out to every model
/// the caller's role is entitled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModelSelector {
    All,
    Sales,
    UserBehavior,
    MarketTrends,
    Churn,
}

impl ModelSelector {
    pub fn includes(self, model: ModelSelector) -> bool {
        self == ModelSelector::All || self == model
    }
}

/// Resolved request parameters: the API layer applies defaults and
/// horizon clamping before the engine sees them.
#[derive(Debug, Clone)]
pub struct PredictiveRequest {
    pub model: ModelSelector,
    pub horizon_days: u32,
    pub developer_id: Option<String>,
}

/// A model's slot in the response: its payload, or an inline error when
/// that one computation failed or had too little history.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ModelOutcome<T> {
    Ready(T),
    Failed { error: String },
}

impl<T> ModelOutcome<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, ModelOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SalesForecastModel {
    pub history_days: usize,
    pub avg_order_value_cents: f64,
    pub model: TrendModel,
    pub points: Vec<ForecastPoint>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MarketTrendsModel {
    pub categories: Vec<CategoryGrowth>,
    pub insights: Vec<String>,
}

/// Per-app download trend for the developer dashboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AppTrend {
    pub app_id: Uuid,
    pub app_name: String,
    pub days_tracked: usize,
    pub total_downloads: i64,
    pub avg_daily_downloads: f64,
    pub total_sessions: i64,
    pub trend: TrendDirection,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AppPerformanceModel {
    pub apps: Vec<AppTrend>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevenueWeekForecast {
    pub week_start: NaiveDate,
    pub projected_revenue_cents: i64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevenueProjectionModel {
    pub history_weeks: usize,
    pub model: TrendModel,
    pub weeks: Vec<RevenueWeekForecast>,
}

/// Admin-scope payload. Fields absent when the selector excluded them.
#[derive(Debug, Clone, Serialize)]
pub struct AdminPredictions {
    pub timestamp: DateTime<Utc>,
    pub horizon_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_forecast: Option<ModelOutcome<SalesForecastModel>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_behavior: Option<ModelOutcome<SegmentationResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_trends: Option<ModelOutcome<MarketTrendsModel>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub churn: Option<ModelOutcome<ChurnReport>>,
}

/// Developer-scope payload, always all three models.
#[derive(Debug, Clone, Serialize)]
pub struct DeveloperPredictions {
    pub timestamp: DateTime<Utc>,
    pub horizon_days: u32,
    pub developer_id: String,
    pub sales_forecast: ModelOutcome<SalesForecastModel>,
    pub app_performance: ModelOutcome<AppPerformanceModel>,
    pub revenue_projection: ModelOutcome<RevenueProjectionModel>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Predictions {
    Admin(AdminPredictions),
    Developer(DeveloperPredictions),
}

/// Top-level envelope: always `success: true` once role checks pass,
/// even when every individual model degraded to an inline error.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionsResponse {
    pub success: bool,
    pub predictions: Predictions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_all_includes_everything() {
        assert!(ModelSelector::All.includes(ModelSelector::Sales));
        assert!(ModelSelector::All.includes(ModelSelector::Churn));
        assert!(ModelSelector::Sales.includes(ModelSelector::Sales));
        assert!(!ModelSelector::Sales.includes(ModelSelector::Churn));
    }

    #[test]
    fn failed_outcome_serializes_as_inline_error() {
        let outcome: ModelOutcome<MarketTrendsModel> = ModelOutcome::Failed {
            error: "Failed to generate market trends".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["error"], "Failed to generate market trends");
    }

    #[test]
    fn selector_parses_snake_case() {
        let selector: ModelSelector = serde_json::from_str("\"user_behavior\"").unwrap();
        assert_eq!(selector, ModelSelector::UserBehavior);
        assert!(serde_json::from_str::<ModelSelector>("\"bogus\"").is_err());
    }
}
