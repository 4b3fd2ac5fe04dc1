//! OpenAPI specification and Swagger UI configuration.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MarketPulse Analytics API",
        version = "0.1.0",
        description = "Predictive analytics and cohort analysis for the app marketplace.\n\nSales forecasting, behavior segmentation, churn scoring, market trends, and retention/LTV cohort tables.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Analytics", description = "Role-gated predictive analytics and cohort analysis"),
        (name = "Operations", description = "Health, readiness, and liveness probes"),
    ),
    paths(
        // Analytics
        crate::rest::handle_predictive,
        crate::rest::handle_cohorts,
        // Operations
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        // REST error/health types
        crate::rest::ErrorResponse,
        crate::rest::HealthResponse,
        // Forecasting types
        pulse_forecast::trend::TrendModel,
        pulse_forecast::sales::ForecastPoint,
        pulse_forecast::market::CategoryGrowth,
        pulse_forecast::market::TrendDirection,
        // Segmentation types
        pulse_segmentation::behavior::SegmentName,
        pulse_segmentation::behavior::UserSegment,
        pulse_segmentation::behavior::BehaviorProjections,
        pulse_segmentation::behavior::SegmentationResult,
        pulse_segmentation::churn::RiskLevel,
        pulse_segmentation::churn::ChurnPrediction,
        pulse_segmentation::churn::ChurnReport,
        // Predictive response models
        pulse_predictive::models::SalesForecastModel,
        pulse_predictive::models::MarketTrendsModel,
        pulse_predictive::models::AppTrend,
        pulse_predictive::models::AppPerformanceModel,
        pulse_predictive::models::RevenueWeekForecast,
        pulse_predictive::models::RevenueProjectionModel,
        // Cohort types
        pulse_core::types::CohortGranularity,
        pulse_reporting::cohort::RetentionCell,
        pulse_reporting::cohort::CohortRow,
        pulse_reporting::cohort::EngagementPoint,
        pulse_reporting::ltv::LtvPercentiles,
        pulse_reporting::engine::CohortAnalysis,
    ))
)]
pub struct ApiDoc;
