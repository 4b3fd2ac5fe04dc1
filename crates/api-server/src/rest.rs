//! REST API handlers for the analytics endpoints and operational probes.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use pulse_core::config::AppConfig;
use pulse_core::types::{CohortGranularity, Identity, Role};
use pulse_core::MarketError;
use pulse_predictive::{ModelSelector, PredictionsResponse, PredictiveEngine, PredictiveRequest};
use pulse_reporting::{CohortAnalysis, CohortEngine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};
use utoipa::ToSchema;

/// Upper bound on the cohort table width a single request may ask for.
const MAX_COHORT_PERIODS: u32 = 52;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub predictive: Arc<PredictiveEngine>,
    pub cohorts: Arc<CohortEngine>,
    pub config: Arc<AppConfig>,
    pub start_time: Instant,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
}

/// Resolve the caller identity forwarded by the upstream auth gateway.
/// Identity is resolved there; this service trusts the headers.
fn identity_from_headers(
    headers: &HeaderMap,
) -> Result<Identity, (StatusCode, Json<ErrorResponse>)> {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };

    match (get("x-user-id"), get("x-user-role")) {
        (Some(id), Some(role)) => Ok(Identity {
            id: id.to_string(),
            role: Role::parse(role),
        }),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "missing caller identity headers".to_string(),
            }),
        )),
    }
}

fn map_market_error(e: MarketError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        MarketError::AccessDenied(_) | MarketError::InsufficientPermissions(_) => {
            StatusCode::FORBIDDEN
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %e, "Request failed before model dispatch");
    } else {
        warn!(error = %e, "Request rejected");
    }
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct PredictiveParams {
    pub model: Option<ModelSelector>,
    pub horizon: Option<u32>,
    pub developer_id: Option<String>,
}

/// GET /v1/analytics/predictive — role-gated predictive analytics.
#[utoipa::path(
    get,
    path = "/v1/analytics/predictive",
    tag = "Analytics",
    params(
        ("model" = Option<String>, Query, description = "all | sales | user_behavior | market_trends | churn"),
        ("horizon" = Option<u32>, Query, description = "Forecast horizon in days, default 30"),
        ("developer_id" = Option<String>, Query, description = "Developer scope; admins may name any developer"),
    ),
    responses(
        (status = 200, description = "Predictions, possibly with per-model inline errors"),
        (status = 401, description = "Missing identity headers", body = ErrorResponse),
        (status = 403, description = "Role or ownership check failed", body = ErrorResponse),
        (status = 500, description = "Hard failure before model dispatch", body = ErrorResponse),
    )
)]
pub async fn handle_predictive(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PredictiveParams>,
) -> Result<Json<PredictionsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let identity = identity_from_headers(&headers)?;

    let request = PredictiveRequest {
        model: params.model.unwrap_or(ModelSelector::All),
        horizon_days: state.config.clamp_horizon(params.horizon),
        developer_id: params.developer_id,
    };

    metrics::counter!(
        "api.predictive.requests",
        "role" => identity.role.as_str().to_string()
    )
    .increment(1);

    state
        .predictive
        .build_predictions(&identity, &request)
        .await
        .map(Json)
        .map_err(map_market_error)
}

#[derive(Debug, Deserialize)]
pub struct CohortParams {
    pub period: Option<CohortGranularity>,
    pub periods: Option<u32>,
}

/// GET /v1/analytics/cohorts — retention, LTV, and engagement (admin).
#[utoipa::path(
    get,
    path = "/v1/analytics/cohorts",
    tag = "Analytics",
    params(
        ("period" = Option<String>, Query, description = "daily | weekly | monthly, default weekly"),
        ("periods" = Option<u32>, Query, description = "Number of cohorts to report, default 6"),
    ),
    responses(
        (status = 200, description = "Cohort analysis", body = CohortAnalysis),
        (status = 401, description = "Missing identity headers", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse),
    )
)]
pub async fn handle_cohorts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CohortParams>,
) -> Result<Json<CohortAnalysis>, (StatusCode, Json<ErrorResponse>)> {
    let identity = identity_from_headers(&headers)?;
    if identity.role != Role::Admin {
        return Err(map_market_error(MarketError::InsufficientPermissions(
            format!("role '{}' may not access cohort analysis", identity.role),
        )));
    }

    let granularity = params.period.unwrap_or(CohortGranularity::Weekly);
    let periods = params.periods.unwrap_or(6).clamp(1, MAX_COHORT_PERIODS);

    metrics::counter!("api.cohorts.requests").increment(1);

    state
        .cohorts
        .analyze(granularity, periods)
        .await
        .map(Json)
        .map_err(map_market_error)
}

/// GET /health — Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses((status = 200, description = "Service health", body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.config.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe for Kubernetes.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Operations",
    responses((status = 200, description = "Ready to accept traffic"))
)]
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — Liveness probe for Kubernetes.
#[utoipa::path(
    get,
    path = "/live",
    tag = "Operations",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
