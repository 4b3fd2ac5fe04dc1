//! API server — HTTP routes, middleware, and the metrics exporter.

use crate::rest::{self, AppState};
use crate::swagger::ApiDoc;
use axum::routing::get;
use axum::Router;
use pulse_core::config::AppConfig;
use pulse_predictive::PredictiveEngine;
use pulse_reporting::CohortEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub struct ApiServer {
    config: Arc<AppConfig>,
    predictive: Arc<PredictiveEngine>,
    cohorts: Arc<CohortEngine>,
}

impl ApiServer {
    pub fn new(
        config: Arc<AppConfig>,
        predictive: Arc<PredictiveEngine>,
        cohorts: Arc<CohortEngine>,
    ) -> Self {
        Self {
            config,
            predictive,
            cohorts,
        }
    }

    /// Start the HTTP server (blocks until shutdown).
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            predictive: self.predictive.clone(),
            cohorts: self.cohorts.clone(),
            config: self.config.clone(),
            start_time: Instant::now(),
        };

        let app = Router::new()
            // Analytics endpoints
            .route("/v1/analytics/predictive", get(rest::handle_predictive))
            .route("/v1/analytics/cohorts", get(rest::handle_cohorts))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            // API docs
            .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::new(
            self.config.api.host.parse()?,
            self.config.api.http_port,
        );

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the Prometheus exporter on its own port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}
