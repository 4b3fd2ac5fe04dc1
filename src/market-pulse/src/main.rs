//! MarketPulse — predictive analytics service for the app marketplace.
//!
//! Main entry point: loads configuration, connects the store, and starts
//! the API server.

use clap::Parser;
use pulse_api::ApiServer;
use pulse_core::config::AppConfig;
use pulse_predictive::PredictiveEngine;
use pulse_reporting::CohortEngine;
use pulse_store::{MarketStore, PgMarketStore};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "market-pulse")]
#[command(about = "Predictive analytics service for the app marketplace")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "MARKET_PULSE__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "MARKET_PULSE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Postgres connection URL (overrides config)
    #[arg(long, env = "MARKET_PULSE__DATABASE__URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_pulse=info,pulse_api=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("MarketPulse starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        "Configuration loaded"
    );

    // Connect the read-only store
    let store: Arc<dyn MarketStore> = Arc::new(
        PgMarketStore::connect(&config.database).await.map_err(|e| {
            error!(error = %e, "Failed to connect to Postgres");
            anyhow::anyhow!("Postgres connection required: {e}")
        })?,
    );

    let config = Arc::new(config);
    let predictive = Arc::new(PredictiveEngine::new(
        store.clone(),
        config.analytics.clone(),
    ));
    let cohorts = Arc::new(CohortEngine::new(store));

    let api_server = ApiServer::new(config, predictive, cohorts);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("MarketPulse is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
