use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `MARKET_PULSE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Tunables for the predictive computations, hoisted into one place so
/// they stay auditable and testable instead of living as bare literals
/// inside the models.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_horizon_days")]
    pub default_horizon_days: u32,
    #[serde(default = "default_max_horizon_days")]
    pub max_horizon_days: u32,
    /// History window fetched for the platform-wide sales forecast.
    #[serde(default = "default_sales_history_days")]
    pub sales_history_days: u32,
    /// History window fetched for a single developer's sales forecast.
    #[serde(default = "default_developer_history_days")]
    pub developer_history_days: u32,
    /// Minimum daily points for the platform-wide forecast.
    #[serde(default = "default_min_platform_history")]
    pub min_platform_history: usize,
    /// Minimum daily points for the single-developer forecast.
    #[serde(default = "default_min_developer_history")]
    pub min_developer_history: usize,
    /// Minimum weekly points for the developer revenue projection.
    #[serde(default = "default_min_revenue_weeks")]
    pub min_revenue_weeks: usize,
    /// Trailing window for the average-order-value query.
    #[serde(default = "default_aov_window_days")]
    pub aov_window_days: u32,
    /// Order value assumed when no purchase history exists, minor units.
    #[serde(default = "default_fallback_avg_order_cents")]
    pub fallback_avg_order_cents: f64,
    /// Weeks of category history fetched for market trend analysis.
    #[serde(default = "default_category_history_weeks")]
    pub category_history_weeks: u32,
    #[serde(default)]
    pub projection: ProjectionRates,
}

/// Segment-count scaling rates used by the behavior segmenter's purchase
/// and churn projections. Heuristic values without a documented business
/// rationale; changing them is a product decision, not a refactor.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionRates {
    /// Fraction of high-value users expected to purchase in a 30-day span.
    #[serde(default = "default_high_value_conversion")]
    pub high_value_conversion: f64,
    #[serde(default = "default_regular_conversion")]
    pub regular_conversion: f64,
    #[serde(default = "default_new_user_conversion")]
    pub new_user_conversion: f64,
    /// Fraction of at-risk users expected to churn in a 30-day span.
    #[serde(default = "default_churn_rate")]
    pub churn_rate: f64,
    /// Multiplier applied to the new-user segment for acquisition growth.
    #[serde(default = "default_growth_rate")]
    pub growth_rate: f64,
}

// Default functions
fn default_node_id() -> String {
    "pulse-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_database_url() -> String {
    "postgres://localhost:5432/marketpulse".to_string()
}
fn default_max_connections() -> u32 {
    16
}
fn default_connect_timeout_secs() -> u64 {
    5
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_horizon_days() -> u32 {
    30
}
fn default_max_horizon_days() -> u32 {
    365
}
fn default_sales_history_days() -> u32 {
    90
}
fn default_developer_history_days() -> u32 {
    60
}
fn default_min_platform_history() -> usize {
    7
}
fn default_min_developer_history() -> usize {
    5
}
fn default_min_revenue_weeks() -> usize {
    3
}
fn default_aov_window_days() -> u32 {
    30
}
fn default_fallback_avg_order_cents() -> f64 {
    500.0
}
fn default_category_history_weeks() -> u32 {
    8
}
fn default_high_value_conversion() -> f64 {
    0.8
}
fn default_regular_conversion() -> f64 {
    0.4
}
fn default_new_user_conversion() -> f64 {
    0.1
}
fn default_churn_rate() -> f64 {
    0.3
}
fn default_growth_rate() -> f64 {
    1.2
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_horizon_days: default_horizon_days(),
            max_horizon_days: default_max_horizon_days(),
            sales_history_days: default_sales_history_days(),
            developer_history_days: default_developer_history_days(),
            min_platform_history: default_min_platform_history(),
            min_developer_history: default_min_developer_history(),
            min_revenue_weeks: default_min_revenue_weeks(),
            aov_window_days: default_aov_window_days(),
            fallback_avg_order_cents: default_fallback_avg_order_cents(),
            category_history_weeks: default_category_history_weeks(),
            projection: ProjectionRates::default(),
        }
    }
}

impl Default for ProjectionRates {
    fn default() -> Self {
        Self {
            high_value_conversion: default_high_value_conversion(),
            regular_conversion: default_regular_conversion(),
            new_user_conversion: default_new_user_conversion(),
            churn_rate: default_churn_rate(),
            growth_rate: default_growth_rate(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            database: DatabaseConfig::default(),
            metrics: MetricsConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("MARKET_PULSE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Clamp a requested horizon to the configured bounds.
    pub fn clamp_horizon(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.analytics.default_horizon_days)
            .clamp(1, self.analytics.max_horizon_days)
    }
}
