//! Statistical forecasting primitives — trend fitting, seasonal
//! adjustment, sales projection, and category growth analysis.

pub mod market;
pub mod sales;
pub mod seasonal;
pub mod trend;

pub use market::{analyze_categories, market_insights, CategoryGrowth, TrendDirection};
pub use sales::{forecast_sales, ForecastPoint, SalesForecast};
pub use seasonal::{compute_profile, DailyObservation, SeasonalProfile};
pub use trend::{fit, TimeSeriesPoint, TrendModel};
