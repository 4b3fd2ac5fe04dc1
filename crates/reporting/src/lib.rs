//! Cohort analysis — retention tables, LTV percentiles, and engagement
//! aggregates over store-fetched cohort rows.

pub mod cohort;
pub mod engine;
pub mod ltv;

pub use cohort::{build_retention, engagement_curve, CohortRow, EngagementPoint, RetentionCell};
pub use engine::{CohortAnalysis, CohortEngine};
pub use ltv::{ltv_percentiles, LtvPercentiles};
