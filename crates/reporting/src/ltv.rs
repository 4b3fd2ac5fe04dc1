//! Lifetime-value percentile aggregation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Nearest-rank percentiles over per-user lifetime revenue, minor units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct LtvPercentiles {
    pub p25: i64,
    pub p50: i64,
    pub p75: i64,
    pub p90: i64,
    pub mean: f64,
    pub users: u64,
}

/// Compute LTV percentiles. Returns `None` for an empty population —
/// the response simply omits the block rather than inventing zeros.
pub fn ltv_percentiles(values: &[i64]) -> Option<LtvPercentiles> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let pick = |p: f64| {
        let rank = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
        sorted[rank]
    };

    Some(LtvPercentiles {
        p25: pick(25.0),
        p50: pick(50.0),
        p75: pick(75.0),
        p90: pick(90.0),
        mean: sorted.iter().sum::<i64>() as f64 / sorted.len() as f64,
        users: sorted.len() as u64,
    })
}
