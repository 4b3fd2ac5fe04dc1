//! Ordinary least-squares trend estimation over an indexed series.

use pulse_core::{MarketError, MarketResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single observation in a zero-indexed time series. The index covers
/// contiguous calendar days or weeks, sorted ascending by date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub x: usize,
    pub y: f64,
}

/// Closed-form OLS fit. `r_squared` is deliberately not clamped; a
/// pathological fit can push it negative and callers read that as "no
/// explanatory power".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct TrendModel {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl TrendModel {
    /// Trend-line value at index `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Build an indexed series from raw values, preserving input order.
pub fn index_series(values: impl IntoIterator<Item = f64>) -> Vec<TimeSeriesPoint> {
    values
        .into_iter()
        .enumerate()
        .map(|(x, y)| TimeSeriesPoint { x, y })
        .collect()
}

/// Fit a least-squares line through the series.
///
/// With contiguous integer indices the denominator `n·Σx² − (Σx)²` can
/// only vanish for an empty or single-point series, but a zero
/// denominator must never reach the division: the fit fails loud with
/// `DegenerateInput` instead of producing NaN or infinity.
pub fn fit(points: &[TimeSeriesPoint]) -> MarketResult<TrendModel> {
    let n = points.len() as f64;

    let sum_x: f64 = points.iter().map(|p| p.x as f64).sum();
    let sum_y: f64 = points.iter().map(|p| p.y).sum();
    let sum_xy: f64 = points.iter().map(|p| p.x as f64 * p.y).sum();
    let sum_x2: f64 = points.iter().map(|p| (p.x as f64) * (p.x as f64)).sum();

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return Err(MarketError::DegenerateInput(format!(
            "regression denominator is zero over {} point(s)",
            points.len()
        )));
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    let mean_y = sum_y / n;
    let ss_res: f64 = points
        .iter()
        .map(|p| {
            let predicted = slope * p.x as f64 + intercept;
            (p.y - predicted) * (p.y - predicted)
        })
        .sum();
    let ss_tot: f64 = points.iter().map(|p| (p.y - mean_y) * (p.y - mean_y)).sum();

    // Constant series: r² is undefined. A fit that also reproduces the
    // constant is treated as perfect, anything else as worthless.
    let r_squared = if ss_tot.abs() < f64::EPSILON {
        if ss_res.abs() < 1e-9 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    };

    Ok(TrendModel {
        slope,
        intercept,
        r_squared,
    })
}
