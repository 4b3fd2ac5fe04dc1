//! Daily sales/revenue projection — trend line, seasonal adjustment,
//! and linear confidence decay over the forecast horizon.

use chrono::{Datelike, Duration, NaiveDate};
use pulse_core::types::SalesDay;
use pulse_core::MarketResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::seasonal::{compute_profile, DailyObservation};
use crate::trend::{fit, TimeSeriesPoint, TrendModel};

/// One projected day.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_units: f64,
    pub predicted_revenue_cents: i64,
    /// Decays linearly from ~1.0 on the first projected day to 0.5 at the
    /// end of the horizon.
    pub confidence: f64,
}

/// Outcome of a sales forecast. Too little history is a normal result,
/// not an error: sibling models must keep computing and the response
/// carries the shortfall inline.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SalesForecast {
    Projected {
        model: TrendModel,
        points: Vec<ForecastPoint>,
    },
    InsufficientData {
        required: usize,
        available: usize,
    },
}

/// Project daily unit sales and revenue `horizon_days` past the end of
/// `history`.
///
/// `history` must be sorted ascending by date with one row per day.
/// `min_history` is 7 for the platform-wide forecast and 5 for the
/// single-developer variant. Projected units below zero clamp to zero;
/// the model does not produce negative sales.
pub fn forecast_sales(
    history: &[SalesDay],
    horizon_days: u32,
    min_history: usize,
    avg_order_value_cents: f64,
) -> MarketResult<SalesForecast> {
    if history.len() < min_history {
        return Ok(SalesForecast::InsufficientData {
            required: min_history,
            available: history.len(),
        });
    }

    let points: Vec<TimeSeriesPoint> = history
        .iter()
        .enumerate()
        .map(|(x, day)| TimeSeriesPoint {
            x,
            y: day.units as f64,
        })
        .collect();
    let model = fit(&points)?;

    let observations: Vec<DailyObservation> = history
        .iter()
        .map(|day| DailyObservation {
            weekday: day.date.weekday(),
            count: day.units as f64,
        })
        .collect();
    let profile = compute_profile(&observations);

    let n = history.len();
    // History covers indices 0..n-1; future day i extrapolates at n + i.
    let last_date = history[n - 1].date;
    let horizon = horizon_days.max(1);

    let forecast = (1..=horizon)
        .map(|i| {
            let date = last_date + Duration::days(i as i64);
            let base = model.predict((n as u32 + i) as f64);
            let adjusted = (base * profile.multiplier(date.weekday())).max(0.0);
            let confidence = (1.0 - (i as f64 / horizon as f64) * 0.5).max(0.5);
            ForecastPoint {
                date,
                predicted_units: adjusted,
                predicted_revenue_cents: (adjusted * avg_order_value_cents).round() as i64,
                confidence,
            }
        })
        .collect();

    Ok(SalesForecast::Projected {
        model,
        points: forecast,
    })
}
