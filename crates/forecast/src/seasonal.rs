//! Day-of-week seasonal adjustment derived from historical mean deviation.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single historical observation tagged with its day of week.
#[derive(Debug, Clone, Copy)]
pub struct DailyObservation {
    pub weekday: Weekday,
    pub count: f64,
}

/// Per-day-of-week multipliers: `mean(day) / mean(all days)`. Days with
/// no historical observations are absent from the map and read as 1.0.
/// Keys are 0–6, Sunday-based, matching the wire format the dashboard
/// consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonalProfile {
    multipliers: HashMap<u32, f64>,
}

impl SeasonalProfile {
    /// Multiplier for a weekday; 1.0 when the day was never observed.
    pub fn multiplier(&self, weekday: Weekday) -> f64 {
        self.multipliers
            .get(&weekday.num_days_from_sunday())
            .copied()
            .unwrap_or(1.0)
    }

    pub fn is_empty(&self) -> bool {
        self.multipliers.is_empty()
    }
}

/// Compute the seasonal profile from historical daily observations.
/// A zero overall mean (no sales at all) yields an empty profile so the
/// forecaster falls through to unadjusted trend values.
pub fn compute_profile(daily: &[DailyObservation]) -> SeasonalProfile {
    if daily.is_empty() {
        return SeasonalProfile::default();
    }

    let overall_mean = daily.iter().map(|d| d.count).sum::<f64>() / daily.len() as f64;
    if overall_mean <= 0.0 {
        return SeasonalProfile::default();
    }

    let mut sums: HashMap<u32, (f64, u32)> = HashMap::new();
    for observation in daily {
        let entry = sums
            .entry(observation.weekday.num_days_from_sunday())
            .or_insert((0.0, 0));
        entry.0 += observation.count;
        entry.1 += 1;
    }

    let multipliers = sums
        .into_iter()
        .map(|(day, (sum, count))| (day, (sum / count as f64) / overall_mean))
        .collect();

    SeasonalProfile { multipliers }
}
