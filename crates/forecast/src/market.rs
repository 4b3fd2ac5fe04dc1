//! Category growth analysis — recent four weeks against the four before,
//! with narrative insight generation for the dashboard.

use pulse_core::types::CategoryWeek;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Growth threshold in percent; strictly above is growing, strictly
/// below the negation is declining.
const GROWTH_THRESHOLD_PCT: f64 = 5.0;

/// Weeks in each comparison window.
const COMPARISON_WINDOW_WEEKS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Growing,
    Stable,
    Declining,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryGrowth {
    pub category: String,
    pub growth_rate_pct: f64,
    pub trend: TrendDirection,
    pub recent_weekly_avg: f64,
    pub prior_weekly_avg: f64,
}

/// Classify a growth percentage. The comparisons are strict: exactly
/// ±5.0% reads as stable.
pub fn classify_growth(growth_rate_pct: f64) -> TrendDirection {
    if growth_rate_pct > GROWTH_THRESHOLD_PCT {
        TrendDirection::Growing
    } else if growth_rate_pct < -GROWTH_THRESHOLD_PCT {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Compute per-category growth from weekly sales rows.
///
/// Categories with fewer than two weekly points are omitted (no error).
/// A category with no volume in the prior window reports 0% growth
/// rather than dividing by zero.
pub fn analyze_categories(rows: &[CategoryWeek]) -> Vec<CategoryGrowth> {
    let mut by_category: BTreeMap<&str, Vec<&CategoryWeek>> = BTreeMap::new();
    for row in rows {
        by_category.entry(&row.category).or_default().push(row);
    }

    by_category
        .into_iter()
        .filter_map(|(category, mut weeks)| {
            if weeks.len() < 2 {
                return None;
            }
            weeks.sort_by_key(|w| w.week_start);

            let recent_start = weeks.len().saturating_sub(COMPARISON_WINDOW_WEEKS);
            let older_start = recent_start.saturating_sub(COMPARISON_WINDOW_WEEKS);

            let recent = &weeks[recent_start..];
            let older = &weeks[older_start..recent_start];

            let recent_avg =
                recent.iter().map(|w| w.units as f64).sum::<f64>() / recent.len() as f64;
            let older_avg = if older.is_empty() {
                0.0
            } else {
                older.iter().map(|w| w.units as f64).sum::<f64>() / older.len() as f64
            };

            let growth_rate_pct = if older_avg > 0.0 {
                (recent_avg - older_avg) / older_avg * 100.0
            } else {
                0.0
            };

            Some(CategoryGrowth {
                category: category.to_string(),
                growth_rate_pct,
                trend: classify_growth(growth_rate_pct),
                recent_weekly_avg: recent_avg,
                prior_weekly_avg: older_avg,
            })
        })
        .collect()
}

/// Narrative insight strings for the dashboard's market trends panel.
pub fn market_insights(growth: &[CategoryGrowth]) -> Vec<String> {
    let mut insights = Vec::new();

    let fastest = growth
        .iter()
        .filter(|g| g.trend == TrendDirection::Growing)
        .max_by(|a, b| a.growth_rate_pct.total_cmp(&b.growth_rate_pct));
    if let Some(g) = fastest {
        insights.push(format!(
            "{} is the fastest-growing category at {:.1}% week over week.",
            g.category, g.growth_rate_pct
        ));
    }

    let declining: Vec<&str> = growth
        .iter()
        .filter(|g| g.trend == TrendDirection::Declining)
        .map(|g| g.category.as_str())
        .collect();
    if !declining.is_empty() {
        insights.push(format!(
            "Demand is contracting in {}. Consider promotional placement.",
            declining.join(", ")
        ));
    }

    if insights.is_empty() && !growth.is_empty() {
        insights.push("Category demand is stable across the marketplace.".to_string());
    }

    insights
}
