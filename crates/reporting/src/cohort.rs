//! Retention table construction from cohort size and activity rows.

use chrono::NaiveDate;
use pulse_core::types::{CohortActivityRow, CohortSizeRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Retention of one cohort at one elapsed period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct RetentionCell {
    /// Fraction of the cohort active in this period, in [0, 1].
    pub retention_rate: f64,
    pub users: i64,
}

/// One row of the retention table: a cohort and its per-period retention.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CohortRow {
    pub cohort_period: NaiveDate,
    pub cohort_size: i64,
    pub retention: BTreeMap<u32, RetentionCell>,
}

/// Engagement across all cohorts at one elapsed period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct EngagementPoint {
    pub period_offset: u32,
    pub active_users: i64,
    /// Active users over total cohort membership at this offset.
    pub engagement_rate: f64,
}

/// Join size and activity rows into retention table rows, ordered by
/// cohort start. Activity referencing an unknown cohort is dropped;
/// an empty cohort yields a zero rate rather than a division by zero.
pub fn build_retention(
    sizes: &[CohortSizeRow],
    activity: &[CohortActivityRow],
) -> Vec<CohortRow> {
    let mut rows: BTreeMap<NaiveDate, CohortRow> = sizes
        .iter()
        .map(|s| {
            (
                s.cohort_period,
                CohortRow {
                    cohort_period: s.cohort_period,
                    cohort_size: s.cohort_size,
                    retention: BTreeMap::new(),
                },
            )
        })
        .collect();

    for cell in activity {
        let Some(row) = rows.get_mut(&cell.cohort_period) else {
            continue;
        };
        let retention_rate = if row.cohort_size > 0 {
            cell.active_users as f64 / row.cohort_size as f64
        } else {
            0.0
        };
        row.retention.insert(
            cell.period_offset,
            RetentionCell {
                retention_rate,
                users: cell.active_users,
            },
        );
    }

    rows.into_values().collect()
}

/// Collapse the retention table into a per-offset engagement curve:
/// total active users over total cohort membership, per elapsed period.
pub fn engagement_curve(rows: &[CohortRow]) -> Vec<EngagementPoint> {
    let mut totals: BTreeMap<u32, (i64, i64)> = BTreeMap::new();
    for row in rows {
        for (&offset, cell) in &row.retention {
            let entry = totals.entry(offset).or_insert((0, 0));
            entry.0 += cell.users;
            entry.1 += row.cohort_size;
        }
    }

    totals
        .into_iter()
        .map(|(period_offset, (active, size))| EngagementPoint {
            period_offset,
            active_users: active,
            engagement_rate: if size > 0 {
                active as f64 / size as f64
            } else {
                0.0
            },
        })
        .collect()
}
