//! Postgres-backed `MarketStore` — parameterized read-only aggregation
//! queries with explicit row mapping.

use async_trait::async_trait;
use chrono::NaiveDate;
use pulse_core::config::DatabaseConfig;
use pulse_core::types::{
    AppDay, CategoryWeek, CohortActivityRow, CohortGranularity, CohortSizeRow, RevenueWeek,
    SalesDay, UserActivityRow, UserLifetimeRow,
};
use pulse_core::{MarketError, MarketResult};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use tracing::info;

use crate::MarketStore;

pub struct PgMarketStore {
    pool: PgPool,
}

fn db_err(e: sqlx::Error) -> MarketError {
    MarketError::Store(e.to_string())
}

impl PgMarketStore {
    /// Connect a pool against the configured database.
    pub async fn connect(config: &DatabaseConfig) -> MarketResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(db_err)?;

        info!(max_connections = config.max_connections, "Postgres pool ready");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sales_day(row: &PgRow) -> MarketResult<SalesDay> {
    Ok(SalesDay {
        date: row.try_get("date").map_err(db_err)?,
        units: row.try_get("units").map_err(db_err)?,
        revenue_cents: row.try_get("revenue_cents").map_err(db_err)?,
    })
}

#[async_trait]
impl MarketStore for PgMarketStore {
    async fn daily_sales(&self, since: NaiveDate) -> MarketResult<Vec<SalesDay>> {
        let rows = sqlx::query(
            r"
            SELECT p.created_at::date AS date,
                   COUNT(*)::bigint AS units,
                   COALESCE(SUM(p.amount_cents), 0)::bigint AS revenue_cents
            FROM purchases p
            WHERE p.created_at >= $1
            GROUP BY p.created_at::date
            ORDER BY date
            ",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_sales_day).collect()
    }

    async fn developer_daily_sales(
        &self,
        developer_id: &str,
        since: NaiveDate,
    ) -> MarketResult<Vec<SalesDay>> {
        let rows = sqlx::query(
            r"
            SELECT p.created_at::date AS date,
                   COUNT(*)::bigint AS units,
                   COALESCE(SUM(p.amount_cents), 0)::bigint AS revenue_cents
            FROM purchases p
            JOIN apps a ON a.id = p.app_id
            WHERE a.developer_id = $1::uuid
              AND p.created_at >= $2
            GROUP BY p.created_at::date
            ORDER BY date
            ",
        )
        .bind(developer_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_sales_day).collect()
    }

    async fn average_order_value_cents(&self, since: NaiveDate) -> MarketResult<Option<f64>> {
        let row = sqlx::query(
            r"
            SELECT AVG(p.amount_cents)::double precision AS avg_order_value_cents
            FROM purchases p
            WHERE p.created_at >= $1
            ",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row.try_get("avg_order_value_cents").map_err(db_err)
    }

    async fn user_activity(&self) -> MarketResult<Vec<UserActivityRow>> {
        let rows = sqlx::query(
            r"
            SELECT u.id AS user_id,
                   u.created_at AS registered_at,
                   (SELECT COUNT(*) FROM purchases p
                     WHERE p.user_id = u.id)::bigint AS total_purchases,
                   COALESCE((SELECT AVG(p.amount_cents) FROM purchases p
                     WHERE p.user_id = u.id
                       AND p.created_at >= now() - interval '30 days'),
                     0)::double precision AS avg_recent_spend_cents,
                   (SELECT COUNT(*) FROM user_events e
                     WHERE e.user_id = u.id)::bigint AS activity_count,
                   (SELECT MAX(e.created_at) FROM user_events e
                     WHERE e.user_id = u.id) AS last_activity
            FROM users u
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(UserActivityRow {
                    user_id: row.try_get("user_id").map_err(db_err)?,
                    registered_at: row.try_get("registered_at").map_err(db_err)?,
                    total_purchases: row.try_get("total_purchases").map_err(db_err)?,
                    avg_recent_spend_cents: row
                        .try_get("avg_recent_spend_cents")
                        .map_err(db_err)?,
                    activity_count: row.try_get("activity_count").map_err(db_err)?,
                    last_activity: row.try_get("last_activity").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn weekly_category_sales(&self, weeks: u32) -> MarketResult<Vec<CategoryWeek>> {
        let rows = sqlx::query(
            r"
            SELECT a.category AS category,
                   date_trunc('week', p.created_at)::date AS week_start,
                   COUNT(*)::bigint AS units
            FROM purchases p
            JOIN apps a ON a.id = p.app_id
            WHERE p.created_at >= now() - ($1::int * interval '1 week')
            GROUP BY a.category, date_trunc('week', p.created_at)::date
            ORDER BY a.category, week_start
            ",
        )
        .bind(weeks as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(CategoryWeek {
                    category: row.try_get("category").map_err(db_err)?,
                    week_start: row.try_get("week_start").map_err(db_err)?,
                    units: row.try_get("units").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn developer_app_days(
        &self,
        developer_id: &str,
        since: NaiveDate,
    ) -> MarketResult<Vec<AppDay>> {
        let rows = sqlx::query(
            r"
            SELECT e.app_id AS app_id,
                   a.name AS app_name,
                   e.created_at::date AS date,
                   COUNT(*) FILTER (WHERE e.kind = 'download')::bigint AS downloads,
                   COUNT(*) FILTER (WHERE e.kind = 'session')::bigint AS sessions
            FROM app_events e
            JOIN apps a ON a.id = e.app_id
            WHERE a.developer_id = $1::uuid
              AND e.created_at >= $2
            GROUP BY e.app_id, a.name, e.created_at::date
            ORDER BY e.app_id, date
            ",
        )
        .bind(developer_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(AppDay {
                    app_id: row.try_get("app_id").map_err(db_err)?,
                    app_name: row.try_get("app_name").map_err(db_err)?,
                    date: row.try_get("date").map_err(db_err)?,
                    downloads: row.try_get("downloads").map_err(db_err)?,
                    sessions: row.try_get("sessions").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn developer_weekly_revenue(
        &self,
        developer_id: &str,
        weeks: u32,
    ) -> MarketResult<Vec<RevenueWeek>> {
        let rows = sqlx::query(
            r"
            SELECT date_trunc('week', p.created_at)::date AS week_start,
                   COALESCE(SUM(p.amount_cents), 0)::bigint AS revenue_cents
            FROM purchases p
            JOIN apps a ON a.id = p.app_id
            WHERE a.developer_id = $1::uuid
              AND p.created_at >= now() - ($2::int * interval '1 week')
            GROUP BY date_trunc('week', p.created_at)::date
            ORDER BY week_start
            ",
        )
        .bind(developer_id)
        .bind(weeks as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(RevenueWeek {
                    week_start: row.try_get("week_start").map_err(db_err)?,
                    revenue_cents: row.try_get("revenue_cents").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn cohort_sizes(
        &self,
        granularity: CohortGranularity,
        num_periods: u32,
    ) -> MarketResult<Vec<CohortSizeRow>> {
        let rows = sqlx::query(
            r"
            SELECT date_trunc($1, u.created_at)::date AS cohort_period,
                   COUNT(*)::bigint AS cohort_size
            FROM users u
            WHERE u.created_at >= now() - ($2::int * ($3::int * interval '1 day'))
            GROUP BY date_trunc($1, u.created_at)::date
            ORDER BY cohort_period
            ",
        )
        .bind(granularity.trunc_unit())
        .bind(num_periods as i32)
        .bind(granularity.period_days() as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(CohortSizeRow {
                    cohort_period: row.try_get("cohort_period").map_err(db_err)?,
                    cohort_size: row.try_get("cohort_size").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn cohort_activity(
        &self,
        granularity: CohortGranularity,
        num_periods: u32,
    ) -> MarketResult<Vec<CohortActivityRow>> {
        let rows = sqlx::query(
            r"
            SELECT date_trunc($1, u.created_at)::date AS cohort_period,
                   ((date_trunc($1, e.created_at)::date
                     - date_trunc($1, u.created_at)::date) / $3)::int AS period_offset,
                   COUNT(DISTINCT e.user_id)::bigint AS active_users
            FROM user_events e
            JOIN users u ON u.id = e.user_id
            WHERE u.created_at >= now() - ($2::int * ($3::int * interval '1 day'))
              AND e.created_at >= u.created_at
            GROUP BY 1, 2
            ORDER BY 1, 2
            ",
        )
        .bind(granularity.trunc_unit())
        .bind(num_periods as i32)
        .bind(granularity.period_days() as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                let offset: i32 = row.try_get("period_offset").map_err(db_err)?;
                Ok(CohortActivityRow {
                    cohort_period: row.try_get("cohort_period").map_err(db_err)?,
                    period_offset: offset.max(0) as u32,
                    active_users: row.try_get("active_users").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn user_lifetime_values(
        &self,
        granularity: CohortGranularity,
    ) -> MarketResult<Vec<UserLifetimeRow>> {
        let rows = sqlx::query(
            r"
            SELECT u.id AS user_id,
                   date_trunc($1, u.created_at)::date AS cohort_period,
                   COALESCE(SUM(p.amount_cents), 0)::bigint AS lifetime_revenue_cents
            FROM users u
            LEFT JOIN purchases p ON p.user_id = u.id
            GROUP BY u.id
            ORDER BY cohort_period
            ",
        )
        .bind(granularity.trunc_unit())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(UserLifetimeRow {
                    user_id: row.try_get("user_id").map_err(db_err)?,
                    cohort_period: row.try_get("cohort_period").map_err(db_err)?,
                    lifetime_revenue_cents: row
                        .try_get("lifetime_revenue_cents")
                        .map_err(db_err)?,
                })
            })
            .collect()
    }
}
