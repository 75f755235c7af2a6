//! PostgreSQL-backed direction store
//!
//! Two databases are involved: hit statistics (used for config comparison)
//! and the flight schedule in the core database (used for mini-rule
//! sampling). Both pools are read-only consumers; every query borrows a
//! connection from the pool for the duration of one `fetch_all`.

use async_trait::async_trait;
use chrono::NaiveDate;
use kowalski_common::{Error, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::directions::{DirectionRow, DirectionStore};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

const TOP_DIRECTIONS_SQL: &str = r#"
    SELECT supplier_code, LEFT(direction, 6) AS direction, SUM(cnt)::BIGINT AS popularity
    FROM "statistics".mvw_grouped_hits
    WHERE created >= $1
      AND supplier_code = $2
      AND provider = 'TUA'
    GROUP BY supplier_code, LEFT(direction, 6)
    ORDER BY popularity DESC
    LIMIT $3
"#;

const TOP_AND_BOTTOM_DIRECTIONS_SQL: &str = r#"
    WITH agg_f AS (
        SELECT f.carrier_code AS supplier_code,
               city_dep.iata || city_arr.iata AS direction,
               COUNT(*)::BIGINT AS popularity
        FROM tol.flight f
            JOIN tol.city city_dep ON city_dep.id = f.city_dep_id
            JOIN tol.city city_arr ON city_arr.id = f.city_arr_id
        WHERE f.carrier_code = $2
          AND f.date_dep >= $1
        GROUP BY f.carrier_code, city_dep.iata, city_arr.iata
    ),
    top_ AS (
        SELECT * FROM agg_f ORDER BY popularity DESC LIMIT $3
    ),
    bttm_ AS (
        SELECT * FROM agg_f ORDER BY popularity ASC LIMIT $3
    )
    SELECT supplier_code, direction, popularity FROM top_
    UNION
    SELECT supplier_code, direction, popularity FROM bttm_
    ORDER BY popularity DESC
"#;

/// Direction store over the statistics and core databases
pub struct PgDirectionStore {
    stats: PgPool,
    core: PgPool,
}

impl PgDirectionStore {
    pub fn new(stats: PgPool, core: PgPool) -> Self {
        Self { stats, core }
    }

    /// Build lazily-connecting pools
    ///
    /// No connection is opened until the first query, so the service starts
    /// even when a database is unreachable; the failure then surfaces per
    /// request as a store error.
    pub fn connect_lazy(stats_url: &str, core_url: &str) -> Result<Self> {
        let stats = lazy_pool(stats_url)?;
        let core = lazy_pool(core_url)?;
        Ok(Self::new(stats, core))
    }
}

fn lazy_pool(url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_lazy(url)
        .map_err(|e| Error::Config(format!("Invalid database URL: {}", e)))
}

async fn fetch_rows(
    pool: &PgPool,
    sql: &str,
    from_date: NaiveDate,
    supplier_code: &str,
    limit: i64,
) -> Result<Vec<DirectionRow>> {
    let rows = sqlx::query_as::<_, (String, String, i64)>(sql)
        .bind(from_date)
        .bind(supplier_code)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(supplier_code, direction, popularity)| DirectionRow {
            supplier_code,
            direction,
            popularity,
        })
        .collect())
}

#[async_trait]
impl DirectionStore for PgDirectionStore {
    async fn top_directions(
        &self,
        from_date: NaiveDate,
        supplier_code: &str,
        limit: i64,
    ) -> Result<Vec<DirectionRow>> {
        fetch_rows(&self.stats, TOP_DIRECTIONS_SQL, from_date, supplier_code, limit).await
    }

    async fn top_and_bottom_directions(
        &self,
        from_date: NaiveDate,
        supplier_code: &str,
        limit: i64,
    ) -> Result<Vec<DirectionRow>> {
        fetch_rows(
            &self.core,
            TOP_AND_BOTTOM_DIRECTIONS_SQL,
            from_date,
            supplier_code,
            limit,
        )
        .await
    }
}
