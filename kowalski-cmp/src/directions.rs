//! Direction source resolution
//!
//! Directions come either from the caller (order preserved, popularity is the
//! 1-based position) or from a statistics store queried for the most popular
//! directions of a supplier.

use async_trait::async_trait;
use chrono::NaiveDate;
use kowalski_common::Result;
use tracing::{debug, warn};

use crate::models::{Direction, DIRECTION_LEN};

/// A raw `(supplier_code, direction, popularity)` row from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionRow {
    pub supplier_code: String,
    pub direction: String,
    pub popularity: i64,
}

/// Source of popular directions
///
/// Implementations must release any borrowed connection on every exit path.
/// An empty `Vec` means "no matching rows" and is not an error.
#[async_trait]
pub trait DirectionStore: Send + Sync {
    /// The `limit` most popular directions since `from_date`
    async fn top_directions(
        &self,
        from_date: NaiveDate,
        supplier_code: &str,
        limit: i64,
    ) -> Result<Vec<DirectionRow>>;

    /// The `limit` most popular unioned with the `limit` least popular directions
    async fn top_and_bottom_directions(
        &self,
        from_date: NaiveDate,
        supplier_code: &str,
        limit: i64,
    ) -> Result<Vec<DirectionRow>>;
}

/// Which store query shape to use when the caller supplies no directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    Top,
    TopAndBottom,
}

/// Resolver input
#[derive(Debug, Clone, Copy)]
pub struct DirectionQuery<'a> {
    pub directions: &'a [String],
    pub supplier_code: &'a str,
    pub from_date: NaiveDate,
    pub limit: i64,
}

/// Resolve the directions to analyze
///
/// # Errors
/// - `InvalidInput` if a caller-supplied direction is not six characters
/// - `Database` if the store is unavailable
pub async fn resolve_directions(
    store: &dyn DirectionStore,
    query: DirectionQuery<'_>,
    sample: Sample,
) -> Result<Vec<Direction>> {
    if !query.directions.is_empty() {
        return query
            .directions
            .iter()
            .enumerate()
            .map(|(idx, code)| Direction::new(query.supplier_code, code, idx as i64 + 1))
            .collect();
    }

    let rows = match sample {
        Sample::Top => {
            store
                .top_directions(query.from_date, query.supplier_code, query.limit)
                .await?
        }
        Sample::TopAndBottom => {
            store
                .top_and_bottom_directions(query.from_date, query.supplier_code, query.limit)
                .await?
        }
    };

    if rows.is_empty() {
        warn!(
            supplier = %query.supplier_code,
            from_date = %query.from_date,
            "Direction store returned no rows"
        );
        return Ok(Vec::new());
    }

    let directions: Vec<Direction> = rows
        .into_iter()
        .filter_map(|row| {
            let code: String = row.direction.chars().take(DIRECTION_LEN).collect();
            match Direction::new(&row.supplier_code, &code, row.popularity) {
                Ok(direction) => Some(direction),
                Err(e) => {
                    warn!(direction = %row.direction, error = %e, "Skipping store row");
                    None
                }
            }
        })
        .collect();

    debug!(count = directions.len(), "Resolved directions from store");
    Ok(directions)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use kowalski_common::Error;
    use std::sync::Mutex;

    /// In-memory store recording which query shape was used
    #[derive(Default)]
    pub struct FakeStore {
        pub rows: Vec<DirectionRow>,
        pub calls: Mutex<Vec<Sample>>,
    }

    #[async_trait]
    impl DirectionStore for FakeStore {
        async fn top_directions(&self, _: NaiveDate, _: &str, _: i64) -> Result<Vec<DirectionRow>> {
            self.calls.lock().unwrap().push(Sample::Top);
            Ok(self.rows.clone())
        }

        async fn top_and_bottom_directions(
            &self,
            _: NaiveDate,
            _: &str,
            _: i64,
        ) -> Result<Vec<DirectionRow>> {
            self.calls.lock().unwrap().push(Sample::TopAndBottom);
            Ok(self.rows.clone())
        }
    }

    struct DownStore;

    #[async_trait]
    impl DirectionStore for DownStore {
        async fn top_directions(&self, _: NaiveDate, _: &str, _: i64) -> Result<Vec<DirectionRow>> {
            Err(Error::Database(sqlx::Error::PoolTimedOut))
        }

        async fn top_and_bottom_directions(
            &self,
            _: NaiveDate,
            _: &str,
            _: i64,
        ) -> Result<Vec<DirectionRow>> {
            Err(Error::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn row(direction: &str, popularity: i64) -> DirectionRow {
        DirectionRow {
            supplier_code: "SU".to_string(),
            direction: direction.to_string(),
            popularity,
        }
    }

    fn query(directions: &[String]) -> DirectionQuery<'_> {
        DirectionQuery {
            directions,
            supplier_code: "SU",
            from_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            limit: 5,
        }
    }

    #[tokio::test]
    async fn test_caller_directions_keep_order() {
        let store = FakeStore::default();
        let input = vec!["MOWLED".to_string(), "LEDMOW".to_string()];

        let directions = resolve_directions(&store, query(&input), Sample::Top)
            .await
            .unwrap();

        let popularity: Vec<i64> = directions.iter().map(|d| d.popularity).collect();
        let codes: Vec<&str> = directions.iter().map(|d| d.direction.as_str()).collect();
        assert_eq!(popularity, vec![1, 2]);
        assert_eq!(codes, vec!["MOWLED", "LEDMOW"]);
        assert!(directions.iter().all(|d| d.supplier_code == "SU"));
        assert!(store.calls.lock().unwrap().is_empty(), "store must not be queried");
    }

    #[tokio::test]
    async fn test_invalid_caller_direction_rejected() {
        let store = FakeStore::default();
        let input = vec!["MOWLED".to_string(), "MOW-LED".to_string()];

        let result = resolve_directions(&store, query(&input), Sample::Top).await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_store_rows_truncated_and_short_rows_skipped() {
        let store = FakeStore {
            rows: vec![row("MOWLEDXYZ", 40), row("LED", 10), row("AERMOW", 5)],
            ..Default::default()
        };

        let directions = resolve_directions(&store, query(&[]), Sample::TopAndBottom)
            .await
            .unwrap();

        let codes: Vec<&str> = directions.iter().map(|d| d.direction.as_str()).collect();
        assert_eq!(codes, vec!["MOWLED", "AERMOW"]);
        assert_eq!(directions[0].popularity, 40);
        assert_eq!(*store.calls.lock().unwrap(), vec![Sample::TopAndBottom]);
    }

    #[tokio::test]
    async fn test_empty_store_is_not_an_error() {
        let store = FakeStore::default();

        let directions = resolve_directions(&store, query(&[]), Sample::Top)
            .await
            .unwrap();

        assert!(directions.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let result = resolve_directions(&DownStore, query(&[]), Sample::Top).await;

        assert!(matches!(result, Err(Error::Database(_))));
    }
}
