//! Comparison orchestration
//!
//! Resolve directions, build one search URL per direction and configuration,
//! fetch concurrently, flatten and aggregate. Each run is tagged with a run
//! id on its tracing span.

use std::sync::Arc;

use kowalski_common::config::SearchConfig;
use kowalski_common::{Error, Result};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::compare::{analyze_fare_rules, compare_configurations, DirectionUrls};
use crate::directions::{resolve_directions, DirectionQuery, DirectionStore, Sample};
use crate::fetch::{fetch_all, SearchClient};
use crate::flatten::{flatten_fare_rules, flatten_prices};
use crate::models::{ComparisonBody, ConfigSlot, MinirulesBody};
use crate::report::{ComparisonReport, MinirulesReport, Report};
use crate::search_url::build_search_url;

/// Runs comparisons against the injected store and fare-search client
pub struct ComparisonService {
    store: Arc<dyn DirectionStore>,
    client: Arc<dyn SearchClient>,
    search: SearchConfig,
}

impl ComparisonService {
    pub fn new(
        store: Arc<dyn DirectionStore>,
        client: Arc<dyn SearchClient>,
        search: SearchConfig,
    ) -> Self {
        Self {
            store,
            client,
            search,
        }
    }

    /// Compare the cheapest offers of two configurations
    ///
    /// Both configurations are fetched concurrently; the concurrency bound
    /// applies to each configuration separately.
    ///
    /// # Errors
    /// - `InvalidInput` for malformed directions or a non-positive limit
    /// - `Database` if the direction store is unavailable
    pub async fn make_config_comparison(
        &self,
        body: &ComparisonBody,
    ) -> Result<Report<ComparisonReport>> {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "config_comparison",
            %run_id,
            supplier = %body.fast_search_params.filter_airlines
        );
        self.run_config_comparison(body).instrument(span).await
    }

    async fn run_config_comparison(
        &self,
        body: &ComparisonBody,
    ) -> Result<Report<ComparisonReport>> {
        validate_limit(&body.directions, body.limit_directions)?;

        let query = DirectionQuery {
            directions: &body.directions,
            supplier_code: &body.fast_search_params.filter_airlines,
            from_date: body.top_directions_from_date,
            limit: body.limit_directions,
        };
        let directions = resolve_directions(self.store.as_ref(), query, Sample::Top).await?;
        if directions.is_empty() {
            info!("No directions resolved, returning placeholder");
            return Ok(Report::no_directions());
        }

        let first = body.configuration(ConfigSlot::First);
        let second = body.configuration(ConfigSlot::Second);
        let entries: Vec<DirectionUrls> = directions
            .into_iter()
            .map(|direction| {
                let route = direction.route();
                DirectionUrls {
                    url_1: build_search_url(
                        &self.search.base_url,
                        &route,
                        &first,
                        &body.fast_search_params,
                    ),
                    url_2: build_search_url(
                        &self.search.base_url,
                        &route,
                        &second,
                        &body.fast_search_params,
                    ),
                    direction,
                }
            })
            .collect();

        info!(directions = entries.len(), "Fetching fare search results");
        let urls_1 = entries.iter().map(|e| e.url_1.clone()).collect();
        let urls_2 = entries.iter().map(|e| e.url_2.clone()).collect();
        let (results_1, results_2) = tokio::join!(
            fetch_all(
                self.client.as_ref(),
                urls_1,
                self.search.timeout(),
                self.search.max_concurrent_fetches
            ),
            fetch_all(
                self.client.as_ref(),
                urls_2,
                self.search.timeout(),
                self.search.max_concurrent_fetches
            ),
        );

        let flat_1 = flatten_prices(&results_1, &first);
        let flat_2 = flatten_prices(&results_2, &second);
        let stats = flat_1.stats.merge(flat_2.stats);
        let mut recommendations = flat_1.records;
        recommendations.extend(flat_2.records);

        let report = compare_configurations(&entries, &recommendations, stats);
        info!(
            recommendations = report.count_recommendations,
            min_recommendations = report.count_min_recommendations,
            failed_fetches = report.count_failed_fetches,
            "Config comparison complete"
        );
        Ok(Report::Complete(report))
    }

    /// Check fare-rule completeness for one configuration
    ///
    /// Directions not supplied by the caller are sampled from both ends of
    /// the popularity ranking.
    ///
    /// # Errors
    /// Same as `make_config_comparison`.
    pub async fn make_minirules_comparison(
        &self,
        body: &MinirulesBody,
    ) -> Result<Report<MinirulesReport>> {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "minirules_comparison",
            %run_id,
            supplier = %body.fast_search_params.filter_airlines
        );
        self.run_minirules_comparison(body).instrument(span).await
    }

    async fn run_minirules_comparison(
        &self,
        body: &MinirulesBody,
    ) -> Result<Report<MinirulesReport>> {
        validate_limit(&body.directions, body.limit_directions)?;

        let supplier_code = &body.fast_search_params.filter_airlines;
        let query = DirectionQuery {
            directions: &body.directions,
            supplier_code,
            from_date: body.top_directions_from_date,
            limit: body.limit_directions,
        };
        let directions =
            resolve_directions(self.store.as_ref(), query, Sample::TopAndBottom).await?;
        if directions.is_empty() {
            info!("No directions resolved, returning placeholder");
            return Ok(Report::no_directions());
        }

        let configuration = body.configuration();
        let urls = directions
            .iter()
            .map(|direction| {
                build_search_url(
                    &self.search.base_url,
                    &direction.route(),
                    &configuration,
                    &body.fast_search_params,
                )
            })
            .collect();

        info!(directions = directions.len(), "Fetching fare search results");
        let results = fetch_all(
            self.client.as_ref(),
            urls,
            self.search.timeout(),
            self.search.max_concurrent_fetches,
        )
        .await;

        let flat = flatten_fare_rules(&results, &configuration);
        let report = analyze_fare_rules(
            supplier_code,
            &configuration,
            &directions,
            &flat.records,
            flat.stats,
        );
        info!(
            unique_fares = report.count_unique_fares,
            failed_fetches = report.count_failed_fetches,
            "Minirules comparison complete"
        );
        Ok(Report::Complete(report))
    }
}

/// A store lookup needs a positive limit
fn validate_limit(directions: &[String], limit: i64) -> Result<()> {
    if directions.is_empty() && limit < 1 {
        return Err(Error::InvalidInput(format!(
            "limit_directions must be positive, got {}",
            limit
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directions::tests::FakeStore;
    use crate::directions::DirectionRow;
    use crate::fetch::tests::FakeSearchClient;
    use crate::flatten::tests::{document, recommendation, segment};
    use crate::models::{Configuration, Direction, FastSearchParams};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    const BASE: &str = "http://fare-search.test/fast_search.json";

    fn search_config() -> SearchConfig {
        SearchConfig {
            base_url: BASE.to_string(),
            timeout_secs: 1,
            max_concurrent_fetches: 2,
        }
    }

    fn params() -> FastSearchParams {
        FastSearchParams {
            filter_airlines: "SU".to_string(),
            search_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            filter_gds: String::new(),
            exclude_gds: String::new(),
            force_search: "1".to_string(),
            max_segments: String::new(),
            service_class: "A".to_string(),
        }
    }

    fn comparison_body(directions: &[&str]) -> ComparisonBody {
        ComparisonBody {
            api_key_1: "k1".to_string(),
            api_key_2: "k2".to_string(),
            avia_config_item_ids_1: String::new(),
            avia_config_item_ids_2: "2164".to_string(),
            fast_search_params: params(),
            directions: directions.iter().map(|d| d.to_string()).collect(),
            top_directions_from_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            limit_directions: 5,
        }
    }

    fn minirules_body(directions: &[&str]) -> MinirulesBody {
        MinirulesBody {
            api_key: "k1".to_string(),
            avia_config_item_ids: String::new(),
            fast_search_params: params(),
            directions: directions.iter().map(|d| d.to_string()).collect(),
            top_directions_from_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            limit_directions: 1,
        }
    }

    fn url_for(direction: &str, configuration: &Configuration) -> String {
        let route = Direction::new("SU", direction, 1).unwrap().route();
        build_search_url(BASE, &route, configuration, &params())
    }

    fn build_service(store: FakeStore, client: FakeSearchClient) -> (ComparisonService, Arc<FakeSearchClient>) {
        let client = Arc::new(client);
        let service = ComparisonService::new(Arc::new(store), client.clone(), search_config());
        (service, client)
    }

    #[tokio::test]
    async fn test_empty_store_yields_placeholder() {
        let (service, client) = build_service(FakeStore::default(), FakeSearchClient::default());

        let report = service
            .make_config_comparison(&comparison_body(&[]))
            .await
            .unwrap();

        assert!(report.is_placeholder());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_config_comparison_end_to_end() {
        let body = comparison_body(&["MOWLED"]);
        let itinerary = || vec![segment(0, "MOW", "LED", "SU", "10")];
        let client = FakeSearchClient::default()
            .with(
                &url_for("MOWLED", &body.configuration(ConfigSlot::First)),
                document(vec![recommendation("a", 5000.0, itinerary())]),
            )
            .with(
                &url_for("MOWLED", &body.configuration(ConfigSlot::Second)),
                document(vec![recommendation("b", 5200.0, itinerary())]),
            );
        let (service, client) = build_service(FakeStore::default(), client);

        let report = match service.make_config_comparison(&body).await.unwrap() {
            Report::Complete(report) => report,
            Report::Placeholder(_) => panic!("expected a complete report"),
        };

        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.count_recommendations, 2);
        assert_eq!(report.count_min_recommendations, 1);
        assert_eq!(report.count_directions, 1);
        assert_eq!(report.top_3_directions, vec!["MOWLED"]);
        assert_eq!(report.price_diff_statistics.diff.max, Some(200.0));
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_fail_comparison() {
        let body = comparison_body(&["MOWLED", "LEDMOW"]);
        let client = FakeSearchClient::default().with(
            &url_for("MOWLED", &body.configuration(ConfigSlot::First)),
            document(vec![recommendation(
                "a",
                100.0,
                vec![segment(0, "MOW", "LED", "SU", "10")],
            )]),
        );
        let (service, _) = build_service(FakeStore::default(), client);

        let report = match service.make_config_comparison(&body).await.unwrap() {
            Report::Complete(report) => report,
            Report::Placeholder(_) => panic!("expected a complete report"),
        };

        assert_eq!(report.count_recommendations, 1);
        assert_eq!(report.count_failed_fetches, 3);
    }

    #[tokio::test]
    async fn test_invalid_direction_rejected() {
        let (service, _) = build_service(FakeStore::default(), FakeSearchClient::default());

        let result = service
            .make_config_comparison(&comparison_body(&["MOW"]))
            .await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_non_positive_limit_rejected() {
        let (service, _) = build_service(FakeStore::default(), FakeSearchClient::default());
        let mut body = minirules_body(&[]);
        body.limit_directions = 0;

        let result = service.make_minirules_comparison(&body).await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_minirules_uses_top_and_bottom_sample() {
        let store = FakeStore {
            rows: vec![DirectionRow {
                supplier_code: "SU".to_string(),
                direction: "MOWLED".to_string(),
                popularity: 12,
            }],
            ..Default::default()
        };
        let body = minirules_body(&[]);
        let mut seg = segment(0, "MOW", "LED", "SU", "10");
        seg["baggage"] = json!(null);
        let client = FakeSearchClient::default().with(
            &url_for("MOWLED", &body.configuration()),
            document(vec![
                recommendation("a", 100.0, vec![segment(0, "MOW", "LED", "SU", "10")]),
                recommendation("b", 100.0, vec![seg]),
            ]),
        );
        let store = Arc::new(store);
        let service = ComparisonService::new(store.clone(), Arc::new(client), search_config());

        let report = match service.make_minirules_comparison(&body).await.unwrap() {
            Report::Complete(report) => report,
            Report::Placeholder(_) => panic!("expected a complete report"),
        };

        assert_eq!(*store.calls.lock().unwrap(), vec![Sample::TopAndBottom]);
        assert_eq!(report.directions, vec!["MOWLED"]);
        assert_eq!(report.count_unique_fares, 1);
        assert!(!report.check_laggage_flag);
        assert_eq!(report.supplier_code, "SU");
    }
}
