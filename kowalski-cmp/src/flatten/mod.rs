//! Recommendation flattening
//!
//! Walks fetched documents recommendation → route → segment and emits flat,
//! typed records. Two flavors:
//! - price: one `PriceRecord` per recommendation
//! - fare rule: one `FareRecord` per (recommendation, route, segment)
//!
//! Failed fetches are dropped before any field is read. Documents without
//! the expected envelope and recommendations that do not match the expected
//! shape are skipped and counted in `FlattenStats` rather than failing the
//! whole comparison.

pub mod types;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::fetch::{FetchOutcome, FetchResult};
use crate::models::{Amount, Configuration};
use types::{ConditionBlock, Envelope, Recommendation, RouteTree, Segment};

/// Currency used for all price comparisons
pub const REPORT_CURRENCY: &str = "RUB";

/// Counts of inputs that produced no records
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlattenStats {
    pub failed_fetches: usize,
    pub malformed_documents: usize,
    pub malformed_recommendations: usize,
}

impl FlattenStats {
    pub fn malformed(&self) -> usize {
        self.malformed_documents + self.malformed_recommendations
    }

    pub fn merge(self, other: FlattenStats) -> FlattenStats {
        FlattenStats {
            failed_fetches: self.failed_fetches + other.failed_fetches,
            malformed_documents: self.malformed_documents + other.malformed_documents,
            malformed_recommendations: self.malformed_recommendations
                + other.malformed_recommendations,
        }
    }
}

/// Flattener output
#[derive(Debug, Clone)]
pub struct Flattened<T> {
    pub records: Vec<T>,
    pub stats: FlattenStats,
}

/// Canonical itinerary key
///
/// One `{route}[{segment}|{dep}-{arr}|{supplier}-{flight}]` entry per
/// segment, in source order, joined with `|`. Delimiters inside field values
/// are backslash-escaped, so distinct segment data never yields equal keys.
pub fn route_signature(routes: &[RouteTree]) -> String {
    routes
        .iter()
        .flat_map(|route| {
            route.segments.iter().map(move |segment| {
                format!(
                    "{}[{}|{}-{}|{}-{}]",
                    escape(&route.route_index),
                    escape(&segment.segment_index),
                    escape(&segment.departure_city),
                    escape(&segment.arrival_city),
                    escape(&segment.supplier_code),
                    escape(&segment.flight_number)
                )
            })
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '-' | '|' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// One recommendation, price flavor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub url: String,
    pub status_code: String,
    pub session: String,
    pub trip_id: String,
    pub amount: Amount,
    pub gds_id: String,
    pub config_id: String,
    pub fare: Value,
    pub validating_supplier: String,
    pub routes: Vec<RouteTree>,
    pub route_signature: String,
    pub api_key: String,
    pub config_item_id: String,
}

/// One segment of one recommendation, fare-rule flavor
#[derive(Debug, Clone, PartialEq)]
pub struct FareRecord {
    pub url: String,
    pub status_code: String,
    pub session: String,
    pub trip_id: String,
    pub amount: Amount,
    pub gds_id: String,
    pub config_id: String,
    pub validating_supplier: String,
    pub route_signature: String,
    pub api_key: String,
    pub config_item_id: String,
    pub route_index: String,
    pub segment: Segment,
    /// The segment's fare code
    pub fare_code: String,
    /// Fare codes of every segment of the recommendation. Carried for
    /// consumers of the fare-rule records; the minirules report reads the
    /// per-segment fields only.
    pub fares: Vec<String>,
    /// Exchange blocks of every segment of the recommendation, carried
    /// alongside `fares`
    pub refunds: Vec<ConditionBlock>,
}

/// A recommendation decoded together with its response context
struct Parsed {
    url: String,
    status_code: String,
    session: String,
    amount: Amount,
    recommendation: Recommendation,
}

/// Flatten price-comparison records for one configuration
pub fn flatten_prices(
    results: &[FetchResult],
    configuration: &Configuration,
) -> Flattened<PriceRecord> {
    let (parsed, stats) = walk(results);

    let records = parsed
        .into_iter()
        .map(|p| {
            let route_signature = route_signature(&p.recommendation.routes);
            let rec = p.recommendation;
            PriceRecord {
                url: p.url,
                status_code: p.status_code,
                session: p.session,
                trip_id: rec.id,
                amount: p.amount,
                gds_id: rec.gds_id,
                config_id: rec.config_id,
                fare: rec.fare,
                validating_supplier: rec.validating_supplier,
                routes: rec.routes,
                route_signature,
                api_key: configuration.api_key.clone(),
                config_item_id: configuration.config_item_id.clone(),
            }
        })
        .collect();

    Flattened { records, stats }
}

/// Flatten fare-rule records (one per segment) for one configuration
///
/// A recommendation with any segment lacking a fare code is malformed.
pub fn flatten_fare_rules(
    results: &[FetchResult],
    configuration: &Configuration,
) -> Flattened<FareRecord> {
    let (parsed, mut stats) = walk(results);
    let mut records = Vec::new();

    for p in parsed {
        let rec = &p.recommendation;
        let segments = || rec.routes.iter().flat_map(|route| route.segments.iter());

        let fares: Option<Vec<String>> = segments().map(|s| s.fare_code.clone()).collect();
        let Some(fares) = fares else {
            warn!(url = %p.url, trip_id = %rec.id, "Segment without fare code, skipping recommendation");
            stats.malformed_recommendations += 1;
            continue;
        };
        let refunds: Vec<ConditionBlock> = segments()
            .map(|s| s.mini_rules.system_rules.exchange_block.clone())
            .collect();
        let signature = route_signature(&rec.routes);

        for route in &rec.routes {
            for segment in &route.segments {
                records.push(FareRecord {
                    url: p.url.clone(),
                    status_code: p.status_code.clone(),
                    session: p.session.clone(),
                    trip_id: rec.id.clone(),
                    amount: p.amount,
                    gds_id: rec.gds_id.clone(),
                    config_id: rec.config_id.clone(),
                    validating_supplier: rec.validating_supplier.clone(),
                    route_signature: signature.clone(),
                    api_key: configuration.api_key.clone(),
                    config_item_id: configuration.config_item_id.clone(),
                    route_index: route.route_index.clone(),
                    fare_code: segment.fare_code.clone().unwrap_or_default(),
                    segment: segment.clone(),
                    fares: fares.clone(),
                    refunds: refunds.clone(),
                });
            }
        }
    }

    Flattened { records, stats }
}

/// Decode every successful document into recommendations with route data
fn walk(results: &[FetchResult]) -> (Vec<Parsed>, FlattenStats) {
    let mut stats = FlattenStats::default();
    let mut parsed = Vec::new();

    for result in results {
        let document = match &result.outcome {
            FetchOutcome::Failure(message) => {
                debug!(url = %result.url, error = %message, "Dropping failed fetch");
                stats.failed_fetches += 1;
                continue;
            }
            FetchOutcome::Success(document) => document,
        };

        let envelope = match decode_envelope(document) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(url = %result.url, error = %e, "Malformed fare-search document");
                stats.malformed_documents += 1;
                continue;
            }
        };
        let body = envelope.response;

        for raw in &body.recommendations {
            let recommendation = match Recommendation::deserialize(raw) {
                Ok(recommendation) => recommendation,
                Err(e) => {
                    warn!(url = %result.url, error = %e, "Malformed recommendation");
                    stats.malformed_recommendations += 1;
                    continue;
                }
            };

            if recommendation.routes.is_empty() {
                debug!(url = %result.url, trip_id = %recommendation.id, "Recommendation without routes");
                continue;
            }

            let Some(amount) = recommendation.amount_in(REPORT_CURRENCY) else {
                warn!(
                    url = %result.url,
                    trip_id = %recommendation.id,
                    "Recommendation without {} amount",
                    REPORT_CURRENCY
                );
                stats.malformed_recommendations += 1;
                continue;
            };

            parsed.push(Parsed {
                url: result.url.clone(),
                status_code: body.result.code.clone(),
                session: body.session.id.clone(),
                amount: Amount(amount),
                recommendation,
            });
        }
    }

    (parsed, stats)
}

/// Decode the envelope, accepting a JSON document delivered as a string
fn decode_envelope(document: &Value) -> Result<Envelope, serde_json::Error> {
    match document {
        Value::String(text) => serde_json::from_str(text),
        other => Envelope::deserialize(other),
    }
}
