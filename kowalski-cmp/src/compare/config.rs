//! Two-configuration price comparison
//!
//! Recommendations from both configurations are pooled, reduced to the
//! cheapest offer per itinerary, tied back to their direction by search URL
//! and summarized.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use super::stats::{value_counts, Describe};
use crate::flatten::{FlattenStats, PriceRecord};
use crate::models::{Amount, Direction};
use crate::report::{ComparisonReport, PriceDiffStatistics};

/// Direction metadata attached to a row through its search URL
///
/// Every field is optional: a row whose URL matches neither configuration's
/// URL list carries no metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DirectionInfo {
    pub direction: Option<String>,
    pub popularity: Option<i64>,
    pub departure: Option<String>,
    pub arrival: Option<String>,
}

impl DirectionInfo {
    pub fn of(direction: &Direction) -> Self {
        let route = direction.route();
        Self {
            direction: Some(direction.direction.clone()),
            popularity: Some(direction.popularity),
            departure: Some(route.departure),
            arrival: Some(route.arrival),
        }
    }

    /// Field-wise merge keeping `self` where present
    pub fn or(self, fallback: DirectionInfo) -> Self {
        Self {
            direction: self.direction.or(fallback.direction),
            popularity: self.popularity.or(fallback.popularity),
            departure: self.departure.or(fallback.departure),
            arrival: self.arrival.or(fallback.arrival),
        }
    }
}

/// A direction with the search URL built for each configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionUrls {
    pub direction: Direction,
    pub url_1: String,
    pub url_2: String,
}

/// URL → direction metadata, one map per configuration
struct UrlIndex<'a> {
    first: HashMap<&'a str, Vec<DirectionInfo>>,
    second: HashMap<&'a str, Vec<DirectionInfo>>,
}

impl<'a> UrlIndex<'a> {
    fn new(directions: &'a [DirectionUrls]) -> Self {
        let mut first: HashMap<&str, Vec<DirectionInfo>> = HashMap::new();
        let mut second: HashMap<&str, Vec<DirectionInfo>> = HashMap::new();
        for entry in directions {
            let info = DirectionInfo::of(&entry.direction);
            first.entry(entry.url_1.as_str()).or_default().push(info.clone());
            second.entry(entry.url_2.as_str()).or_default().push(info);
        }
        Self { first, second }
    }

    /// Left join against the first list, then the second, coalescing
    ///
    /// Fans out when a URL matches several directions; a URL matching nothing
    /// yields one empty `DirectionInfo`.
    fn lookup(&self, url: &str) -> Vec<DirectionInfo> {
        let missing = [DirectionInfo::default()];
        let lefts = self.first.get(url).map(Vec::as_slice).unwrap_or(&missing);
        let rights = self.second.get(url).map(Vec::as_slice).unwrap_or(&missing);

        lefts
            .iter()
            .flat_map(|left| rights.iter().map(move |right| left.clone().or(right.clone())))
            .collect()
    }
}

/// The cheapest offer of an itinerary, projected to the comparison columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MinRecommendation {
    pub info: DirectionInfo,
    pub validating_supplier: String,
    pub route_signature: String,
    pub amount: Amount,
    pub status_code: String,
    pub session: String,
    pub trip_id: String,
    pub gds_id: String,
    pub config_id: String,
    pub api_key: String,
    pub config_item_id: String,
    pub url: String,
}

impl MinRecommendation {
    fn project(record: &PriceRecord, info: DirectionInfo) -> Self {
        Self {
            info,
            validating_supplier: record.validating_supplier.clone(),
            route_signature: record.route_signature.clone(),
            amount: record.amount,
            status_code: record.status_code.clone(),
            session: record.session.clone(),
            trip_id: record.trip_id.clone(),
            gds_id: record.gds_id.clone(),
            config_id: record.config_id.clone(),
            api_key: record.api_key.clone(),
            config_item_id: record.config_item_id.clone(),
            url: record.url.clone(),
        }
    }
}

/// Whether the cheapest offer is picked per search URL or across both configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinScope {
    /// Group by supplier, signature and URL
    PerUrl,
    /// Group by supplier and signature
    Pooled,
}

/// Records whose amount equals the minimum of their group; ties keep all
fn cheapest<'a, K, F>(records: &'a [PriceRecord], key: F) -> Vec<&'a PriceRecord>
where
    K: Eq + Hash,
    F: Fn(&'a PriceRecord) -> K,
{
    let mut minimum: HashMap<K, Amount> = HashMap::new();
    for record in records {
        minimum
            .entry(key(record))
            .and_modify(|m| {
                if record.amount < *m {
                    *m = record.amount;
                }
            })
            .or_insert(record.amount);
    }

    records
        .iter()
        .filter(|record| minimum.get(&key(*record)) == Some(&record.amount))
        .collect()
}

/// Drop exact duplicate rows, keeping first-occurrence order
fn dedup<T: Eq + Hash + Clone>(rows: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    rows.into_iter().filter(|row| seen.insert(row.clone())).collect()
}

/// Cheapest offers with direction metadata attached, deduplicated
pub fn min_recommendations(
    recommendations: &[PriceRecord],
    directions: &[DirectionUrls],
    scope: MinScope,
) -> Vec<MinRecommendation> {
    let winners = match scope {
        MinScope::PerUrl => cheapest(recommendations, |r| {
            (
                r.validating_supplier.as_str(),
                r.route_signature.as_str(),
                Some(r.url.as_str()),
            )
        }),
        MinScope::Pooled => cheapest(recommendations, |r| {
            (r.validating_supplier.as_str(), r.route_signature.as_str(), None::<&str>)
        }),
    };

    let index = UrlIndex::new(directions);
    let projected = dedup(
        winners
            .into_iter()
            .map(|record| MinRecommendation::project(record, DirectionInfo::default()))
            .collect::<Vec<_>>(),
    );

    dedup(
        projected
            .into_iter()
            .flat_map(|row| {
                index.lookup(&row.url).into_iter().map(move |info| MinRecommendation {
                    info,
                    ..row.clone()
                })
            })
            .collect::<Vec<_>>(),
    )
}

/// Grouping key of the per-direction summary
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub direction: String,
    pub api_key: String,
    pub config_item_id: String,
    pub gds_id: String,
    pub config_id: String,
    pub validating_supplier: String,
    pub popularity: i64,
    pub departure: String,
    pub arrival: String,
}

/// Cheapest offers aggregated per direction and source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionGroup {
    pub key: GroupKey,
    pub count_itineraries: usize,
    pub min_amount: Amount,
    pub count_trips: usize,
}

/// Group rows by direction and source; rows without direction metadata are skipped
pub fn group_by_direction(rows: &[MinRecommendation]) -> Vec<DirectionGroup> {
    let mut groups: BTreeMap<GroupKey, DirectionGroup> = BTreeMap::new();

    for row in rows {
        let (Some(direction), Some(popularity), Some(departure), Some(arrival)) = (
            row.info.direction.as_ref(),
            row.info.popularity,
            row.info.departure.as_ref(),
            row.info.arrival.as_ref(),
        ) else {
            continue;
        };

        let key = GroupKey {
            direction: direction.clone(),
            api_key: row.api_key.clone(),
            config_item_id: row.config_item_id.clone(),
            gds_id: row.gds_id.clone(),
            config_id: row.config_id.clone(),
            validating_supplier: row.validating_supplier.clone(),
            popularity,
            departure: departure.clone(),
            arrival: arrival.clone(),
        };

        groups
            .entry(key.clone())
            .and_modify(|group| {
                group.count_itineraries += 1;
                group.count_trips += 1;
                group.min_amount = group.min_amount.min(row.amount);
            })
            .or_insert(DirectionGroup {
                key,
                count_itineraries: 1,
                min_amount: row.amount,
                count_trips: 1,
            });
    }

    groups.into_values().collect()
}

/// Cheapest and dearest offer of one itinerary across URLs
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSpread {
    pub route_signature: String,
    pub min: f64,
    pub max: f64,
    pub diff: f64,
    /// `100 * diff / max`; `None` when `max` is zero
    pub percent_diff: Option<f64>,
}

/// Price spread per route signature
pub fn price_spread(rows: &[MinRecommendation]) -> Vec<PriceSpread> {
    let mut bounds: BTreeMap<&str, (Amount, Amount)> = BTreeMap::new();
    for row in rows {
        bounds
            .entry(row.route_signature.as_str())
            .and_modify(|(lo, hi)| {
                *lo = (*lo).min(row.amount);
                *hi = (*hi).max(row.amount);
            })
            .or_insert((row.amount, row.amount));
    }

    bounds
        .into_iter()
        .map(|(signature, (lo, hi))| {
            let (min, max) = (lo.value(), hi.value());
            let diff = max - min;
            PriceSpread {
                route_signature: signature.to_string(),
                min,
                max,
                diff,
                percent_diff: (max != 0.0).then(|| 100.0 * diff / max),
            }
        })
        .collect()
}

impl PriceDiffStatistics {
    pub fn of(spread: &[PriceSpread]) -> Self {
        Self {
            min: Describe::of(spread.iter().map(|s| s.min)),
            max: Describe::of(spread.iter().map(|s| s.max)),
            diff: Describe::of(spread.iter().map(|s| s.diff)),
            percent_diff: Describe::of(spread.iter().filter_map(|s| s.percent_diff)),
        }
    }
}

/// Build the comparison report from pooled recommendations of both configurations
///
/// Pure: the same inputs always produce the same report.
pub fn compare_configurations(
    directions: &[DirectionUrls],
    recommendations: &[PriceRecord],
    stats: FlattenStats,
) -> ComparisonReport {
    let per_url = min_recommendations(recommendations, directions, MinScope::PerUrl);
    let pooled = min_recommendations(recommendations, directions, MinScope::Pooled);
    let groups = group_by_direction(&pooled);
    let spread = price_spread(&per_url);

    let distinct_directions: BTreeSet<&str> =
        groups.iter().map(|g| g.key.direction.as_str()).collect();

    ComparisonReport {
        count_directions: distinct_directions.len(),
        count_min_recommendations: pooled.len(),
        count_recommendations: recommendations.len(),
        count_failed_fetches: stats.failed_fetches,
        count_malformed_records: stats.malformed(),

        top_3_directions: directions
            .iter()
            .take(3)
            .map(|d| d.direction.direction.clone())
            .collect(),
        top_suppliers_by_recommendations: value_counts(
            pooled.iter().map(|r| r.validating_supplier.as_str()),
        ),
        top_suppliers_by_directions: value_counts(
            groups.iter().map(|g| g.key.validating_supplier.as_str()),
        ),

        top_api_keys_by_directions: value_counts(groups.iter().map(|g| g.key.api_key.as_str())),
        top_api_keys_by_min_recommendations: value_counts(pooled.iter().map(|r| r.api_key.as_str())),
        top_api_keys_by_recommendations: value_counts(
            recommendations.iter().map(|r| r.api_key.as_str()),
        ),

        avia_config_item_ids_by_directions: value_counts(
            groups.iter().map(|g| g.key.config_item_id.as_str()),
        ),
        avia_config_item_ids_by_min_recommendations: value_counts(
            pooled.iter().map(|r| r.config_item_id.as_str()),
        ),
        avia_config_item_ids_by_recommendations: value_counts(
            recommendations.iter().map(|r| r.config_item_id.as_str()),
        ),

        top_config_ids_min_recommendations_from: value_counts(
            pooled.iter().map(|r| r.config_id.as_str()),
        ),
        top_config_ids_recommendations_from: value_counts(
            recommendations.iter().map(|r| r.config_id.as_str()),
        ),
        top_gds_ids_min_recommendations_from: value_counts(pooled.iter().map(|r| r.gds_id.as_str())),
        top_gds_ids_recommendations_from: value_counts(
            recommendations.iter().map(|r| r.gds_id.as_str()),
        ),

        top_config_ids_directions_from: value_counts(groups.iter().map(|g| g.key.config_id.as_str())),
        top_gds_ids_directions_from: value_counts(groups.iter().map(|g| g.key.gds_id.as_str())),

        price_diff_statistics: PriceDiffStatistics::of(&spread),
    }
}
