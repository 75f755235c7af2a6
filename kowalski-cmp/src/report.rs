//! Report shapes returned by the comparison endpoints
//!
//! A comparison either produces a complete report or, when no directions
//! could be resolved, the one-key placeholder `{"Description": "..."}`.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::compare::stats::Describe;

/// Explanation returned when no directions were resolved
pub const NO_DIRECTIONS_DESCRIPTION: &str = "No data returned by sql query, make sure you set \
     params.top_directions_from_date correctly or please try again with params.directions given.";

/// Frequency table: value → occurrences
pub type ValueCounts = BTreeMap<String, usize>;

/// Complete report or placeholder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report<T> {
    Complete(T),
    Placeholder(Placeholder),
}

impl<T> Report<T> {
    pub fn no_directions() -> Self {
        Report::Placeholder(Placeholder {
            description: NO_DIRECTIONS_DESCRIPTION.to_string(),
        })
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Report::Placeholder(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    #[serde(rename = "Description")]
    pub description: String,
}

/// Two-configuration price comparison
///
/// Frequency tables come at three granularities: all recommendations, the
/// cheapest recommendation per itinerary, and per-direction groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Number of distinct directions with at least one cheapest offer, not
    /// the number of per-direction groups
    pub count_directions: usize,
    pub count_min_recommendations: usize,
    pub count_recommendations: usize,
    pub count_failed_fetches: usize,
    pub count_malformed_records: usize,

    pub top_3_directions: Vec<String>,
    pub top_suppliers_by_recommendations: ValueCounts,
    pub top_suppliers_by_directions: ValueCounts,

    pub top_api_keys_by_directions: ValueCounts,
    pub top_api_keys_by_min_recommendations: ValueCounts,
    pub top_api_keys_by_recommendations: ValueCounts,

    pub avia_config_item_ids_by_directions: ValueCounts,
    pub avia_config_item_ids_by_min_recommendations: ValueCounts,
    pub avia_config_item_ids_by_recommendations: ValueCounts,

    pub top_config_ids_min_recommendations_from: ValueCounts,
    pub top_config_ids_recommendations_from: ValueCounts,
    pub top_gds_ids_min_recommendations_from: ValueCounts,
    pub top_gds_ids_recommendations_from: ValueCounts,

    pub top_config_ids_directions_from: ValueCounts,
    pub top_gds_ids_directions_from: ValueCounts,

    pub price_diff_statistics: PriceDiffStatistics,
}

/// Per-column statistics of the cross-configuration price spread
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceDiffStatistics {
    pub min: Describe,
    pub max: Describe,
    pub diff: Describe,
    pub percent_diff: Describe,
}

/// Single-configuration fare-rule completeness report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinirulesReport {
    pub supplier_code: String,
    pub avia_config_item_ids: String,
    pub api_key: String,
    pub gds_id: Vec<String>,
    pub config_id: Vec<String>,
    pub directions: Vec<String>,
    pub count_unique_fares: usize,
    pub count_failed_fetches: usize,
    pub count_malformed_records: usize,
    pub check_accessories_and_carryon_flag: bool,
    pub check_laggage_flag: bool,
    pub check_exchange_flag: bool,
    pub check_refund_flag: bool,
    pub baggage_block: BaggageSummary,
    pub refund_block: RefundSummary,
    pub exchange_block: ExchangeSummary,
    pub detailed: DetailedFares,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaggageSummary {
    pub count_unique_fares_wo_accessories_and_carryon: usize,
    pub count_unique_carryon_fares: usize,
    pub count_unique_accessories_fares: usize,
    pub count_unique_fares_with_no_data_baggage: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundSummary {
    pub count_unique_fares_wo_refund: usize,
    pub count_unique_fares_with_no_data_refund: usize,
    pub count_unique_fares_refundable: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeSummary {
    pub count_unique_fares_wo_exchange: usize,
    pub count_unique_fares_with_no_data_exchange: usize,
    pub count_unique_fares_exchangeable: usize,
}

/// Fare codes per missing-data bucket, sorted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedFares {
    pub unique_fares: Vec<String>,
    pub fares_with_no_data_baggage: Vec<String>,
    pub unique_fares_with_no_data_accessories_and_carryon: Vec<String>,
    pub unique_fares_with_no_data_refund: Vec<String>,
    pub unique_fares_with_no_data_exchange: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_single_key() {
        let report: Report<MinirulesReport> = Report::no_directions();
        let json = serde_json::to_value(&report).unwrap();

        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object["Description"], NO_DIRECTIONS_DESCRIPTION);
        assert!(report.is_placeholder());
    }
}
