//! Fare-rule completeness analysis
//!
//! Segment rows are projected to the fare, baggage, refund and exchange
//! columns and deduplicated. Every count in the report is a count of
//! distinct fare codes, not of rows.

use std::collections::{BTreeSet, HashSet};

use crate::flatten::types::BaggageBlock;
use crate::flatten::{FareRecord, FlattenStats};
use crate::models::{Configuration, Direction};
use crate::report::{
    BaggageSummary, DetailedFares, ExchangeSummary, MinirulesReport, RefundSummary,
};

/// Before-departure availability of a refund or exchange
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionFlags {
    pub available: Option<bool>,
    pub is_free: Option<bool>,
}

/// One segment's fare data, projected for comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FareRow {
    pub gds_id: String,
    pub config_id: String,
    pub route_signature: String,
    pub api_key: String,
    pub config_item_id: String,
    pub validating_supplier: String,
    pub route_index: String,
    pub segment_index: String,
    pub fare_code: String,
    pub supplier_code: String,
    pub service_class: Option<String>,
    pub baggage: Option<String>,
    pub refund: Option<bool>,
    pub exchange: Option<bool>,
    pub refund_comment: Option<String>,
    pub exchange_comment: Option<String>,
    pub baggage_block: BaggageBlock,
    pub refund_before_departure: ConditionFlags,
    pub exchange_before_departure: ConditionFlags,
}

impl FareRow {
    pub fn project(record: &FareRecord) -> Self {
        let segment = &record.segment;
        let rules = &segment.mini_rules.system_rules;
        Self {
            gds_id: record.gds_id.clone(),
            config_id: record.config_id.clone(),
            route_signature: record.route_signature.clone(),
            api_key: record.api_key.clone(),
            config_item_id: record.config_item_id.clone(),
            validating_supplier: record.validating_supplier.clone(),
            route_index: record.route_index.clone(),
            segment_index: segment.segment_index.clone(),
            fare_code: record.fare_code.clone(),
            supplier_code: segment.supplier_code.clone(),
            service_class: segment.service_class.clone(),
            baggage: segment.baggage.clone(),
            refund: rules.refund,
            exchange: rules.exchange,
            refund_comment: rules.refund_comment.clone(),
            exchange_comment: rules.exchange_comment.clone(),
            baggage_block: rules.baggage_block.clone(),
            refund_before_departure: ConditionFlags {
                available: rules.refund_block.before_departure.available,
                is_free: rules.refund_block.before_departure.is_free,
            },
            exchange_before_departure: ConditionFlags {
                available: rules.exchange_block.before_departure.available,
                is_free: rules.exchange_block.before_departure.is_free,
            },
        }
    }

    fn has_accessories(&self) -> bool {
        let accessories = &self.baggage_block.accessories;
        accessories.piece.is_some() || accessories.weight.is_some()
    }

    fn has_carryon(&self) -> bool {
        let carryon = &self.baggage_block.carryon;
        carryon.piece.is_some() || carryon.weight.value.is_some()
    }
}

/// Distinct projected rows in first-occurrence order
pub fn unique_fares(records: &[FareRecord]) -> Vec<FareRow> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(FareRow::project)
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

/// Distinct fare codes of rows matching `predicate`
fn codes_where<F>(rows: &[FareRow], predicate: F) -> BTreeSet<&str>
where
    F: Fn(&FareRow) -> bool,
{
    rows.iter()
        .filter(|row| predicate(*row))
        .map(|row| row.fare_code.as_str())
        .collect()
}

fn sorted<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Build the completeness report for one configuration's fares
pub fn analyze_fare_rules(
    supplier_code: &str,
    configuration: &Configuration,
    directions: &[Direction],
    records: &[FareRecord],
    stats: FlattenStats,
) -> MinirulesReport {
    let rows = unique_fares(records);

    let all = codes_where(&rows, |_| true);
    let baggage_missing = codes_where(&rows, |r| r.baggage.is_none());
    let baggage_present = codes_where(&rows, |r| r.baggage.is_some());
    let refund_missing = codes_where(&rows, |r| r.refund.is_none());
    let exchange_missing = codes_where(&rows, |r| r.exchange.is_none());
    let without_accessories_and_carryon =
        codes_where(&rows, |r| !r.has_accessories() && !r.has_carryon());

    let baggage_mixed = baggage_missing.intersection(&baggage_present).next().is_some();

    MinirulesReport {
        supplier_code: supplier_code.to_string(),
        avia_config_item_ids: configuration.config_item_id.clone(),
        api_key: configuration.api_key.clone(),
        gds_id: sorted(rows.iter().map(|r| r.gds_id.as_str())),
        config_id: sorted(rows.iter().map(|r| r.config_id.as_str())),
        directions: sorted(directions.iter().map(|d| d.direction.as_str())),
        count_unique_fares: all.len(),
        count_failed_fetches: stats.failed_fetches,
        count_malformed_records: stats.malformed(),
        check_accessories_and_carryon_flag: !without_accessories_and_carryon.is_empty(),
        check_laggage_flag: !baggage_mixed,
        check_exchange_flag: exchange_missing.is_empty(),
        check_refund_flag: refund_missing.is_empty(),
        baggage_block: BaggageSummary {
            count_unique_fares_wo_accessories_and_carryon: without_accessories_and_carryon.len(),
            count_unique_carryon_fares: codes_where(&rows, FareRow::has_carryon).len(),
            count_unique_accessories_fares: codes_where(&rows, FareRow::has_accessories).len(),
            count_unique_fares_with_no_data_baggage: baggage_missing.len(),
        },
        refund_block: RefundSummary {
            count_unique_fares_wo_refund: codes_where(&rows, |r| r.refund == Some(false)).len(),
            count_unique_fares_with_no_data_refund: refund_missing.len(),
            count_unique_fares_refundable: codes_where(&rows, |r| r.refund == Some(true)).len(),
        },
        exchange_block: ExchangeSummary {
            count_unique_fares_wo_exchange: codes_where(&rows, |r| r.exchange == Some(false)).len(),
            count_unique_fares_with_no_data_exchange: exchange_missing.len(),
            count_unique_fares_exchangeable: codes_where(&rows, |r| r.exchange == Some(true))
                .len(),
        },
        detailed: DetailedFares {
            unique_fares: sorted(all.iter().copied()),
            fares_with_no_data_baggage: sorted(baggage_missing.iter().copied()),
            unique_fares_with_no_data_accessories_and_carryon: sorted(
                without_accessories_and_carryon.iter().copied(),
            ),
            unique_fares_with_no_data_refund: sorted(refund_missing.iter().copied()),
            unique_fares_with_no_data_exchange: sorted(exchange_missing.iter().copied()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten_fare_rules;
    use crate::flatten::tests::{document, recommendation, segment, success};
    use serde_json::{json, Value};

    fn with_rules(mut seg: Value, fare_code: &str, baggage: Value, rules: Value) -> Value {
        seg["fare_code"] = json!(fare_code);
        seg["baggage"] = baggage;
        seg["mini_rules"] = json!({ "system_rules": rules });
        seg
    }

    fn records(segments: Vec<Value>) -> Vec<FareRecord> {
        let recs = segments
            .into_iter()
            .enumerate()
            .map(|(i, seg)| recommendation(&format!("t{}", i), 100.0, vec![seg]))
            .collect();
        let flat = flatten_fare_rules(&[success("u", document(recs))], &config());
        flat.records
    }

    fn config() -> Configuration {
        Configuration::new("key", "2164")
    }

    fn analyze(records: &[FareRecord]) -> MinirulesReport {
        let directions = vec![
            Direction::new("SU", "MOWLED", 1).unwrap(),
            Direction::new("SU", "LEDMOW", 2).unwrap(),
        ];
        analyze_fare_rules("SU", &config(), &directions, records, FlattenStats::default())
    }

    fn complete_rules() -> Value {
        json!({
            "refund": true,
            "exchange": true,
            "baggage_block": {
                "carryon": {"piece": 1, "weight": {"type": "kg", "value": 10}}
            }
        })
    }

    #[test]
    fn test_mixed_baggage_clears_flag() {
        let recs = records(vec![
            with_rules(segment(0, "MOW", "LED", "SU", "10"), "YFARE", json!("1PC"), complete_rules()),
            with_rules(segment(0, "MOW", "LED", "SU", "11"), "YFARE", Value::Null, complete_rules()),
        ]);

        let report = analyze(&recs);

        assert!(!report.check_laggage_flag);
        assert!(report.baggage_block.count_unique_fares_with_no_data_baggage >= 1);
        assert_eq!(report.detailed.fares_with_no_data_baggage, vec!["YFARE"]);
        assert_eq!(report.count_unique_fares, 1);
    }

    #[test]
    fn test_complete_fares_pass_every_check() {
        let recs = records(vec![
            with_rules(segment(0, "MOW", "LED", "SU", "10"), "YFARE", json!("1PC"), complete_rules()),
            with_rules(segment(0, "MOW", "LED", "SU", "12"), "BFARE", json!("2PC"), complete_rules()),
        ]);

        let report = analyze(&recs);

        assert!(report.check_laggage_flag);
        assert!(report.check_refund_flag);
        assert!(report.check_exchange_flag);
        assert!(!report.check_accessories_and_carryon_flag);
        assert_eq!(report.baggage_block.count_unique_carryon_fares, 2);
        assert_eq!(report.baggage_block.count_unique_accessories_fares, 0);
        assert_eq!(report.refund_block.count_unique_fares_refundable, 2);
        assert_eq!(report.detailed.unique_fares, vec!["BFARE", "YFARE"]);
        assert_eq!(report.directions, vec!["LEDMOW", "MOWLED"]);
        assert_eq!(report.gds_id, vec!["1"]);
    }

    #[test]
    fn test_tri_state_refund_and_exchange_counts() {
        let recs = records(vec![
            with_rules(
                segment(0, "MOW", "LED", "SU", "10"),
                "A",
                json!("1PC"),
                json!({"refund": true, "exchange": false}),
            ),
            with_rules(
                segment(0, "MOW", "LED", "SU", "11"),
                "B",
                json!("1PC"),
                json!({"refund": false}),
            ),
            with_rules(segment(0, "MOW", "LED", "SU", "12"), "C", json!("1PC"), json!({})),
        ]);

        let report = analyze(&recs);

        assert_eq!(report.refund_block.count_unique_fares_refundable, 1);
        assert_eq!(report.refund_block.count_unique_fares_wo_refund, 1);
        assert_eq!(report.refund_block.count_unique_fares_with_no_data_refund, 1);
        assert_eq!(report.exchange_block.count_unique_fares_wo_exchange, 1);
        assert_eq!(report.exchange_block.count_unique_fares_with_no_data_exchange, 2);
        assert_eq!(report.exchange_block.count_unique_fares_exchangeable, 0);
        assert!(!report.check_refund_flag);
        assert!(!report.check_exchange_flag);
        assert_eq!(report.detailed.unique_fares_with_no_data_exchange, vec!["B", "C"]);
        assert!(report.check_accessories_and_carryon_flag);
        assert_eq!(
            report.detailed.unique_fares_with_no_data_accessories_and_carryon,
            vec!["A", "B", "C"]
        );
    }

    #[test]
    fn test_duplicate_segments_collapse() {
        let seg = with_rules(segment(0, "MOW", "LED", "SU", "10"), "YFARE", json!("1PC"), complete_rules());
        let recs = records(vec![seg.clone(), seg]);

        assert_eq!(recs.len(), 2);
        assert_eq!(unique_fares(&recs).len(), 1);
    }

    #[test]
    fn test_no_fares_reports_zero() {
        let report = analyze(&[]);

        assert_eq!(report.count_unique_fares, 0);
        assert!(report.check_laggage_flag);
        assert!(!report.check_accessories_and_carryon_flag);
        assert!(report.detailed.unique_fares.is_empty());
        assert_eq!(report.api_key, "key");
        assert_eq!(report.avia_config_item_ids, "2164");
    }
}
