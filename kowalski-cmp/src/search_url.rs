//! Fare-search request URL construction

use crate::models::{Configuration, FastSearchParams, Route};

/// Date format expected by the fare-search core
const SEARCH_DATE_FORMAT: &str = "%d-%m-%Y";

/// Build one fully-parameterized fare-search URL
///
/// Pure and deterministic. The resulting string doubles as the join key that
/// ties fetched recommendations back to their direction, so parameter order
/// is fixed. Filter values are passed verbatim and empty filters are kept.
pub fn build_search_url(
    base_url: &str,
    route: &Route,
    configuration: &Configuration,
    params: &FastSearchParams,
) -> String {
    let date = params.search_date.format(SEARCH_DATE_FORMAT).to_string();

    let query = [
        ("account_code[0][code]", ""),
        ("account_code[0][gds_id]", ""),
        ("adt", "1"),
        ("avia_config_item_ids[0]", configuration.config_item_id.as_str()),
        ("chd", "0"),
        ("count", ""),
        ("destinations[0][arrival]", route.arrival.as_str()),
        ("destinations[0][date]", date.as_str()),
        ("destinations[0][departure]", route.departure.as_str()),
        ("disable_estream", "1"),
        ("disable_pre_filters", "0"),
        ("exclude_airlines", ""),
        ("exclude_gds", params.exclude_gds.as_str()),
        ("filter_airlines", params.filter_airlines.as_str()),
        ("filter_gds", params.filter_gds.as_str()),
        ("force_search", params.force_search.as_str()),
        ("include_pricer", "0"),
        ("inf", "0"),
        ("ins", "0"),
        ("is_test", "1"),
        ("key", configuration.api_key.as_str()),
        ("lang", "en"),
        ("loyalty_code", ""),
        ("max_segments", params.max_segments.as_str()),
        ("min_pass_count", ""),
        ("mpis", "0"),
        ("service_class", params.service_class.as_str()),
        ("src", "0"),
        ("strategy", ""),
        ("yth", "0"),
    ]
    .iter()
    .map(|(key, value)| format!("{}={}", key, value))
    .collect::<Vec<_>>()
    .join("&");

    format!("{}?{}", base_url, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const BASE: &str = "https://search.example/avia/fast_search.json";

    fn params() -> FastSearchParams {
        FastSearchParams {
            filter_airlines: "SU".to_string(),
            search_date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            filter_gds: String::new(),
            exclude_gds: "12".to_string(),
            force_search: "1".to_string(),
            max_segments: String::new(),
            service_class: "E".to_string(),
        }
    }

    fn route() -> Route {
        Route {
            departure: "MOW".to_string(),
            arrival: "LED".to_string(),
        }
    }

    fn query_pairs(url: &str) -> Vec<(String, String)> {
        let (_, query) = url.split_once('?').unwrap();
        query
            .split('&')
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap();
                (k.to_string(), v.to_string())
            })
            .collect()
    }

    fn value<'a>(pairs: &'a [(String, String)], key: &str) -> &'a str {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing query parameter {}", key))
    }

    #[test]
    fn test_date_formatted_day_first() {
        let url = build_search_url(BASE, &route(), &Configuration::new("key", "7"), &params());
        let pairs = query_pairs(&url);
        assert_eq!(value(&pairs, "destinations[0][date]"), "07-03-2025");
    }

    #[test]
    fn test_route_and_configuration_encoded() {
        let url = build_search_url(BASE, &route(), &Configuration::new("abc", "2164"), &params());
        let pairs = query_pairs(&url);

        assert!(url.starts_with(BASE));
        assert_eq!(value(&pairs, "destinations[0][departure]"), "MOW");
        assert_eq!(value(&pairs, "destinations[0][arrival]"), "LED");
        assert_eq!(value(&pairs, "key"), "abc");
        assert_eq!(value(&pairs, "avia_config_item_ids[0]"), "2164");
        assert_eq!(value(&pairs, "exclude_gds"), "12");
        assert_eq!(value(&pairs, "service_class"), "E");
    }

    #[test]
    fn test_empty_filters_never_omitted() {
        let url = build_search_url(BASE, &route(), &Configuration::new("abc", ""), &params());
        let pairs = query_pairs(&url);

        for key in ["filter_gds", "max_segments", "avia_config_item_ids[0]"] {
            assert_eq!(value(&pairs, key), "");
        }
        assert_eq!(value(&pairs, "force_search"), "1");
    }

    #[test]
    fn test_configurations_produce_distinct_urls() {
        let first = build_search_url(BASE, &route(), &Configuration::new("a", ""), &params());
        let second = build_search_url(BASE, &route(), &Configuration::new("b", "2164"), &params());
        let again = build_search_url(BASE, &route(), &Configuration::new("a", ""), &params());

        assert_ne!(first, second);
        assert_eq!(first, again);
    }
}
