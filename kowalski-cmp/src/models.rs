//! Request bodies and core domain types

use chrono::NaiveDate;
use kowalski_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Length of a direction code (departure + arrival)
pub const DIRECTION_LEN: usize = 6;

/// Fare-search filter parameters shared by both comparison bodies
///
/// Optional filters default to the empty string and are always sent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FastSearchParams {
    /// Validating airline to search for
    pub filter_airlines: String,
    pub search_date: NaiveDate,
    #[serde(default)]
    pub filter_gds: String,
    #[serde(default)]
    pub exclude_gds: String,
    /// "1" bypasses the fare-search cache
    #[serde(default = "default_force_search")]
    pub force_search: String,
    /// Empty means no segment limit
    #[serde(default)]
    pub max_segments: String,
    /// A = all, E = economy, B = business, F = first, W = comfort
    #[serde(default = "default_service_class")]
    pub service_class: String,
}

fn default_force_search() -> String {
    "1".to_string()
}

fn default_service_class() -> String {
    "A".to_string()
}

/// Body of `POST /config_comparison/`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComparisonBody {
    pub api_key_1: String,
    pub api_key_2: String,
    #[serde(default)]
    pub avia_config_item_ids_1: String,
    #[serde(default)]
    pub avia_config_item_ids_2: String,
    pub fast_search_params: FastSearchParams,
    pub directions: Vec<String>,
    pub top_directions_from_date: NaiveDate,
    #[serde(default = "default_comparison_limit")]
    pub limit_directions: i64,
}

fn default_comparison_limit() -> i64 {
    5
}

/// Which of the two compared configurations a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSlot {
    First,
    Second,
}

impl ComparisonBody {
    /// The `(api_key, config_item_id)` pair for a slot
    pub fn configuration(&self, slot: ConfigSlot) -> Configuration {
        match slot {
            ConfigSlot::First => Configuration::new(&self.api_key_1, &self.avia_config_item_ids_1),
            ConfigSlot::Second => Configuration::new(&self.api_key_2, &self.avia_config_item_ids_2),
        }
    }
}

/// Body of `POST /minirules_comparison/`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MinirulesBody {
    pub api_key: String,
    #[serde(default)]
    pub avia_config_item_ids: String,
    pub fast_search_params: FastSearchParams,
    pub directions: Vec<String>,
    pub top_directions_from_date: NaiveDate,
    #[serde(default = "default_minirules_limit")]
    pub limit_directions: i64,
}

fn default_minirules_limit() -> i64 {
    1
}

impl MinirulesBody {
    pub fn configuration(&self) -> Configuration {
        Configuration::new(&self.api_key, &self.avia_config_item_ids)
    }
}

/// One fare-search setup: API key plus config-item id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Configuration {
    pub api_key: String,
    pub config_item_id: String,
}

impl Configuration {
    pub fn new(api_key: &str, config_item_id: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            config_item_id: config_item_id.to_string(),
        }
    }
}

/// A direction selected for analysis
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Direction {
    pub supplier_code: String,
    /// Departure + arrival code, always `DIRECTION_LEN` characters
    pub direction: String,
    /// Rank or hit count; for caller-supplied directions the 1-based input position
    pub popularity: i64,
}

impl Direction {
    /// Build a direction, rejecting codes that are not exactly six characters
    pub fn new(supplier_code: &str, direction: &str, popularity: i64) -> Result<Self> {
        let len = direction.chars().count();
        if len != DIRECTION_LEN {
            return Err(Error::InvalidInput(format!(
                "direction '{}' must be {} characters, got {}",
                direction, DIRECTION_LEN, len
            )));
        }
        Ok(Self {
            supplier_code: supplier_code.to_string(),
            direction: direction.to_string(),
            popularity,
        })
    }

    pub fn route(&self) -> Route {
        let split = self
            .direction
            .char_indices()
            .nth(3)
            .map(|(idx, _)| idx)
            .unwrap_or(self.direction.len());
        Route {
            departure: self.direction[..split].to_string(),
            arrival: self.direction[split..].to_string(),
        }
    }
}

/// Departure/arrival pair derived from a direction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Route {
    pub departure: String,
    pub arrival: String,
}

/// Price in the report currency
///
/// Wraps `f64` so that flattened rows can be hashed and compared for exact
/// row deduplication. Equality is bitwise after normalising `-0.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub f64);

impl Amount {
    pub fn value(self) -> f64 {
        self.0
    }

    fn bits(self) -> u64 {
        if self.0 == 0.0 {
            0.0f64.to_bits()
        } else {
            self.0.to_bits()
        }
    }
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Amount {}

impl Hash for Amount {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> Ordering {
        if self == other {
            Ordering::Equal
        } else {
            self.0.total_cmp(&other.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_splits_at_three() {
        for code in ["MOWLED", "LEDMOW", "AAABBB", "X1Y2Z3"] {
            let direction = Direction::new("SU", code, 1).unwrap();
            let route = direction.route();
            assert_eq!(route.departure.len(), 3);
            assert_eq!(format!("{}{}", route.departure, route.arrival), code);
        }
    }

    #[test]
    fn test_direction_length_enforced() {
        assert!(Direction::new("SU", "MOWLE", 1).is_err());
        assert!(Direction::new("SU", "MOWLEDX", 1).is_err());
        assert!(Direction::new("SU", "", 1).is_err());
    }

    #[test]
    fn test_body_defaults() {
        let body: ComparisonBody = serde_json::from_value(serde_json::json!({
            "api_key_1": "k1",
            "api_key_2": "k2",
            "fast_search_params": {
                "filter_airlines": "SU",
                "search_date": "2025-03-01"
            },
            "directions": [],
            "top_directions_from_date": "2025-01-01"
        }))
        .unwrap();

        assert_eq!(body.limit_directions, 5);
        assert_eq!(body.avia_config_item_ids_1, "");
        assert_eq!(body.fast_search_params.force_search, "1");
        assert_eq!(body.fast_search_params.service_class, "A");
        assert_eq!(body.fast_search_params.max_segments, "");
        assert_eq!(
            body.configuration(ConfigSlot::Second),
            Configuration::new("k2", "")
        );
    }

    #[test]
    fn test_minirules_limit_default() {
        let body: MinirulesBody = serde_json::from_value(serde_json::json!({
            "api_key": "k",
            "fast_search_params": {
                "filter_airlines": "SU",
                "search_date": "2025-03-01"
            },
            "directions": ["MOWLED"],
            "top_directions_from_date": "2025-01-01"
        }))
        .unwrap();

        assert_eq!(body.limit_directions, 1);
        assert_eq!(body.configuration(), Configuration::new("k", ""));
    }

    #[test]
    fn test_amount_zero_sign_and_order() {
        assert_eq!(Amount(0.0), Amount(-0.0));
        assert!(Amount(5000.0) < Amount(5200.0));
    }
}
