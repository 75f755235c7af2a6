//! Typed view of the fare-search response document
//!
//! Only the fields the reports read are modelled. Identifiers arrive as
//! either strings or numbers depending on the upstream build, so they are
//! normalised to `String`. Mini-rule data is sparse: every nested block is
//! optional and a `null` block reads as "all fields missing".

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Response envelope: `{"response": {"result", "session", "recommendations"}}`
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub response: EnvelopeBody,
}

#[derive(Debug, Deserialize)]
pub struct EnvelopeBody {
    pub result: ResultCode,
    pub session: Session,
    /// Kept raw so that one malformed recommendation is skipped on its own
    pub recommendations: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ResultCode {
    #[serde(deserialize_with = "scalar_string")]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    #[serde(deserialize_with = "scalar_string")]
    pub id: String,
}

/// One priced itinerary offer
#[derive(Debug, Clone, Deserialize)]
pub struct Recommendation {
    #[serde(deserialize_with = "scalar_string")]
    pub id: String,
    /// Price per currency code
    pub amount: BTreeMap<String, Value>,
    #[serde(deserialize_with = "scalar_string")]
    pub gds_id: String,
    #[serde(deserialize_with = "scalar_string")]
    pub config_id: String,
    #[serde(default)]
    pub fare: Value,
    #[serde(deserialize_with = "scalar_string")]
    pub validating_supplier: String,
    #[serde(default, deserialize_with = "null_default")]
    pub routes: Vec<RouteTree>,
}

impl Recommendation {
    /// Amount in `currency`, accepting numeric strings. Non-finite values
    /// (`"NaN"`, `"inf"`) count as missing.
    pub fn amount_in(&self, currency: &str) -> Option<f64> {
        let value = match self.amount.get(currency)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }
}

/// One leg of an itinerary
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouteTree {
    #[serde(deserialize_with = "scalar_string")]
    pub route_index: String,
    #[serde(default, deserialize_with = "null_default")]
    pub segments: Vec<Segment>,
}

/// One flight within a leg
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Segment {
    #[serde(deserialize_with = "scalar_string")]
    pub segment_index: String,
    #[serde(deserialize_with = "scalar_string")]
    pub supplier_code: String,
    #[serde(deserialize_with = "scalar_string")]
    pub departure_city: String,
    #[serde(deserialize_with = "scalar_string")]
    pub arrival_city: String,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub departure_time: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub arrival_time: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub flight_number: String,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub service_class: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub baggage: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub fare_code: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub mini_rules: MiniRules,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct MiniRules {
    #[serde(default, deserialize_with = "null_default")]
    pub system_rules: SystemRules,
}

/// Refund, exchange and baggage conditions of a fare
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct SystemRules {
    #[serde(default, deserialize_with = "opt_flag")]
    pub refund: Option<bool>,
    #[serde(default, deserialize_with = "opt_flag")]
    pub exchange: Option<bool>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub refund_comment: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub exchange_comment: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub baggage_block: BaggageBlock,
    #[serde(default, deserialize_with = "null_default")]
    pub refund_block: ConditionBlock,
    #[serde(default, deserialize_with = "null_default")]
    pub exchange_block: ConditionBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct BaggageBlock {
    #[serde(default, deserialize_with = "null_default")]
    pub accessories: Accessories,
    #[serde(default, deserialize_with = "null_default")]
    pub luggage: Allowance,
    #[serde(default, deserialize_with = "null_default")]
    pub carryon: CarryOn,
}

/// Personal items; weight is a bare scalar here
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Accessories {
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub piece: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub weight: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Allowance {
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub piece: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub weight: Weight,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct CarryOn {
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub piece: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub weight: Weight,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub dimensions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Weight {
    #[serde(rename = "type", default, deserialize_with = "opt_scalar_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub value: Option<String>,
}

/// Refund or exchange conditions
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ConditionBlock {
    #[serde(default, deserialize_with = "null_default")]
    pub before_departure: Condition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Condition {
    #[serde(default, deserialize_with = "opt_flag")]
    pub available: Option<bool>,
    #[serde(default, deserialize_with = "opt_flag")]
    pub is_free: Option<bool>,
    #[serde(default, deserialize_with = "opt_scalar_string")]
    pub comment: Option<String>,
}

/// Any JSON scalar as a string; `null` is rejected
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Err(de::Error::custom("expected a value, found null")),
        value => Ok(value_to_string(value)),
    }
}

/// Any JSON value as an optional string; `null` and `""` are missing
fn opt_scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        value => Some(value_to_string(value)),
    })
}

/// Tri-state flag from bool, 0/1 or "true"/"false"; anything else is missing
fn opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// `null` reads as `T::default()`
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
