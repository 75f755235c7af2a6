//! Comparison and aggregation engine

pub mod config;
pub mod minirules;
pub mod stats;

pub use config::{compare_configurations, DirectionUrls};
pub use minirules::analyze_fare_rules;
