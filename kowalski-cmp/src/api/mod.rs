//! HTTP API handlers for kowalski-cmp

pub mod city_filter;
pub mod comparison;
pub mod health;

pub use city_filter::city_filter_routes;
pub use comparison::comparison_routes;
pub use health::health_routes;
