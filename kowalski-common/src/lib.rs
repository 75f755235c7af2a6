//! # Kowalski Common Library
//!
//! Shared code for Kowalski services:
//! - Error and result types
//! - Bootstrap configuration loading

pub mod config;
pub mod error;

pub use error::{Error, Result};
