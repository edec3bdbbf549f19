//! Core domain types and logic.

pub mod price_bar;
pub mod timestamp;
pub mod moving_average;
pub mod signal;
pub mod ingest;
pub mod config_validation;
pub mod error;
