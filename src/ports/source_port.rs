//! Raw tabular data source port trait.

use crate::domain::error::CrossoverError;

/// Provides the raw comma-separated text an ingestion run parses.
pub trait SourcePort {
    fn fetch_text(&self) -> Result<String, CrossoverError>;

    /// Human-readable location for logs and errors.
    fn describe(&self) -> String;
}
