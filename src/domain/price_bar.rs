//! OHLCV price bar representation.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::domain::error::CrossoverError;
use crate::domain::timestamp;

/// Instrument assigned to bars whose source does not name one.
pub const DEFAULT_INSTRUMENT: &str = "HINDALCO";

/// Widest instrument identifier the stores accept.
pub const MAX_INSTRUMENT_LEN: usize = 64;

/// One OHLCV observation for an instrument.
///
/// Prices are decimals so they round-trip through the stores without binary
/// floating point loss. `(timestamp, instrument)` identifies a bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(alias = "datetime", deserialize_with = "timestamp::deserialize")]
    pub timestamp: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
    pub instrument: String,
}

/// A bar as persisted, with the identifier its store assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredBar {
    pub id: i64,
    #[serde(flatten)]
    pub bar: PriceBar,
}

impl PriceBar {
    pub fn validate(&self) -> Result<(), CrossoverError> {
        let instrument = self.instrument.trim();
        if instrument.is_empty() {
            return Err(CrossoverError::validation(
                "instrument",
                "instrument must not be empty",
            ));
        }
        if instrument.chars().count() > MAX_INSTRUMENT_LEN {
            return Err(CrossoverError::validation(
                "instrument",
                format!("instrument must be at most {MAX_INSTRUMENT_LEN} characters"),
            ));
        }
        if self.volume < 0 {
            return Err(CrossoverError::validation(
                "volume",
                "volume must be non-negative",
            ));
        }
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(CrossoverError::validation(
                    field,
                    format!("{field} must be non-negative"),
                ));
            }
        }
        if self.high < self.low {
            return Err(CrossoverError::validation("high", "high must not be below low"));
        }
        Ok(())
    }

    /// Close as `f64` for the signal engine.
    pub fn close_f64(&self) -> f64 {
        self.close.to_f64().unwrap_or(f64::NAN)
    }
}
