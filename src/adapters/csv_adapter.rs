//! Positional CSV parser for ingested price rows.
//!
//! Row layout: `datetime, close, high, low, open, volume[, ...]`.
//! The four price columns arrive close-first and are reordered into
//! [`PriceBar`]'s open/high/low/close fields. Any row that does not fit the
//! layout is skipped and counted, never reported as an error.

use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use crate::domain::ingest::ParsedRows;
use crate::domain::price_bar::PriceBar;
use crate::domain::timestamp::parse_datetime;
use crate::ports::bar_parser::BarParser;

/// [`BarParser`] for the positional CSV layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvBarParser;

impl BarParser for CsvBarParser {
    fn parse(&self, text: &str, instrument: &str) -> ParsedRows {
        parse_bars(text, instrument)
    }
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

fn parse_record(record: &StringRecord, instrument: &str) -> Option<PriceBar> {
    let timestamp = parse_datetime(record.get(0)?)?;
    let close = parse_decimal(record.get(1)?)?;
    let high = parse_decimal(record.get(2)?)?;
    let low = parse_decimal(record.get(3)?)?;
    let open = parse_decimal(record.get(4)?)?;
    let volume: i64 = record.get(5)?.parse().ok()?;

    let bar = PriceBar {
        timestamp,
        open,
        high,
        low,
        close,
        volume,
        instrument: instrument.to_string(),
    };
    bar.validate().ok()?;
    Some(bar)
}

/// Parses every row of `text`, assigning `instrument` to each bar.
///
/// Header rows fail the date-time column and are skipped like any other
/// malformed row. Blank lines are ignored without being counted.
pub fn parse_bars(text: &str, instrument: &str) -> ParsedRows {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut parsed = ParsedRows::default();

    for (line, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!(line = line + 1, error = %e, "skipping unreadable row");
                parsed.skipped += 1;
                continue;
            }
        };

        if record.iter().all(str::is_empty) {
            continue;
        }

        match parse_record(&record, instrument) {
            Some(bar) => parsed.bars.push(bar),
            None => {
                debug!(line = line + 1, "skipping row that does not match layout");
                parsed.skipped += 1;
            }
        }
    }

    parsed
}
