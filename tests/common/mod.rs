#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use crossover::domain::price_bar::PriceBar;
use rust_decimal::Decimal;
use std::io::Write;

pub fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// A bar whose four prices all sit at `close`.
pub fn make_bar(instrument: &str, timestamp: NaiveDateTime, close: i64) -> PriceBar {
    let price = Decimal::from(close);
    PriceBar {
        timestamp,
        open: price,
        high: price,
        low: price,
        close: price,
        volume: 1_000,
        instrument: instrument.to_string(),
    }
}

/// One bar per day starting on 2025-01-01.
pub fn make_series(instrument: &str, closes: &[i64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(instrument, day(i as u32 + 1), c))
        .collect()
}

/// CSV text in the positional `datetime, close, high, low, open, volume` layout.
pub fn csv_rows(closes: &[i64]) -> String {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| format!("2025-01-{:02},{c},{c},{c},{c},1000\n", i + 1))
        .collect()
}

pub fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
