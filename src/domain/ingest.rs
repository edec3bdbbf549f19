//! Bulk ingestion: fetch, parse, and append without duplicates.

use tracing::info;

use crate::domain::error::CrossoverError;
use crate::domain::price_bar::PriceBar;
use crate::ports::bar_parser::BarParser;
use crate::ports::record_store::RecordStore;
use crate::ports::source_port::SourcePort;

/// Bars a parser accepted, plus the number of rows it rejected.
#[derive(Debug, Default)]
pub struct ParsedRows {
    pub bars: Vec<PriceBar>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct IngestReport {
    pub parsed: usize,
    pub skipped: usize,
    pub inserted: usize,
    pub duplicates: usize,
}

/// Loads every parseable row from `source` into `store` under `instrument`.
///
/// Malformed rows and bars already present are skipped; only a failure to
/// read the source or write the store is an error.
pub fn ingest(
    source: &dyn SourcePort,
    parser: &dyn BarParser,
    store: &dyn RecordStore,
    instrument: &str,
) -> Result<IngestReport, CrossoverError> {
    info!(source = %source.describe(), instrument, "fetching bars");
    let text = source.fetch_text()?;
    ingest_text(&text, parser, store, instrument)
}

pub fn ingest_text(
    text: &str,
    parser: &dyn BarParser,
    store: &dyn RecordStore,
    instrument: &str,
) -> Result<IngestReport, CrossoverError> {
    let parsed = parser.parse(text, instrument);
    let inserted = store.append_batch(&parsed.bars)?;

    let report = IngestReport {
        parsed: parsed.bars.len(),
        skipped: parsed.skipped,
        inserted,
        duplicates: parsed.bars.len() - inserted,
    };
    info!(
        parsed = report.parsed,
        skipped = report.skipped,
        inserted = report.inserted,
        duplicates = report.duplicates,
        "ingest finished"
    );
    Ok(report)
}
