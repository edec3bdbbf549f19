//! Row parser port trait.

use crate::domain::ingest::ParsedRows;

/// Turns raw source text into bars for one instrument.
///
/// Parsing never fails as a whole: rows that do not fit are counted in
/// `ParsedRows::skipped`.
pub trait BarParser {
    fn parse(&self, text: &str, instrument: &str) -> ParsedRows;
}
