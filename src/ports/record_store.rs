//! Record store port trait.

use crate::domain::error::CrossoverError;
use crate::domain::price_bar::{PriceBar, StoredBar};

/// Persistence for price bars keyed by `(timestamp, instrument)`.
///
/// Every implementation performs its duplicate check and insert as one atomic
/// operation. Bars are never updated or deleted.
pub trait RecordStore {
    /// Strict insert for user-submitted bars: a duplicate key is
    /// `CrossoverError::Duplicate` and leaves the store unchanged.
    fn insert(&self, bar: &PriceBar) -> Result<StoredBar, CrossoverError>;

    /// Skip-on-duplicate insert for bulk loads. `None` when the key exists.
    fn append(&self, bar: &PriceBar) -> Result<Option<StoredBar>, CrossoverError>;

    /// Skip-on-duplicate insert of a batch as one unit. Returns the number of
    /// bars actually inserted.
    fn append_batch(&self, bars: &[PriceBar]) -> Result<usize, CrossoverError>;

    /// Bars for one instrument, ascending by timestamp.
    fn list(&self, instrument: &str) -> Result<Vec<StoredBar>, CrossoverError>;

    /// Every bar, ordered by instrument then timestamp.
    fn list_all(&self) -> Result<Vec<StoredBar>, CrossoverError>;

    fn count(&self, instrument: &str) -> Result<usize, CrossoverError> {
        Ok(self.list(instrument)?.len())
    }
}
