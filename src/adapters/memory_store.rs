//! In-process record store.
//!
//! Holds bars in a mutex-guarded ordered map keyed by `(instrument, timestamp)`.
//! Identifiers come from an atomic counter owned by the store, starting at 1.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::domain::error::CrossoverError;
use crate::domain::price_bar::{PriceBar, StoredBar};
use crate::ports::record_store::RecordStore;

type BarKey = (String, NaiveDateTime);

pub struct MemoryStore {
    bars: Mutex<BTreeMap<BarKey, StoredBar>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            bars: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<BarKey, StoredBar>>, CrossoverError> {
        self.bars.lock().map_err(|e| CrossoverError::Database {
            reason: format!("memory store lock poisoned: {e}"),
        })
    }

    fn insert_locked(
        &self,
        bars: &mut BTreeMap<BarKey, StoredBar>,
        bar: &PriceBar,
    ) -> Option<StoredBar> {
        match bars.entry((bar.instrument.clone(), bar.timestamp)) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let stored = StoredBar {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst),
                    bar: bar.clone(),
                };
                slot.insert(stored.clone());
                Some(stored)
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, bar: &PriceBar) -> Result<StoredBar, CrossoverError> {
        let mut bars = self.lock()?;
        self.insert_locked(&mut bars, bar)
            .ok_or_else(|| CrossoverError::Duplicate {
                instrument: bar.instrument.clone(),
                timestamp: bar.timestamp,
            })
    }

    fn append(&self, bar: &PriceBar) -> Result<Option<StoredBar>, CrossoverError> {
        let mut bars = self.lock()?;
        Ok(self.insert_locked(&mut bars, bar))
    }

    fn append_batch(&self, batch: &[PriceBar]) -> Result<usize, CrossoverError> {
        let mut bars = self.lock()?;
        Ok(batch
            .iter()
            .filter_map(|bar| self.insert_locked(&mut bars, bar))
            .count())
    }

    fn list(&self, instrument: &str) -> Result<Vec<StoredBar>, CrossoverError> {
        let bars = self.lock()?;
        Ok(bars
            .values()
            .filter(|stored| stored.bar.instrument == instrument)
            .cloned()
            .collect())
    }

    fn list_all(&self) -> Result<Vec<StoredBar>, CrossoverError> {
        let bars = self.lock()?;
        Ok(bars.values().cloned().collect())
    }
}
