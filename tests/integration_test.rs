//! End-to-end tests across the store, ingestion, and signal engine.

mod common;

use approx::assert_relative_eq;
use common::*;
use crossover::adapters::csv_adapter::CsvBarParser;
use crossover::adapters::memory_store::MemoryStore;
use crossover::domain::error::CrossoverError;
use crossover::domain::ingest::ingest_text;
use crossover::domain::signal::{SmaCrossover, TradeAction};
use crossover::ports::record_store::RecordStore;

fn check_duplicate_rejection(store: &dyn RecordStore) {
    let bar = make_bar("HINDALCO", day(1), 100);

    let first = store.insert(&bar).unwrap();
    assert!(first.id > 0);

    match store.insert(&bar) {
        Err(CrossoverError::Duplicate {
            instrument,
            timestamp,
        }) => {
            assert_eq!(instrument, "HINDALCO");
            assert_eq!(timestamp, day(1));
        }
        other => panic!("expected Duplicate, got {other:?}"),
    }
    assert!(store.append(&bar).unwrap().is_none());

    let listed = store.list("HINDALCO").unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], first);
}

fn check_instruments_are_separate_keys(store: &dyn RecordStore) {
    store.insert(&make_bar("HINDALCO", day(1), 100)).unwrap();
    store.insert(&make_bar("TATASTEEL", day(1), 150)).unwrap();

    assert_eq!(store.count("HINDALCO").unwrap(), 1);
    assert_eq!(store.count("TATASTEEL").unwrap(), 1);

    let all = store.list_all().unwrap();
    let instruments: Vec<&str> = all.iter().map(|b| b.bar.instrument.as_str()).collect();
    assert_eq!(instruments, vec!["HINDALCO", "TATASTEEL"]);
}

fn check_list_orders_by_time(store: &dyn RecordStore) {
    for d in [3, 1, 2] {
        store.append(&make_bar("HINDALCO", day(d), d as i64)).unwrap();
    }
    let listed = store.list("HINDALCO").unwrap();
    let days: Vec<_> = listed.iter().map(|b| b.bar.timestamp).collect();
    assert_eq!(days, vec![day(1), day(2), day(3)]);

    let mut ids: Vec<i64> = listed.iter().map(|b| b.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

fn check_crossover_over_stored_bars(store: &dyn RecordStore) {
    let report = ingest_text(&csv_rows(&[100, 102, 104]), &CsvBarParser, store, "HINDALCO").unwrap();
    assert_eq!(report.inserted, 3);

    let bars = store.list("HINDALCO").unwrap();
    let summary = SmaCrossover::new(1, 2).unwrap().evaluate_bars(&bars).unwrap();

    assert_eq!(summary.num_trades, 1);
    assert_eq!(summary.trades[0].action, TradeAction::Buy);
    assert_eq!(summary.trades[0].index, 1);
    assert_eq!(summary.trades[1].action, TradeAction::Sell);
    assert_eq!(summary.trades[1].timestamp, day(3));
    assert_relative_eq!(summary.total_return_percent, 200.0 / 102.0, epsilon = 1e-9);
}

#[test]
fn memory_store_contract() {
    check_duplicate_rejection(&MemoryStore::new());
    check_instruments_are_separate_keys(&MemoryStore::new());
    check_list_orders_by_time(&MemoryStore::new());
    check_crossover_over_stored_bars(&MemoryStore::new());
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use crossover::adapters::sqlite_adapter::SqliteAdapter;

    fn store() -> SqliteAdapter {
        let store = SqliteAdapter::in_memory().unwrap();
        store.initialize_schema().unwrap();
        store
    }

    #[test]
    fn sqlite_store_contract() {
        check_duplicate_rejection(&store());
        check_instruments_are_separate_keys(&store());
        check_list_orders_by_time(&store());
        check_crossover_over_stored_bars(&store());
    }

    #[test]
    fn file_database_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.db");
        let ini = format!("[database]\npath = {}\n", path.display());
        let config =
            crossover::adapters::file_config_adapter::FileConfigAdapter::from_string(&ini)
                .unwrap();

        {
            let store = SqliteAdapter::from_config(&config).unwrap();
            store.initialize_schema().unwrap();
            ingest_text(&csv_rows(&[10, 11, 12]), &CsvBarParser, &store, "HINDALCO").unwrap();
        }

        let store = SqliteAdapter::from_config(&config).unwrap();
        store.initialize_schema().unwrap();
        assert_eq!(store.count("HINDALCO").unwrap(), 3);

        let again = ingest_text(&csv_rows(&[10, 11, 12]), &CsvBarParser, &store, "HINDALCO").unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.duplicates, 3);
    }
}

#[test]
fn round_trip_then_exit_on_cross_down() {
    let store = MemoryStore::new();
    store
        .append_batch(&make_series("HINDALCO", &[100, 102, 104, 100, 98]))
        .unwrap();

    let summary = SmaCrossover::new(1, 2)
        .unwrap()
        .evaluate_bars(&store.list("HINDALCO").unwrap())
        .unwrap();

    assert_eq!(summary.num_trades, 1);
    assert_eq!(summary.buy_signals, 1);
    assert_eq!(summary.sell_signals, 1);
    assert_eq!(summary.trades[1].index, 3);
    assert_relative_eq!(summary.total_return_percent, -200.0 / 102.0, epsilon = 1e-9);
}

#[test]
fn long_window_wider_than_history_yields_nothing() {
    let store = MemoryStore::new();
    store
        .append_batch(&make_series("HINDALCO", &[100, 102, 104]))
        .unwrap();

    let summary = SmaCrossover::new(2, 5)
        .unwrap()
        .evaluate_bars(&store.list("HINDALCO").unwrap())
        .unwrap();

    assert_eq!(summary.num_trades, 0);
    assert!(summary.trades.is_empty());
    assert_eq!(summary.total_return_percent, 0.0);
}

#[test]
fn unknown_instrument_evaluates_empty() {
    let store = MemoryStore::new();
    let summary = SmaCrossover::new(20, 50)
        .unwrap()
        .evaluate_bars(&store.list("NOPE").unwrap())
        .unwrap();
    assert_eq!(summary.num_trades, 0);
}
