//! SQLite record store.
//!
//! Prices are stored as TEXT decimal strings so they come back exactly as
//! written. `UNIQUE (instrument, timestamp)` makes the duplicate check part of
//! the insert itself.

use crate::domain::config_validation::pool_size;
use crate::domain::error::CrossoverError;
use crate::domain::price_bar::{PriceBar, StoredBar};
use crate::ports::config_port::ConfigPort;
use crate::ports::record_store::RecordStore;
use chrono::NaiveDateTime;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{ErrorCode, Row, params};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const SELECT_COLUMNS: &str =
    "SELECT id, timestamp, open, high, low, close, volume, instrument FROM price_bars";

const INSERT_SKIP: &str = "INSERT INTO price_bars (timestamp, open, high, low, close, volume, instrument)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT (instrument, timestamp) DO NOTHING";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, CrossoverError> {
        let db_path = config.require_string("database", "path")?;

        if db_path == ":memory:" {
            return Self::in_memory();
        }

        let max_size = pool_size(config)?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(max_size)
                .build(manager)
                .map_err(|e: r2d2::Error| CrossoverError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, CrossoverError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| CrossoverError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, CrossoverError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| CrossoverError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), CrossoverError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS price_bars (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                open TEXT NOT NULL,
                high TEXT NOT NULL,
                low TEXT NOT NULL,
                close TEXT NOT NULL,
                volume INTEGER NOT NULL,
                instrument TEXT NOT NULL DEFAULT 'HINDALCO',
                UNIQUE (instrument, timestamp)
            );
            CREATE INDEX IF NOT EXISTS idx_price_bars_timestamp ON price_bars(timestamp);",
        )
        .map_err(query_error)?;

        Ok(())
    }

    fn query_bars(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<StoredBar>, CrossoverError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(query_error)?;
        let rows = stmt.query_map(params, row_to_bar).map_err(query_error)?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row.map_err(query_error)?);
        }
        Ok(bars)
    }
}

fn query_error(e: rusqlite::Error) -> CrossoverError {
    CrossoverError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

fn bar_params(bar: &PriceBar) -> [Box<dyn rusqlite::ToSql>; 7] {
    [
        Box::new(bar.timestamp.format(TIMESTAMP_FORMAT).to_string()),
        Box::new(bar.open.to_string()),
        Box::new(bar.high.to_string()),
        Box::new(bar.low.to_string()),
        Box::new(bar.close.to_string()),
        Box::new(bar.volume),
        Box::new(bar.instrument.clone()),
    ]
}

fn conversion_error<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|e| conversion_error(idx, e))
}

fn row_to_bar(row: &Row<'_>) -> rusqlite::Result<StoredBar> {
    let ts_str: String = row.get(1)?;
    let timestamp = NaiveDateTime::parse_from_str(&ts_str, TIMESTAMP_FORMAT)
        .map_err(|e| conversion_error(1, e))?;

    Ok(StoredBar {
        id: row.get(0)?,
        bar: PriceBar {
            timestamp,
            open: decimal_column(row, 2)?,
            high: decimal_column(row, 3)?,
            low: decimal_column(row, 4)?,
            close: decimal_column(row, 5)?,
            volume: row.get(6)?,
            instrument: row.get(7)?,
        },
    })
}

impl RecordStore for SqliteAdapter {
    fn insert(&self, bar: &PriceBar) -> Result<StoredBar, CrossoverError> {
        let conn = self.conn()?;
        let values = bar_params(bar);
        let result = conn.execute(
            "INSERT INTO price_bars (timestamp, open, high, low, close, volume, instrument)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params_from_iter(values.iter()),
        );

        match result {
            Ok(_) => Ok(StoredBar {
                id: conn.last_insert_rowid(),
                bar: bar.clone(),
            }),
            Err(e) if is_unique_violation(&e) => Err(CrossoverError::Duplicate {
                instrument: bar.instrument.clone(),
                timestamp: bar.timestamp,
            }),
            Err(e) => Err(query_error(e)),
        }
    }

    fn append(&self, bar: &PriceBar) -> Result<Option<StoredBar>, CrossoverError> {
        let conn = self.conn()?;
        let values = bar_params(bar);
        let changed = conn
            .execute(INSERT_SKIP, rusqlite::params_from_iter(values.iter()))
            .map_err(query_error)?;

        if changed == 0 {
            debug!(instrument = %bar.instrument, timestamp = %bar.timestamp, "skipping duplicate bar");
            return Ok(None);
        }
        Ok(Some(StoredBar {
            id: conn.last_insert_rowid(),
            bar: bar.clone(),
        }))
    }

    fn append_batch(&self, bars: &[PriceBar]) -> Result<usize, CrossoverError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(INSERT_SKIP).map_err(query_error)?;
            for bar in bars {
                let values = bar_params(bar);
                inserted += stmt
                    .execute(rusqlite::params_from_iter(values.iter()))
                    .map_err(query_error)?;
            }
        }

        tx.commit().map_err(query_error)?;
        Ok(inserted)
    }

    fn list(&self, instrument: &str) -> Result<Vec<StoredBar>, CrossoverError> {
        self.query_bars(
            &format!("{SELECT_COLUMNS} WHERE instrument = ?1 ORDER BY timestamp ASC"),
            params![instrument],
        )
    }

    fn list_all(&self) -> Result<Vec<StoredBar>, CrossoverError> {
        self.query_bars(
            &format!("{SELECT_COLUMNS} ORDER BY instrument ASC, timestamp ASC"),
            params![],
        )
    }

    fn count(&self, instrument: &str) -> Result<usize, CrossoverError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM price_bars WHERE instrument = ?1",
                params![instrument],
                |row| row.get(0),
            )
            .map_err(query_error)?;
        Ok(count as usize)
    }
}
