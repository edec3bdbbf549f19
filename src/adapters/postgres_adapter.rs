//! PostgreSQL record store.
//!
//! Prices use `NUMERIC(18,4)` columns, read and written as `rust_decimal::Decimal`.

use crate::domain::config_validation::pool_size;
use crate::domain::error::CrossoverError;
use crate::domain::price_bar::{PriceBar, StoredBar};
use crate::ports::config_port::ConfigPort;
use crate::ports::record_store::RecordStore;
use postgres::error::SqlState;
use postgres::types::ToSql;
use postgres::{NoTls, Row};
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use tracing::debug;

type Manager = PostgresConnectionManager<NoTls>;

const SELECT_COLUMNS: &str =
    "SELECT id, timestamp, open, high, low, close, volume, instrument FROM public.price_bars";

pub struct PostgresAdapter {
    pool: Pool<Manager>,
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, CrossoverError> {
        // [postgres] connection_string wins over [database] conninfo
        let connection_string = config
            .get_string("postgres", "connection_string")
            .or_else(|| config.get_string("database", "conninfo"))
            .ok_or_else(|| CrossoverError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let pg_config = connection_string
            .parse::<postgres::Config>()
            .map_err(|e| CrossoverError::ConfigInvalid {
                section: "postgres".into(),
                key: "connection_string".into(),
                reason: e.to_string(),
            })?;

        let max_size = pool_size(config)?;
        let pool = Pool::builder()
            .max_size(max_size)
            .build(PostgresConnectionManager::new(pg_config, NoTls))
            .map_err(|e: r2d2::Error| CrossoverError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<Manager>, CrossoverError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| CrossoverError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), CrossoverError> {
        self.conn()?
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS public.price_bars (
                    id BIGSERIAL PRIMARY KEY,
                    timestamp TIMESTAMP NOT NULL,
                    open NUMERIC(18,4) NOT NULL,
                    high NUMERIC(18,4) NOT NULL,
                    low NUMERIC(18,4) NOT NULL,
                    close NUMERIC(18,4) NOT NULL,
                    volume BIGINT NOT NULL,
                    instrument VARCHAR(64) NOT NULL DEFAULT 'HINDALCO',
                    UNIQUE (instrument, timestamp)
                );
                CREATE INDEX IF NOT EXISTS idx_price_bars_timestamp ON public.price_bars(timestamp);",
            )
            .map_err(query_error)
    }

    fn query_bars(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<StoredBar>, CrossoverError> {
        let rows = self.conn()?.query(sql, params).map_err(query_error)?;
        rows.iter().map(row_to_bar).collect()
    }
}

fn query_error(e: postgres::Error) -> CrossoverError {
    CrossoverError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn row_to_bar(row: &Row) -> Result<StoredBar, CrossoverError> {
    let bar = PriceBar {
        timestamp: row.try_get(1).map_err(query_error)?,
        open: row.try_get(2).map_err(query_error)?,
        high: row.try_get(3).map_err(query_error)?,
        low: row.try_get(4).map_err(query_error)?,
        close: row.try_get(5).map_err(query_error)?,
        volume: row.try_get(6).map_err(query_error)?,
        instrument: row.try_get(7).map_err(query_error)?,
    };
    Ok(StoredBar {
        id: row.try_get(0).map_err(query_error)?,
        bar,
    })
}

const INSERT: &str = "INSERT INTO public.price_bars
     (timestamp, open, high, low, close, volume, instrument)
     VALUES ($1, $2, $3, $4, $5, $6, $7)";

const INSERT_SKIP: &str = "INSERT INTO public.price_bars
     (timestamp, open, high, low, close, volume, instrument)
     VALUES ($1, $2, $3, $4, $5, $6, $7)
     ON CONFLICT (instrument, timestamp) DO NOTHING
     RETURNING id";

impl RecordStore for PostgresAdapter {
    fn insert(&self, bar: &PriceBar) -> Result<StoredBar, CrossoverError> {
        let result = self.conn()?.query_one(
            &format!("{INSERT} RETURNING id"),
            &[
                &bar.timestamp,
                &bar.open,
                &bar.high,
                &bar.low,
                &bar.close,
                &bar.volume,
                &bar.instrument,
            ],
        );

        match result {
            Ok(row) => Ok(StoredBar {
                id: row.get(0),
                bar: bar.clone(),
            }),
            Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                Err(CrossoverError::Duplicate {
                    instrument: bar.instrument.clone(),
                    timestamp: bar.timestamp,
                })
            }
            Err(e) => Err(query_error(e)),
        }
    }

    fn append(&self, bar: &PriceBar) -> Result<Option<StoredBar>, CrossoverError> {
        let row = self
            .conn()?
            .query_opt(
                INSERT_SKIP,
                &[
                    &bar.timestamp,
                    &bar.open,
                    &bar.high,
                    &bar.low,
                    &bar.close,
                    &bar.volume,
                    &bar.instrument,
                ],
            )
            .map_err(query_error)?;

        if row.is_none() {
            debug!(instrument = %bar.instrument, timestamp = %bar.timestamp, "skipping duplicate bar");
        }
        Ok(row.map(|r| StoredBar {
            id: r.get(0),
            bar: bar.clone(),
        }))
    }

    fn append_batch(&self, bars: &[PriceBar]) -> Result<usize, CrossoverError> {
        let mut conn = self.conn()?;
        let mut tx = conn.transaction().map_err(query_error)?;
        let stmt = tx.prepare(INSERT_SKIP).map_err(query_error)?;

        let mut inserted = 0;
        for bar in bars {
            let row = tx
                .query_opt(
                    &stmt,
                    &[
                        &bar.timestamp,
                        &bar.open,
                        &bar.high,
                        &bar.low,
                        &bar.close,
                        &bar.volume,
                        &bar.instrument,
                    ],
                )
                .map_err(query_error)?;
            if row.is_some() {
                inserted += 1;
            }
        }

        tx.commit().map_err(query_error)?;
        Ok(inserted)
    }

    fn list(&self, instrument: &str) -> Result<Vec<StoredBar>, CrossoverError> {
        self.query_bars(
            &format!("{SELECT_COLUMNS} WHERE instrument = $1 ORDER BY timestamp ASC"),
            &[&instrument],
        )
    }

    fn list_all(&self) -> Result<Vec<StoredBar>, CrossoverError> {
        self.query_bars(
            &format!("{SELECT_COLUMNS} ORDER BY instrument ASC, timestamp ASC"),
            &[],
        )
    }

    fn count(&self, instrument: &str) -> Result<usize, CrossoverError> {
        let row = self
            .conn()?
            .query_one(
                "SELECT COUNT(*) FROM public.price_bars WHERE instrument = $1",
                &[&instrument],
            )
            .map_err(query_error)?;
        let count: i64 = row.get(0);
        Ok(count as usize)
    }
}
