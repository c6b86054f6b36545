//! SQLite candle store adapter.

use crate::domain::candle::{Candle, TIMESTAMP_FMT};
use crate::domain::error::FxsimError;
use crate::domain::granularity::Granularity;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

#[derive(Debug)]
pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FxsimError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| FxsimError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| FxsimError::Data {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, FxsimError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| FxsimError::Data {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), FxsimError> {
        let conn = self.pool.get().map_err(|e: r2d2::Error| FxsimError::Data {
            reason: e.to_string(),
        })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS candles (
                instrument TEXT NOT NULL,
                granularity TEXT NOT NULL,
                time TEXT NOT NULL,
                bid REAL NOT NULL,
                ask REAL NOT NULL,
                PRIMARY KEY (instrument, granularity, time)
            );
            CREATE INDEX IF NOT EXISTS idx_candles_instrument
                ON candles(instrument, granularity);",
        )
        .map_err(|e: rusqlite::Error| FxsimError::DataQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    pub fn insert_candles(&self, candles: &[Candle]) -> Result<(), FxsimError> {
        let mut conn = self.pool.get().map_err(|e: r2d2::Error| FxsimError::Data {
            reason: e.to_string(),
        })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| FxsimError::DataQuery {
                reason: e.to_string(),
            })?;

        for candle in candles {
            tx.execute(
                "INSERT OR REPLACE INTO candles (instrument, granularity, time, bid, ask)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    candle.instrument,
                    candle.granularity.to_string(),
                    candle.time.format(TIMESTAMP_FMT).to_string(),
                    candle.bid,
                    candle.ask,
                ],
            )
            .map_err(|e: rusqlite::Error| FxsimError::DataQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit().map_err(|e: rusqlite::Error| FxsimError::DataQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

fn parse_stored_time(s: &str) -> Result<NaiveDateTime, rusqlite::Error> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(s.len(), rusqlite::types::Type::Text, Box::new(e))
    })
}

impl DataPort for SqliteAdapter {
    fn fetch_candles(
        &self,
        instrument: &str,
        granularity: Granularity,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, FxsimError> {
        let conn = self.pool.get().map_err(|e: r2d2::Error| FxsimError::Data {
            reason: e.to_string(),
        })?;

        let query = "SELECT instrument, granularity, time, bid, ask
                     FROM candles
                     WHERE instrument = ?1 AND granularity = ?2
                       AND time >= ?3 AND time <= ?4
                     ORDER BY time ASC";

        let mut stmt = conn
            .prepare(query)
            .map_err(|e: rusqlite::Error| FxsimError::DataQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(
                params![
                    instrument,
                    granularity.to_string(),
                    start.format(TIMESTAMP_FMT).to_string(),
                    end.format(TIMESTAMP_FMT).to_string(),
                ],
                |row| {
                    let time_str: String = row.get(2)?;
                    let time = parse_stored_time(&time_str)?;
                    Ok(Candle {
                        instrument: row.get(0)?,
                        granularity,
                        time,
                        bid: row.get(3)?,
                        ask: row.get(4)?,
                    })
                },
            )
            .map_err(|e: rusqlite::Error| FxsimError::DataQuery {
                reason: e.to_string(),
            })?;

        let mut candles = Vec::new();
        for row in rows {
            candles.push(row.map_err(|e: rusqlite::Error| FxsimError::DataQuery {
                reason: e.to_string(),
            })?);
        }

        Ok(candles)
    }

    fn list_instruments(&self) -> Result<Vec<String>, FxsimError> {
        let conn = self.pool.get().map_err(|e: r2d2::Error| FxsimError::Data {
            reason: e.to_string(),
        })?;

        let mut stmt = conn
            .prepare("SELECT DISTINCT instrument FROM candles ORDER BY instrument")
            .map_err(|e: rusqlite::Error| FxsimError::DataQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e: rusqlite::Error| FxsimError::DataQuery {
                reason: e.to_string(),
            })?;

        let mut instruments = Vec::new();
        for row in rows {
            instruments.push(row.map_err(|e: rusqlite::Error| FxsimError::DataQuery {
                reason: e.to_string(),
            })?);
        }

        Ok(instruments)
    }

    fn data_range(
        &self,
        instrument: &str,
        granularity: Granularity,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, FxsimError> {
        let conn = self.pool.get().map_err(|e: r2d2::Error| FxsimError::Data {
            reason: e.to_string(),
        })?;

        let query = "SELECT MIN(time), MAX(time), COUNT(*)
                     FROM candles WHERE instrument = ?1 AND granularity = ?2";

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(query, params![instrument, granularity.to_string()], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(|e: rusqlite::Error| FxsimError::DataQuery {
                reason: e.to_string(),
            })?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let min = NaiveDateTime::parse_from_str(&min_str, TIMESTAMP_FMT).map_err(
                    |e: chrono::ParseError| FxsimError::Data {
                        reason: e.to_string(),
                    },
                )?;
                let max = NaiveDateTime::parse_from_str(&max_str, TIMESTAMP_FMT).map_err(
                    |e: chrono::ParseError| FxsimError::Data {
                        reason: e.to_string(),
                    },
                )?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }
}
