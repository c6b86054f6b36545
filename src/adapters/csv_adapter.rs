//! CSV candle file adapter.
//!
//! One file per instrument and granularity, named
//! `<instrument>_<granularity>.csv`, with header `time,bid,ask`.

use crate::domain::candle::{parse_timestamp, Candle};
use crate::domain::error::FxsimError;
use crate::domain::granularity::Granularity;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;

#[derive(Debug)]
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, instrument: &str, granularity: Granularity) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", instrument, granularity))
    }
}

/// Parse candle CSV content (`time,bid,ask` with a header row).
/// Also used by the import command.
pub fn parse_candle_csv(
    content: &str,
    instrument: &str,
    granularity: Granularity,
) -> Result<Vec<Candle>, FxsimError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut candles = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| FxsimError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;

        let time_str = record.get(0).ok_or_else(|| FxsimError::Data {
            reason: "missing time column".into(),
        })?;
        let time = parse_timestamp(time_str).ok_or_else(|| FxsimError::Data {
            reason: format!("invalid timestamp: {}", time_str),
        })?;

        let bid: f64 = record
            .get(1)
            .ok_or_else(|| FxsimError::Data {
                reason: "missing bid column".into(),
            })?
            .trim()
            .parse()
            .map_err(|e| FxsimError::Data {
                reason: format!("invalid bid value: {}", e),
            })?;

        let ask: f64 = record
            .get(2)
            .ok_or_else(|| FxsimError::Data {
                reason: "missing ask column".into(),
            })?
            .trim()
            .parse()
            .map_err(|e| FxsimError::Data {
                reason: format!("invalid ask value: {}", e),
            })?;

        if ask < bid {
            return Err(FxsimError::Data {
                reason: format!("negative spread at {}: bid {} above ask {}", time, bid, ask),
            });
        }

        candles.push(Candle {
            instrument: instrument.to_string(),
            granularity,
            time,
            bid,
            ask,
        });
    }

    candles.sort_by_key(|c| c.time);
    Ok(candles)
}

impl DataPort for CsvAdapter {
    fn fetch_candles(
        &self,
        instrument: &str,
        granularity: Granularity,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, FxsimError> {
        let path = self.csv_path(instrument, granularity);
        let content = fs::read_to_string(&path).map_err(|e| FxsimError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut candles = parse_candle_csv(&content, instrument, granularity)?;
        candles.retain(|c| c.time >= start && c.time <= end);
        Ok(candles)
    }

    fn list_instruments(&self) -> Result<Vec<String>, FxsimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| FxsimError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut instruments = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| FxsimError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            let Some(stem) = name_str.strip_suffix(".csv") else {
                continue;
            };
            // `EUR_USD_D.csv` → instrument `EUR_USD`, granularity `D`
            let Some((instrument, gran)) = stem.rsplit_once('_') else {
                continue;
            };
            if gran.parse::<Granularity>().is_err() {
                continue;
            }
            let instrument = instrument.to_string();
            if !instruments.contains(&instrument) {
                instruments.push(instrument);
            }
        }

        instruments.sort();
        Ok(instruments)
    }

    fn data_range(
        &self,
        instrument: &str,
        granularity: Granularity,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, FxsimError> {
        let path = self.csv_path(instrument, granularity);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| FxsimError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let candles = parse_candle_csv(&content, instrument, granularity)?;

        match (candles.first(), candles.last()) {
            (Some(first), Some(last)) => Ok(Some((first.time, last.time, candles.len()))),
            _ => Ok(None),
        }
    }
}
