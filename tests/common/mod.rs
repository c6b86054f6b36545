#![allow(dead_code)]

use chrono::NaiveDateTime;
use fxsim::domain::backtest::BacktestConfig;
pub use fxsim::domain::candle::{derive_bars, parse_timestamp, Candle, PriceBar};
use fxsim::domain::error::FxsimError;
use fxsim::domain::granularity::Granularity;
use fxsim::ports::data_port::DataPort;
use std::collections::HashMap;

#[derive(Debug)]
pub struct MockDataPort {
    pub candles: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            candles: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, instrument: &str, candles: Vec<Candle>) -> Self {
        self.candles.insert(instrument.to_string(), candles);
        self
    }

    pub fn with_error(mut self, instrument: &str, reason: &str) -> Self {
        self.errors.insert(instrument.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(
        &self,
        instrument: &str,
        _granularity: Granularity,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, FxsimError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(FxsimError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .candles
            .get(instrument)
            .map(|candles| {
                candles
                    .iter()
                    .filter(|c| c.time >= start && c.time <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_instruments(&self) -> Result<Vec<String>, FxsimError> {
        let mut instruments: Vec<String> = self.candles.keys().cloned().collect();
        instruments.sort();
        Ok(instruments)
    }

    fn data_range(
        &self,
        instrument: &str,
        _granularity: Granularity,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, FxsimError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(FxsimError::Data {
                reason: reason.clone(),
            });
        }
        match self.candles.get(instrument) {
            Some(candles) if !candles.is_empty() => {
                let min = candles.iter().map(|c| c.time).min().unwrap();
                let max = candles.iter().map(|c| c.time).max().unwrap();
                Ok(Some((min, max, candles.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn ts(s: &str) -> NaiveDateTime {
    parse_timestamp(s).unwrap()
}

pub fn make_candle(instrument: &str, time: &str, bid: f64, ask: f64) -> Candle {
    Candle {
        instrument: instrument.to_string(),
        granularity: Granularity::D,
        time: ts(time),
        bid,
        ask,
    }
}

/// Daily candles from a mid-price series with a constant spread.
pub fn candles_from_mids(instrument: &str, start: &str, mids: &[f64], spread: f64) -> Vec<Candle> {
    let start = ts(start);
    mids.iter()
        .enumerate()
        .map(|(i, &mid)| Candle {
            instrument: instrument.to_string(),
            granularity: Granularity::D,
            time: start + chrono::Duration::days(i as i64),
            bid: mid - spread / 2.0,
            ask: mid + spread / 2.0,
        })
        .collect()
}

pub fn bars_from_mids(mids: &[f64]) -> Vec<PriceBar> {
    derive_bars(&candles_from_mids("EUR_USD", "2020-01-01", mids, 0.0))
}

pub fn sample_config(amount: f64, use_spread: bool) -> BacktestConfig {
    BacktestConfig {
        instrument: "EUR_USD".into(),
        granularity: Granularity::D,
        start: ts("2020-01-01"),
        end: ts("2020-12-31"),
        amount,
        use_spread,
    }
}
