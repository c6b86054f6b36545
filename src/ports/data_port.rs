//! Candle data access port trait.

use crate::domain::candle::Candle;
use crate::domain::error::FxsimError;
use crate::domain::granularity::Granularity;
use chrono::NaiveDateTime;

pub trait DataPort: std::fmt::Debug {
    fn fetch_candles(
        &self,
        instrument: &str,
        granularity: Granularity,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, FxsimError>;

    fn list_instruments(&self) -> Result<Vec<String>, FxsimError>;

    fn data_range(
        &self,
        instrument: &str,
        granularity: Granularity,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, FxsimError>;
}
