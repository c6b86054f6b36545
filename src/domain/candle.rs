//! Bid/ask close candles and the derived per-bar price view.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::granularity::Granularity;

pub const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// A raw candle as stored or fetched: bid and ask close prices only.
#[derive(Debug, Clone)]
pub struct Candle {
    pub instrument: String,
    pub granularity: Granularity,
    pub time: NaiveDateTime,
    pub bid: f64,
    pub ask: f64,
}

impl Candle {
    /// (ask + bid) / 2
    pub fn mid(&self) -> f64 {
        (self.ask + self.bid) / 2.0
    }

    /// ask - bid
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}

/// Per-bar view consumed by the engine: mid price, spread, and the
/// log return against the previous bar.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub time: NaiveDateTime,
    pub mid: f64,
    pub spread: f64,
    pub log_return: Option<f64>,
}

impl PriceBar {
    /// mid + spread / 2
    pub fn ask(&self) -> f64 {
        self.mid + self.spread / 2.0
    }

    /// mid - spread / 2
    pub fn bid(&self) -> f64 {
        self.mid - self.spread / 2.0
    }
}

/// Build the engine's bar series from raw candles. The first bar has
/// no log return; later bars carry ln(mid_t / mid_{t-1}).
pub fn derive_bars(candles: &[Candle]) -> Vec<PriceBar> {
    let mut bars = Vec::with_capacity(candles.len());
    let mut prev_mid: Option<f64> = None;

    for candle in candles {
        let mid = candle.mid();
        let log_return = prev_mid
            .filter(|&p| p > 0.0 && mid > 0.0)
            .map(|p| (mid / p).ln());
        bars.push(PriceBar {
            time: candle.time,
            mid,
            spread: candle.spread(),
            log_return,
        });
        prev_mid = Some(mid);
    }

    bars
}

/// Parse a timestamp as `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD HH:MM`,
/// or a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, TIMESTAMP_FMT) {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}
