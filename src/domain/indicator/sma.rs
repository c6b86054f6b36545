//! Simple Moving Average over mid prices.
//!
//! Warmup: first (period-1) bars are invalid.

use crate::domain::candle::PriceBar;
use crate::domain::indicator::{IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let valid = period > 0 && i + 1 >= period;
        let value = if valid {
            let start = i + 1 - period;
            let sum: f64 = bars[start..=i].iter().map(|b| b.mid).sum();
            sum / period as f64
        } else {
            0.0
        };

        values.push(IndicatorPoint {
            time: bar.time,
            valid,
            value: IndicatorValue::Simple(value),
        });
    }

    IndicatorSeries {
        kind: IndicatorKind::Sma(period),
        values,
    }
}
