//! Bollinger Bands over mid prices.
//!
//! - Middle: SMA over n bars
//! - Upper: middle + multiplier × stddev
//! - Lower: middle - multiplier × stddev
//!
//! StdDev is the population standard deviation (divides by N).
//! The multiplier is carried as an integer ×100 so the parameter set
//! stays hashable. Warmup: first (period-1) bars are invalid.

use crate::domain::candle::PriceBar;
use crate::domain::indicator::{IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};

pub fn calculate_bollinger(bars: &[PriceBar], period: usize, mult_x100: u32) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mult = mult_x100 as f64 / 100.0;

    for (i, bar) in bars.iter().enumerate() {
        let valid = period > 0 && i + 1 >= period;

        let (upper, middle, lower) = if valid {
            let start = i + 1 - period;
            let window = &bars[start..=i];

            let middle_val: f64 = window.iter().map(|b| b.mid).sum::<f64>() / period as f64;

            let variance: f64 = window
                .iter()
                .map(|b| {
                    let diff = b.mid - middle_val;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;

            let stddev = variance.sqrt();
            (middle_val + mult * stddev, middle_val, middle_val - mult * stddev)
        } else {
            (0.0, 0.0, 0.0)
        };

        values.push(IndicatorPoint {
            time: bar.time,
            valid,
            value: IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            },
        });
    }

    IndicatorSeries {
        kind: IndicatorKind::Bollinger { period, mult_x100 },
        values,
    }
}
