//! Stochastic Oscillator over mid prices.
//!
//! Candles carry close prices only, so %K uses the rolling min/max of
//! mids rather than true highs and lows:
//!
//!   %K = 100 × (mid − min(mid, k)) / (max(mid, k) − min(mid, k))
//!   %D = SMA of %K over d bars
//!
//! A flat window (max == min) yields %K = 50. A point is valid only
//! once both components are: from bar (k-1) + (d-1) onward.

use crate::domain::candle::PriceBar;
use crate::domain::indicator::{IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};

pub fn calculate_stochastic(bars: &[PriceBar], k_period: usize, d_period: usize) -> IndicatorSeries {
    let kind = IndicatorKind::Stochastic { k_period, d_period };

    if k_period == 0 || d_period == 0 {
        let values = bars
            .iter()
            .map(|b| IndicatorPoint {
                time: b.time,
                valid: false,
                value: IndicatorValue::Stochastic { k: 0.0, d: 0.0 },
            })
            .collect();
        return IndicatorSeries { kind, values };
    }

    let mut k_values: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < k_period {
            k_values.push(None);
            continue;
        }
        let start = i + 1 - k_period;
        let window = &bars[start..=i];
        let low = window.iter().map(|b| b.mid).fold(f64::INFINITY, f64::min);
        let high = window
            .iter()
            .map(|b| b.mid)
            .fold(f64::NEG_INFINITY, f64::max);

        let k = if high > low {
            100.0 * (bar.mid - low) / (high - low)
        } else {
            50.0
        };
        k_values.push(Some(k));
    }

    let warmup = (k_period - 1) + (d_period - 1);
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let valid = i >= warmup;
        let (k, d) = if valid {
            let k = k_values[i].unwrap_or(0.0);
            let d_sum: f64 = k_values[i + 1 - d_period..=i]
                .iter()
                .map(|v| v.unwrap_or(0.0))
                .sum();
            (k, d_sum / d_period as f64)
        } else {
            (0.0, 0.0)
        };

        values.push(IndicatorPoint {
            time: bar.time,
            valid,
            value: IndicatorValue::Stochastic { k, d },
        });
    }

    IndicatorSeries { kind, values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::parse_timestamp;

    fn make_bars(mids: &[f64]) -> Vec<PriceBar> {
        mids.iter()
            .enumerate()
            .map(|(i, &mid)| PriceBar {
                time: parse_timestamp(&format!("2020-01-{:02}", i + 1)).unwrap(),
                mid,
                spread: 0.0,
                log_return: None,
            })
            .collect()
    }

    #[test]
    fn stochastic_warmup() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let series = calculate_stochastic(&bars, 3, 2);

        // warmup = (3-1) + (2-1) = 3
        assert!(!series.values[0].valid);
        assert!(!series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[5].valid);
    }

    #[test]
    fn stochastic_k_at_window_high_is_100() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let series = calculate_stochastic(&bars, 3, 1);

        let (k, _) = series.stochastic(4).unwrap();
        assert!((k - 100.0).abs() < 1e-9);
    }

    #[test]
    fn stochastic_k_at_window_low_is_0() {
        let bars = make_bars(&[5.0, 4.0, 3.0, 2.0, 1.0]);
        let series = calculate_stochastic(&bars, 3, 1);

        let (k, _) = series.stochastic(4).unwrap();
        assert!((k - 0.0).abs() < 1e-9);
    }

    #[test]
    fn stochastic_flat_window_yields_50() {
        let bars = make_bars(&[2.0, 2.0, 2.0, 2.0]);
        let series = calculate_stochastic(&bars, 3, 1);

        let (k, d) = series.stochastic(3).unwrap();
        assert!((k - 50.0).abs() < 1e-9);
        assert!((d - 50.0).abs() < 1e-9);
    }

    #[test]
    fn stochastic_d_averages_k() {
        let bars = make_bars(&[1.0, 3.0, 2.0, 3.0, 1.0]);
        let series = calculate_stochastic(&bars, 3, 2);

        // k window at i=3: [2,3] over mids {3,2,3} → low=2, high=3, k=100
        // k window at i=2: mids {1,3,2} → low=1, high=3, k=50
        let (k, d) = series.stochastic(3).unwrap();
        assert!((k - 100.0).abs() < 1e-9);
        assert!((d - 75.0).abs() < 1e-9);
    }

    #[test]
    fn stochastic_k_stays_in_range() {
        let mids: Vec<f64> = (0..30).map(|i| 1.0 + ((i * 7) % 13) as f64 * 0.01).collect();
        let bars = make_bars(&mids[..mids.len().min(28)]);
        let series = calculate_stochastic(&bars, 5, 3);

        for (i, point) in series.values.iter().enumerate() {
            if point.valid {
                let (k, d) = series.stochastic(i).unwrap();
                assert!((0.0..=100.0).contains(&k), "%K {} out of range", k);
                assert!((0.0..=100.0).contains(&d), "%D {} out of range", d);
            }
        }
    }

    #[test]
    fn stochastic_zero_periods_all_invalid() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        for (k, d) in [(0, 3), (3, 0)] {
            let series = calculate_stochastic(&bars, k, d);
            assert!(series.values.iter().all(|p| !p.valid));
        }
    }
}
