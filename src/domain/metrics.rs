//! Performance metrics over a finished backtest.

use super::backtest::{BacktestResult, EquityPoint};
use super::candle::PriceBar;
use super::granularity::Granularity;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub net_performance_pct: f64,
    pub buy_hold_pct: f64,
    pub outperformance_pct: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub trades: usize,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, bars: &[PriceBar], granularity: Granularity) -> Self {
        let net_performance_pct = result.account.performance_pct();

        let buy_hold_pct = match (bars.first(), bars.last()) {
            (Some(first), Some(last)) if first.mid > 0.0 => {
                (last.mid / first.mid - 1.0) * 100.0
            }
            _ => 0.0,
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&result.equity_curve);
        let sharpe = compute_sharpe(&result.equity_curve, granularity);

        Metrics {
            net_performance_pct,
            buy_hold_pct,
            outperformance_pct: net_performance_pct - buy_hold_pct,
            sharpe,
            max_drawdown,
            max_drawdown_duration,
            trades: result.account.trades,
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    if equity_curve.is_empty() {
        return (0.0, 0);
    }

    let mut peak = equity_curve[0].nav;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in equity_curve {
        if point.nav > peak {
            peak = point.nav;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.nav) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_dd_duration += 1;
            if current_dd_duration > max_dd_duration {
                max_dd_duration = current_dd_duration;
            }
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_sharpe(equity_curve: &[EquityPoint], granularity: Granularity) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].nav;
            let curr = w[1].nav;
            if prev > 0.0 { (curr - prev) / prev } else { 0.0 }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        (mean / stddev) * granularity.bars_per_year().sqrt()
    } else {
        0.0
    }
}
