//! Iterative backtest engine.
//!
//! Walks the bar series once, asking the strategy for a stance on
//! every bar after warmup and transitioning the account through
//! market orders. Entries commit the full cash balance (floored to
//! whole units); reversals flatten the open side first. The final bar
//! is reserved for the close-out and never signaled on.

use chrono::NaiveDateTime;

use super::account::{Account, Order};
use super::candle::PriceBar;
use super::error::FxsimError;
use super::granularity::Granularity;
use super::strategy::{Signal, Strategy};

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub instrument: String,
    pub granularity: Granularity,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub amount: f64,
    pub use_spread: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub time: NaiveDateTime,
    pub nav: f64,
}

#[derive(Debug)]
pub struct BacktestResult {
    pub account: Account,
    pub equity_curve: Vec<EquityPoint>,
    pub bars: usize,
}

fn go_long(account: &mut Account, bar: &PriceBar) {
    if account.is_long() {
        return;
    }
    if account.is_short() {
        let cover = -account.units;
        account.buy(bar, Order::Units(cover));
    }
    account.buy(bar, Order::Amount(account.current_balance));
}

fn go_short(account: &mut Account, bar: &PriceBar) {
    if account.is_short() {
        return;
    }
    if account.is_long() {
        let held = account.units;
        account.sell(bar, Order::Units(held));
    }
    account.sell(bar, Order::Amount(account.current_balance));
}

fn go_neutral(account: &mut Account, bar: &PriceBar) {
    if account.is_long() {
        let held = account.units;
        account.sell(bar, Order::Units(held));
    } else if account.is_short() {
        let cover = -account.units;
        account.buy(bar, Order::Units(cover));
    }
}

/// Run the strategy over the bar series.
///
/// NAV is recorded for every bar, warmup included, so the equity
/// curve covers the whole run.
pub fn run_backtest(
    bars: &[PriceBar],
    strategy: &mut dyn Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, FxsimError> {
    let warmup = strategy.warmup();
    let minimum = warmup + 2;
    if bars.len() < minimum {
        return Err(FxsimError::InsufficientData {
            instrument: config.instrument.clone(),
            bars: bars.len(),
            minimum,
        });
    }

    strategy.prepare(bars);

    let mut account = Account::new(config.amount, config.use_spread);
    let mut equity_curve = Vec::with_capacity(bars.len());
    let last = bars.len() - 1;

    for (i, bar) in bars.iter().enumerate() {
        if i >= warmup && i < last {
            match strategy.signal(i) {
                Signal::GoLong => go_long(&mut account, bar),
                Signal::GoShort => go_short(&mut account, bar),
                Signal::GoNeutral => go_neutral(&mut account, bar),
                Signal::Hold => {}
            }
        }

        if i == last {
            account.close_out(bar);
        }

        equity_curve.push(EquityPoint {
            time: bar.time,
            nav: account.nav(bar),
        });
    }

    Ok(BacktestResult {
        account,
        equity_curve,
        bars: bars.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::parse_timestamp;

    fn make_bars(mids: &[f64], spread: f64) -> Vec<PriceBar> {
        let start = parse_timestamp("2020-01-01").unwrap();
        mids.iter()
            .enumerate()
            .map(|(i, &mid)| PriceBar {
                time: start + chrono::Duration::days(i as i64),
                mid,
                spread,
                log_return: None,
            })
            .collect()
    }

    fn make_config(amount: f64, use_spread: bool) -> BacktestConfig {
        BacktestConfig {
            instrument: "EUR_USD".into(),
            granularity: Granularity::D,
            start: parse_timestamp("2020-01-01").unwrap(),
            end: parse_timestamp("2020-12-31").unwrap(),
            amount,
            use_spread,
        }
    }

    /// Replays a fixed signal per bar index; Hold beyond the script.
    struct Scripted {
        warmup: usize,
        signals: Vec<Signal>,
    }

    impl Strategy for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }
        fn warmup(&self) -> usize {
            self.warmup
        }
        fn prepare(&mut self, _bars: &[PriceBar]) {}
        fn signal(&self, index: usize) -> Signal {
            self.signals.get(index).copied().unwrap_or(Signal::Hold)
        }
    }

    #[test]
    fn insufficient_bars_is_an_error() {
        let bars = make_bars(&[1.0, 1.1], 0.0);
        let mut strategy = Scripted {
            warmup: 5,
            signals: vec![],
        };
        let err = run_backtest(&bars, &mut strategy, &make_config(1000.0, false)).unwrap_err();
        assert!(matches!(
            err,
            FxsimError::InsufficientData { bars: 2, minimum: 7, .. }
        ));
    }

    #[test]
    fn all_hold_only_books_the_close_out() {
        let bars = make_bars(&[1.0, 1.1, 1.2, 1.3], 0.0);
        let mut strategy = Scripted {
            warmup: 0,
            signals: vec![Signal::Hold; 4],
        };
        let result = run_backtest(&bars, &mut strategy, &make_config(1000.0, false)).unwrap();

        assert_eq!(result.account.trades, 1);
        assert!(result.account.is_flat());
        assert!((result.account.current_balance - 1000.0).abs() < f64::EPSILON);
        assert_eq!(result.equity_curve.len(), 4);
    }

    #[test]
    fn long_round_trip_known_balance() {
        // Enter long at bar 1 (mid 2.0), price rises, close at bar 3 (mid 3.0).
        let bars = make_bars(&[2.0, 2.0, 2.5, 3.0], 0.0);
        let mut strategy = Scripted {
            warmup: 1,
            signals: vec![Signal::Hold, Signal::GoLong, Signal::Hold, Signal::Hold],
        };
        let config = make_config(1000.0, false);
        let result = run_backtest(&bars, &mut strategy, &config).unwrap();

        // 500 units bought at 2.0, settled at 3.0: +500
        assert!((result.account.current_balance - 1500.0).abs() < 1e-9);
        assert_eq!(result.account.trades, 2);
        assert!((result.account.performance_pct() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn short_round_trip_known_balance() {
        let bars = make_bars(&[2.0, 2.0, 1.5, 1.0], 0.0);
        let mut strategy = Scripted {
            warmup: 1,
            signals: vec![Signal::Hold, Signal::GoShort, Signal::Hold, Signal::Hold],
        };
        let result = run_backtest(&bars, &mut strategy, &make_config(1000.0, false)).unwrap();

        // 500 units sold at 2.0, bought back at 1.0: +500
        assert!((result.account.current_balance - 1500.0).abs() < 1e-9);
        assert!(result.account.is_flat());
    }

    #[test]
    fn reversal_flattens_before_entering() {
        let bars = make_bars(&[2.0, 2.0, 2.0, 2.0, 2.0], 0.0);
        let mut strategy = Scripted {
            warmup: 0,
            signals: vec![
                Signal::GoLong,
                Signal::GoShort,
                Signal::Hold,
                Signal::Hold,
                Signal::Hold,
            ],
        };
        let result = run_backtest(&bars, &mut strategy, &make_config(1000.0, false)).unwrap();

        // buy 500, sell 500 (flatten), sell 500 (short), close-out buy
        assert_eq!(result.account.trades, 4);
        assert!(result.account.is_flat());
        // flat prices, no spread: balance conserved
        assert!((result.account.current_balance - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_signal_does_not_stack_positions() {
        let bars = make_bars(&[2.0, 2.0, 2.0, 2.0], 0.0);
        let mut strategy = Scripted {
            warmup: 0,
            signals: vec![Signal::GoLong, Signal::GoLong, Signal::GoLong, Signal::Hold],
        };
        let result = run_backtest(&bars, &mut strategy, &make_config(1000.0, false)).unwrap();

        // one entry plus the close-out
        assert_eq!(result.account.trades, 2);
    }

    #[test]
    fn go_neutral_flattens_mid_run() {
        let bars = make_bars(&[2.0, 2.0, 2.5, 2.5, 2.5], 0.0);
        let mut strategy = Scripted {
            warmup: 0,
            signals: vec![
                Signal::GoLong,
                Signal::Hold,
                Signal::GoNeutral,
                Signal::Hold,
                Signal::Hold,
            ],
        };
        let result = run_backtest(&bars, &mut strategy, &make_config(1000.0, false)).unwrap();

        // 500 @ 2.0 in, 500 @ 2.5 out: +250 banked before close-out
        assert!((result.account.current_balance - 1250.0).abs() < 1e-9);
        assert_eq!(result.account.trades, 2);
    }

    #[test]
    fn final_bar_is_not_signaled() {
        let bars = make_bars(&[2.0, 2.0, 2.0], 0.0);
        let mut strategy = Scripted {
            warmup: 0,
            // GoLong on the last bar must be ignored
            signals: vec![Signal::Hold, Signal::Hold, Signal::GoLong],
        };
        let result = run_backtest(&bars, &mut strategy, &make_config(1000.0, false)).unwrap();

        assert_eq!(result.account.trades, 1); // close-out only
        assert!((result.account.current_balance - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equity_curve_tracks_nav() {
        let bars = make_bars(&[2.0, 2.0, 2.5, 3.0], 0.0);
        let mut strategy = Scripted {
            warmup: 1,
            signals: vec![Signal::Hold, Signal::GoLong, Signal::Hold, Signal::Hold],
        };
        let result = run_backtest(&bars, &mut strategy, &make_config(1000.0, false)).unwrap();

        // warmup bar: flat cash
        assert!((result.equity_curve[0].nav - 1000.0).abs() < 1e-9);
        // after entry at 2.0: nav unchanged at entry bar
        assert!((result.equity_curve[1].nav - 1000.0).abs() < 1e-9);
        // marked to 2.5: 500 units × 0.5 unrealized
        assert!((result.equity_curve[2].nav - 1250.0).abs() < 1e-9);
        // closed at 3.0
        assert!((result.equity_curve[3].nav - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn spread_costs_reduce_performance() {
        let mids = [2.0, 2.0, 2.0, 2.0];
        let with = {
            let bars = make_bars(&mids, 0.02);
            let mut strategy = Scripted {
                warmup: 0,
                signals: vec![Signal::GoLong, Signal::Hold, Signal::Hold, Signal::Hold],
            };
            run_backtest(&bars, &mut strategy, &make_config(1000.0, true)).unwrap()
        };
        let without = {
            let bars = make_bars(&mids, 0.02);
            let mut strategy = Scripted {
                warmup: 0,
                signals: vec![Signal::GoLong, Signal::Hold, Signal::Hold, Signal::Hold],
            };
            run_backtest(&bars, &mut strategy, &make_config(1000.0, false)).unwrap()
        };

        assert!(with.account.current_balance < without.account.current_balance);
        assert!((without.account.current_balance - 1000.0).abs() < 1e-9);
    }
}
