//! Plain-text backtest report: run header, metrics, trade journal.

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::candle::TIMESTAMP_FMT;
use crate::domain::error::FxsimError;
use crate::domain::metrics::Metrics;
use std::fs;
use std::path::Path;

pub fn render_report(
    strategy_name: &str,
    config: &BacktestConfig,
    result: &BacktestResult,
    metrics: &Metrics,
) -> String {
    let mut out = String::new();
    let rule = "=".repeat(75);

    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("Strategy:      {}\n", strategy_name));
    out.push_str(&format!(
        "Instrument:    {} ({})\n",
        config.instrument, config.granularity
    ));
    out.push_str(&format!(
        "Period:        {} to {}\n",
        config.start.format(TIMESTAMP_FMT),
        config.end.format(TIMESTAMP_FMT)
    ));
    out.push_str(&format!("Initial:       {:.2}\n", config.amount));
    out.push_str(&format!(
        "Spread costs:  {}\n",
        if config.use_spread { "on" } else { "off" }
    ));
    out.push_str(&format!("Bars:          {}\n", result.bars));
    out.push_str(&rule);
    out.push('\n');

    out.push_str(&format!(
        "Net performance:   {:+.2}%\n",
        metrics.net_performance_pct
    ));
    out.push_str(&format!("Buy & hold:        {:+.2}%\n", metrics.buy_hold_pct));
    out.push_str(&format!(
        "Outperformance:    {:+.2}%\n",
        metrics.outperformance_pct
    ));
    out.push_str(&format!("Sharpe:            {:.2}\n", metrics.sharpe));
    out.push_str(&format!(
        "Max drawdown:      -{:.1}% ({} bars)\n",
        metrics.max_drawdown * 100.0,
        metrics.max_drawdown_duration
    ));
    out.push_str(&format!("Trades executed:   {}\n", metrics.trades));
    out.push_str(&format!(
        "Final balance:     {:.2}\n",
        result.account.current_balance
    ));
    out.push_str(&rule);
    out.push('\n');

    out.push_str("\nTrade journal:\n");
    for line in &result.account.journal {
        out.push_str(line);
        out.push('\n');
    }

    out
}

pub fn write_report(
    path: &Path,
    strategy_name: &str,
    config: &BacktestConfig,
    result: &BacktestResult,
    metrics: &Metrics,
) -> Result<(), FxsimError> {
    let content = render_report(strategy_name, config, result, metrics);
    fs::write(path, content)?;
    Ok(())
}
