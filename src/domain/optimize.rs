//! Parameter sweep over strategy settings.
//!
//! Ranges come from the `[optimize]` section as `start..stop..step`
//! strings keyed by parameter name. The sweep runs one backtest per
//! combination (one or two ranged parameters) and ranks outcomes by
//! net performance, ties broken by fewer trades. Combinations the
//! strategy rejects (e.g. fast >= slow) are skipped, not errors.

use std::cmp::Ordering;

use super::backtest::{run_backtest, BacktestConfig};
use super::candle::PriceBar;
use super::error::FxsimError;
use super::strategy::build_strategy;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct ParamRange {
    pub name: String,
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl ParamRange {
    /// Values from start to stop inclusive, stepping by step.
    pub fn values(&self) -> Vec<f64> {
        let mut out = Vec::new();
        let mut v = self.start;
        while v <= self.stop + 1e-9 {
            out.push(v);
            v += self.step;
        }
        out
    }
}

/// Parse a `start..stop..step` range expression.
pub fn parse_range(name: &str, expr: &str) -> Result<ParamRange, FxsimError> {
    let invalid = |reason: &str| FxsimError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = expr.trim().split("..").collect();
    if parts.len() != 3 {
        return Err(invalid("expected start..stop..step"));
    }

    let mut numbers = [0.0_f64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|_| invalid(&format!("not a number: {}", part.trim())))?;
    }

    let [start, stop, step] = numbers;
    if step <= 0.0 {
        return Err(invalid("step must be positive"));
    }
    if stop < start {
        return Err(invalid("stop must not be below start"));
    }

    Ok(ParamRange {
        name: name.to_string(),
        start,
        stop,
        step,
    })
}

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub params: Vec<(String, f64)>,
    pub performance_pct: f64,
    pub trades: usize,
}

/// Config view that overrides `[strategy]` keys with swept values.
struct ParamOverride<'a> {
    inner: &'a dyn ConfigPort,
    values: Vec<(String, f64)>,
}

impl ParamOverride<'_> {
    fn lookup(&self, section: &str, key: &str) -> Option<f64> {
        if section != "strategy" {
            return None;
        }
        self.values
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, v)| *v)
    }
}

impl ConfigPort for ParamOverride<'_> {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        if let Some(v) = self.lookup(section, key) {
            let formatted = if v.fract() == 0.0 {
                format!("{}", v as i64)
            } else {
                format!("{}", v)
            };
            return Some(formatted);
        }
        self.inner.get_string(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match self.lookup(section, key) {
            Some(v) => v.round() as i64,
            None => self.inner.get_int(section, key, default),
        }
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        match self.lookup(section, key) {
            Some(v) => v,
            None => self.inner.get_double(section, key, default),
        }
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.inner.get_bool(section, key, default)
    }
}

fn combinations(ranges: &[ParamRange]) -> Vec<Vec<(String, f64)>> {
    match ranges {
        [only] => only
            .values()
            .into_iter()
            .map(|v| vec![(only.name.clone(), v)])
            .collect(),
        [first, second] => {
            let mut combos = Vec::new();
            for a in first.values() {
                for b in second.values() {
                    combos.push(vec![(first.name.clone(), a), (second.name.clone(), b)]);
                }
            }
            combos
        }
        _ => Vec::new(),
    }
}

/// Run the grid. `strategy_config` supplies the strategy name and any
/// parameters not being swept.
pub fn sweep(
    bars: &[PriceBar],
    config: &BacktestConfig,
    strategy_config: &dyn ConfigPort,
    ranges: &[ParamRange],
) -> Result<Vec<SweepOutcome>, FxsimError> {
    if ranges.is_empty() || ranges.len() > 2 {
        return Err(FxsimError::ConfigInvalid {
            section: "optimize".into(),
            key: "ranges".into(),
            reason: "expected one or two parameter ranges".into(),
        });
    }

    let mut outcomes = Vec::new();

    for combo in combinations(ranges) {
        let overlay = ParamOverride {
            inner: strategy_config,
            values: combo.clone(),
        };

        let mut strategy = match build_strategy(&overlay) {
            Ok(s) => s,
            Err(FxsimError::InvalidParameter { .. }) => continue,
            Err(e) => return Err(e),
        };

        let result = match run_backtest(bars, strategy.as_mut(), config) {
            Ok(r) => r,
            Err(FxsimError::InsufficientData { .. }) => continue,
            Err(e) => return Err(e),
        };

        outcomes.push(SweepOutcome {
            params: combo,
            performance_pct: result.account.performance_pct(),
            trades: result.account.trades,
        });
    }

    outcomes.sort_by(|a, b| {
        b.performance_pct
            .partial_cmp(&a.performance_pct)
            .unwrap_or(Ordering::Equal)
            .then(a.trades.cmp(&b.trades))
    });

    Ok(outcomes)
}
