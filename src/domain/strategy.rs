//! Trading strategies and the config-driven factory.
//!
//! A strategy is prepared once against the full bar series (computing
//! whatever indicator series it needs), then queried bar by bar for a
//! stance signal. Crossover-style strategies are always directional;
//! band/threshold strategies Hold between triggers so the account
//! keeps its stance.

use crate::domain::candle::PriceBar;
use crate::domain::error::FxsimError;
use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::stochastic::calculate_stochastic;
use crate::domain::indicator::IndicatorSeries;
use crate::ports::config_port::ConfigPort;

/// Desired stance for the current bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    GoLong,
    GoShort,
    GoNeutral,
    Hold,
}

pub trait Strategy {
    fn name(&self) -> &str;

    /// Bars to skip before the first signal is evaluated.
    fn warmup(&self) -> usize;

    /// Compute indicator state for the full bar series.
    fn prepare(&mut self, bars: &[PriceBar]);

    /// Stance for the bar at `index`. Must Hold while indicators are
    /// still warming up.
    fn signal(&self, index: usize) -> Signal;
}

/// Long when the fast SMA is above the slow SMA, short when below.
pub struct SmaCrossover {
    label: String,
    fast: usize,
    slow: usize,
    fast_series: Option<IndicatorSeries>,
    slow_series: Option<IndicatorSeries>,
}

impl SmaCrossover {
    pub fn new(fast: usize, slow: usize) -> Result<Self, FxsimError> {
        if fast < 1 {
            return Err(FxsimError::InvalidParameter {
                name: "fast".into(),
                reason: "fast period must be at least 1".into(),
            });
        }
        if slow <= fast {
            return Err(FxsimError::InvalidParameter {
                name: "slow".into(),
                reason: "slow period must be greater than fast".into(),
            });
        }
        Ok(SmaCrossover {
            label: format!("SMA Crossover ({fast}/{slow})"),
            fast,
            slow,
            fast_series: None,
            slow_series: None,
        })
    }
}

impl Strategy for SmaCrossover {
    fn name(&self) -> &str {
        &self.label
    }

    fn warmup(&self) -> usize {
        self.slow
    }

    fn prepare(&mut self, bars: &[PriceBar]) {
        self.fast_series = Some(calculate_sma(bars, self.fast));
        self.slow_series = Some(calculate_sma(bars, self.slow));
    }

    fn signal(&self, index: usize) -> Signal {
        let (Some(fast), Some(slow)) = (&self.fast_series, &self.slow_series) else {
            return Signal::Hold;
        };
        match (fast.simple(index), slow.simple(index)) {
            (Some(f), Some(s)) if f > s => Signal::GoLong,
            (Some(f), Some(s)) if f < s => Signal::GoShort,
            _ => Signal::Hold,
        }
    }
}

/// Contrarian Bollinger strategy: long below the lower band, short
/// above the upper band, flat again when the mid crosses the middle
/// band.
pub struct BollingerReversion {
    label: String,
    period: usize,
    mult_x100: u32,
    series: Option<IndicatorSeries>,
    mids: Vec<f64>,
}

impl BollingerReversion {
    pub fn new(period: usize, mult: f64) -> Result<Self, FxsimError> {
        if period < 2 {
            return Err(FxsimError::InvalidParameter {
                name: "period".into(),
                reason: "period must be at least 2".into(),
            });
        }
        if mult <= 0.0 {
            return Err(FxsimError::InvalidParameter {
                name: "mult".into(),
                reason: "band multiplier must be positive".into(),
            });
        }
        Ok(BollingerReversion {
            label: format!("Bollinger Reversion ({period}, {mult})"),
            period,
            mult_x100: (mult * 100.0).round() as u32,
            series: None,
            mids: Vec::new(),
        })
    }
}

impl Strategy for BollingerReversion {
    fn name(&self) -> &str {
        &self.label
    }

    fn warmup(&self) -> usize {
        self.period
    }

    fn prepare(&mut self, bars: &[PriceBar]) {
        self.series = Some(calculate_bollinger(bars, self.period, self.mult_x100));
        self.mids = bars.iter().map(|b| b.mid).collect();
    }

    fn signal(&self, index: usize) -> Signal {
        let Some(series) = &self.series else {
            return Signal::Hold;
        };
        let Some((upper, middle, lower)) = series.bollinger(index) else {
            return Signal::Hold;
        };
        let Some(&mid) = self.mids.get(index) else {
            return Signal::Hold;
        };

        if mid < lower {
            return Signal::GoLong;
        }
        if mid > upper {
            return Signal::GoShort;
        }

        // Crossing the middle band closes the reversion trade.
        if index > 0 {
            if let Some((_, prev_middle, _)) = series.bollinger(index - 1) {
                let prev_mid = self.mids[index - 1];
                if (mid - middle) * (prev_mid - prev_middle) < 0.0 {
                    return Signal::GoNeutral;
                }
            }
        }

        Signal::Hold
    }
}

/// Momentum strategy on the stochastic oscillator: long while %K is
/// above %D, short while below.
pub struct StochasticMomentum {
    label: String,
    k_period: usize,
    d_period: usize,
    series: Option<IndicatorSeries>,
}

impl StochasticMomentum {
    pub fn new(k_period: usize, d_period: usize) -> Result<Self, FxsimError> {
        if k_period < 1 {
            return Err(FxsimError::InvalidParameter {
                name: "k".into(),
                reason: "%K period must be at least 1".into(),
            });
        }
        if d_period < 1 {
            return Err(FxsimError::InvalidParameter {
                name: "d".into(),
                reason: "%D period must be at least 1".into(),
            });
        }
        Ok(StochasticMomentum {
            label: format!("Stochastic Momentum ({k_period}/{d_period})"),
            k_period,
            d_period,
            series: None,
        })
    }
}

impl Strategy for StochasticMomentum {
    fn name(&self) -> &str {
        &self.label
    }

    fn warmup(&self) -> usize {
        self.k_period + self.d_period
    }

    fn prepare(&mut self, bars: &[PriceBar]) {
        self.series = Some(calculate_stochastic(bars, self.k_period, self.d_period));
    }

    fn signal(&self, index: usize) -> Signal {
        let Some(series) = &self.series else {
            return Signal::Hold;
        };
        match series.stochastic(index) {
            Some((k, d)) if k > d => Signal::GoLong,
            Some((k, d)) if k < d => Signal::GoShort,
            _ => Signal::Hold,
        }
    }
}

/// RSI mean reversion: long when oversold, short when overbought,
/// Hold in between.
pub struct RsiReversion {
    label: String,
    period: usize,
    oversold: f64,
    overbought: f64,
    series: Option<IndicatorSeries>,
}

impl RsiReversion {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Result<Self, FxsimError> {
        if period < 1 {
            return Err(FxsimError::InvalidParameter {
                name: "period".into(),
                reason: "period must be at least 1".into(),
            });
        }
        if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
            return Err(FxsimError::InvalidParameter {
                name: "oversold".into(),
                reason: "thresholds must lie within 0..100".into(),
            });
        }
        if oversold >= overbought {
            return Err(FxsimError::InvalidParameter {
                name: "oversold".into(),
                reason: "oversold must be below overbought".into(),
            });
        }
        Ok(RsiReversion {
            label: format!("RSI Reversion ({period}, {oversold}/{overbought})"),
            period,
            oversold,
            overbought,
            series: None,
        })
    }
}

impl Strategy for RsiReversion {
    fn name(&self) -> &str {
        &self.label
    }

    fn warmup(&self) -> usize {
        self.period
    }

    fn prepare(&mut self, bars: &[PriceBar]) {
        self.series = Some(calculate_rsi(bars, self.period));
    }

    fn signal(&self, index: usize) -> Signal {
        let Some(series) = &self.series else {
            return Signal::Hold;
        };
        match series.simple(index) {
            Some(rsi) if rsi < self.oversold => Signal::GoLong,
            Some(rsi) if rsi > self.overbought => Signal::GoShort,
            _ => Signal::Hold,
        }
    }
}

fn canonical_name(name: &str) -> Option<&'static str> {
    let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
    match normalized.as_str() {
        "sma" | "sma_crossover" => Some("sma_crossover"),
        "bollinger" | "bollinger_reversion" | "bollinger_bands" => Some("bollinger_reversion"),
        "stochastic" | "stochastic_momentum" | "stochastic_oscillator" => {
            Some("stochastic_momentum")
        }
        "rsi" | "rsi_reversion" | "rsi_mean_reversion" => Some("rsi_reversion"),
        _ => None,
    }
}

/// The `[strategy]` parameter keys a strategy accepts, in config order.
pub fn param_names(name: &str) -> &'static [&'static str] {
    match canonical_name(name) {
        Some("sma_crossover") => &["fast", "slow"],
        Some("bollinger_reversion") => &["period", "mult"],
        Some("stochastic_momentum") => &["k", "d"],
        Some("rsi_reversion") => &["period", "oversold", "overbought"],
        _ => &[],
    }
}

fn positive_period(config: &dyn ConfigPort, key: &str, default: i64) -> Result<usize, FxsimError> {
    let value = config.get_int("strategy", key, default);
    if value < 1 {
        return Err(FxsimError::InvalidParameter {
            name: key.to_string(),
            reason: format!("{key} must be a positive integer"),
        });
    }
    Ok(value as usize)
}

/// Build a strategy from the `[strategy]` section of a config.
pub fn build_strategy(config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, FxsimError> {
    let name = config
        .get_string("strategy", "name")
        .ok_or_else(|| FxsimError::ConfigMissing {
            section: "strategy".into(),
            key: "name".into(),
        })?;

    match canonical_name(&name) {
        Some("sma_crossover") => {
            let fast = positive_period(config, "fast", 30)?;
            let slow = positive_period(config, "slow", 120)?;
            Ok(Box::new(SmaCrossover::new(fast, slow)?))
        }
        Some("bollinger_reversion") => {
            let period = positive_period(config, "period", 20)?;
            let mult = config.get_double("strategy", "mult", 2.0);
            Ok(Box::new(BollingerReversion::new(period, mult)?))
        }
        Some("stochastic_momentum") => {
            let k = positive_period(config, "k", 14)?;
            let d = positive_period(config, "d", 3)?;
            Ok(Box::new(StochasticMomentum::new(k, d)?))
        }
        Some("rsi_reversion") => {
            let period = positive_period(config, "period", 14)?;
            let oversold = config.get_double("strategy", "oversold", 30.0);
            let overbought = config.get_double("strategy", "overbought", 70.0);
            Ok(Box::new(RsiReversion::new(period, oversold, overbought)?))
        }
        _ => Err(FxsimError::UnknownStrategy { name }),
    }
}
