//! Configuration validation run before a backtest starts.

use crate::domain::candle::parse_timestamp;
use crate::domain::error::FxsimError;
use crate::domain::granularity::Granularity;
use crate::domain::strategy::build_strategy;
use crate::ports::config_port::ConfigPort;

use chrono::NaiveDateTime;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), FxsimError> {
    validate_instrument(config)?;
    validate_granularity(config)?;
    validate_dates(config)?;
    validate_amount(config)?;
    validate_source(config)?;
    Ok(())
}

/// Strategy settings are valid when a strategy can be built from them.
pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), FxsimError> {
    build_strategy(config).map(|_| ())
}

fn validate_instrument(config: &dyn ConfigPort) -> Result<(), FxsimError> {
    let instrument = config
        .get_string("backtest", "instrument")
        .ok_or_else(|| FxsimError::ConfigMissing {
            section: "backtest".into(),
            key: "instrument".into(),
        })?;

    let trimmed = instrument.trim();
    if trimmed.is_empty() || !trimmed.contains('_') || trimmed.contains(char::is_whitespace) {
        return Err(FxsimError::ConfigInvalid {
            section: "backtest".into(),
            key: "instrument".into(),
            reason: "expected an instrument pair like EUR_USD".into(),
        });
    }
    Ok(())
}

fn validate_granularity(config: &dyn ConfigPort) -> Result<(), FxsimError> {
    match config.get_string("backtest", "granularity") {
        None => Ok(()), // defaults to D
        Some(s) => s
            .parse::<Granularity>()
            .map(|_| ())
            .map_err(|e| FxsimError::ConfigInvalid {
                section: "backtest".into(),
                key: "granularity".into(),
                reason: e.to_string(),
            }),
    }
}

fn parse_config_timestamp(
    value: Option<String>,
    key: &str,
) -> Result<NaiveDateTime, FxsimError> {
    let s = value.ok_or_else(|| FxsimError::ConfigMissing {
        section: "backtest".into(),
        key: key.into(),
    })?;
    parse_timestamp(&s).ok_or_else(|| FxsimError::ConfigInvalid {
        section: "backtest".into(),
        key: key.into(),
        reason: "expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS".into(),
    })
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), FxsimError> {
    let start = parse_config_timestamp(config.get_string("backtest", "start"), "start")?;
    let end = parse_config_timestamp(config.get_string("backtest", "end"), "end")?;

    if start >= end {
        return Err(FxsimError::ConfigInvalid {
            section: "backtest".into(),
            key: "start".into(),
            reason: "start must be before end".into(),
        });
    }
    Ok(())
}

fn validate_amount(config: &dyn ConfigPort) -> Result<(), FxsimError> {
    let amount = config.get_double("backtest", "amount", 100_000.0);
    if amount <= 0.0 {
        return Err(FxsimError::ConfigInvalid {
            section: "backtest".into(),
            key: "amount".into(),
            reason: "amount must be positive".into(),
        });
    }
    Ok(())
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), FxsimError> {
    match config.get_string("backtest", "source").as_deref() {
        None | Some("csv") | Some("sqlite") => Ok(()),
        Some(other) => Err(FxsimError::ConfigInvalid {
            section: "backtest".into(),
            key: "source".into(),
            reason: format!("unknown data source '{}' (expected csv or sqlite)", other),
        }),
    }
}
