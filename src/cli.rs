//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::chart_svg::render_backtest_chart;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report;
use crate::domain::backtest::{run_backtest, BacktestConfig};
use crate::domain::candle::{derive_bars, parse_timestamp};
use crate::domain::config_validation::{validate_backtest_config, validate_strategy_config};
use crate::domain::error::FxsimError;
use crate::domain::granularity::Granularity;
use crate::domain::metrics::Metrics;
use crate::domain::optimize::{parse_range, sweep, ParamRange};
use crate::domain::strategy::{build_strategy, param_names, Strategy};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "fxsim", about = "Iterative FX strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: Option<PathBuf>,
        #[arg(long)]
        instrument: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        chart: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Sweep strategy parameters over ranges from [optimize]
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// List instruments available in the data source
    ListInstruments {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the available candle range for an instrument
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        instrument: Option<String>,
    },
    /// Load a candle CSV file into the sqlite store
    #[cfg(feature = "sqlite")]
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        instrument: String,
        #[arg(long)]
        granularity: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            strategy,
            instrument,
            output,
            chart,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, strategy.as_ref())
            } else {
                run_backtest_command(
                    &config,
                    strategy.as_ref(),
                    instrument.as_deref(),
                    output.as_ref(),
                    chart.as_ref(),
                )
            }
        }
        Command::Optimize { config } => run_optimize(&config),
        Command::Validate { strategy } => run_validate(&strategy),
        Command::ListInstruments { config } => run_list_instruments(&config),
        Command::Info { config, instrument } => run_info(&config, instrument.as_deref()),
        #[cfg(feature = "sqlite")]
        Command::Import {
            config,
            csv,
            instrument,
            granularity,
        } => run_import(&config, &csv, &instrument, &granularity),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = FxsimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, FxsimError> {
    let instrument =
        adapter
            .get_string("backtest", "instrument")
            .ok_or_else(|| FxsimError::ConfigMissing {
                section: "backtest".into(),
                key: "instrument".into(),
            })?;

    let granularity = adapter
        .get_string("backtest", "granularity")
        .unwrap_or_else(|| "D".to_string())
        .parse::<Granularity>()
        .map_err(|e| FxsimError::ConfigInvalid {
            section: "backtest".into(),
            key: "granularity".into(),
            reason: e.to_string(),
        })?;

    let start_str =
        adapter
            .get_string("backtest", "start")
            .ok_or_else(|| FxsimError::ConfigMissing {
                section: "backtest".into(),
                key: "start".into(),
            })?;
    let end_str = adapter
        .get_string("backtest", "end")
        .ok_or_else(|| FxsimError::ConfigMissing {
            section: "backtest".into(),
            key: "end".into(),
        })?;

    let start = parse_timestamp(&start_str).ok_or_else(|| FxsimError::ConfigInvalid {
        section: "backtest".into(),
        key: "start".into(),
        reason: "expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS".into(),
    })?;
    let end = parse_timestamp(&end_str).ok_or_else(|| FxsimError::ConfigInvalid {
        section: "backtest".into(),
        key: "end".into(),
        reason: "expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS".into(),
    })?;

    Ok(BacktestConfig {
        instrument: instrument.trim().to_uppercase(),
        granularity,
        start,
        end,
        amount: adapter.get_double("backtest", "amount", 100_000.0),
        use_spread: adapter.get_bool("backtest", "use_spread", true),
    })
}

pub fn resolve_instrument(
    instrument_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Option<String> {
    if let Some(i) = instrument_override {
        return Some(i.trim().to_uppercase());
    }
    config
        .get_string("backtest", "instrument")
        .map(|i| i.trim().to_uppercase())
        .filter(|i| !i.is_empty())
}

/// Open the configured data source (`[backtest] source`, default csv).
pub fn open_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, FxsimError> {
    let source = config
        .get_string("backtest", "source")
        .unwrap_or_else(|| "csv".to_string());

    match source.as_str() {
        "csv" => {
            let dir = config
                .get_string("data", "csv_dir")
                .ok_or_else(|| FxsimError::ConfigMissing {
                    section: "data".into(),
                    key: "csv_dir".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))))
        }
        "sqlite" => {
            #[cfg(feature = "sqlite")]
            {
                use crate::adapters::sqlite_adapter::SqliteAdapter;
                let adapter = SqliteAdapter::from_config(config)?;
                adapter.initialize_schema()?;
                Ok(Box::new(adapter))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                Err(FxsimError::ConfigInvalid {
                    section: "backtest".into(),
                    key: "source".into(),
                    reason: "sqlite feature is not enabled in this build".into(),
                })
            }
        }
        other => Err(FxsimError::ConfigInvalid {
            section: "backtest".into(),
            key: "source".into(),
            reason: format!("unknown data source '{}' (expected csv or sqlite)", other),
        }),
    }
}

fn run_backtest_command(
    config_path: &PathBuf,
    strategy_path: Option<&PathBuf>,
    instrument_override: Option<&str>,
    output_path: Option<&PathBuf>,
    chart_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate backtest config
    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 3: Resolve strategy source, validate, build
    let strategy_adapter: Option<FileConfigAdapter>;
    let strategy_config: &dyn ConfigPort = if let Some(strat_path) = strategy_path {
        eprintln!("Loading strategy from {}", strat_path.display());
        strategy_adapter = Some(match load_config(strat_path) {
            Ok(a) => a,
            Err(code) => return code,
        });
        strategy_adapter.as_ref().unwrap()
    } else {
        &adapter
    };

    let mut strategy = match build_strategy(strategy_config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Loading strategy: {}", strategy.name());

    // Stage 4: Build BacktestConfig, apply instrument override
    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Some(instrument) = resolve_instrument(instrument_override, &adapter) {
        bt_config.instrument = instrument;
    }

    // Stage 5: Open the data source
    let data_port = match open_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // CLI flags win over [report] config keys
    let output = output_path
        .cloned()
        .or_else(|| adapter.get_string("report", "output").map(PathBuf::from));
    let chart = chart_path
        .cloned()
        .or_else(|| adapter.get_string("report", "chart").map(PathBuf::from));

    run_backtest_pipeline(
        data_port.as_ref(),
        strategy.as_mut(),
        &bt_config,
        output.as_ref(),
        chart.as_ref(),
    )
}

/// Stages 6-10: fetch candles, run the engine, report.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: &mut dyn Strategy,
    bt_config: &BacktestConfig,
    output_path: Option<&PathBuf>,
    chart_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 6: Fetch candles and derive bars
    eprintln!(
        "Fetching {} {} candles, {} to {}",
        bt_config.instrument,
        bt_config.granularity,
        bt_config.start.format("%Y-%m-%d"),
        bt_config.end.format("%Y-%m-%d"),
    );

    let candles = match data_port.fetch_candles(
        &bt_config.instrument,
        bt_config.granularity,
        bt_config.start,
        bt_config.end,
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if candles.is_empty() {
        let err = FxsimError::NoData {
            instrument: bt_config.instrument.clone(),
            granularity: bt_config.granularity.to_string(),
        };
        eprintln!("error: {err}");
        return (&err).into();
    }

    let bars = derive_bars(&candles);
    eprintln!("  {} bars [OK]", bars.len());

    // Stage 7: Run the engine
    let result = match run_backtest(&bars, strategy, bt_config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 8: Compute metrics
    let metrics = Metrics::compute(&result, &bars, bt_config.granularity);

    // Stage 9: Print console summary to stderr
    eprintln!("\n=== Results ===");
    eprintln!("Net Performance:  {:+.2}%", metrics.net_performance_pct);
    eprintln!("Buy & Hold:       {:+.2}%", metrics.buy_hold_pct);
    eprintln!("Outperformance:   {:+.2}%", metrics.outperformance_pct);
    eprintln!("Sharpe:           {:.2}", metrics.sharpe);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Trades:           {}", metrics.trades);

    // Stage 10: Write report and optional chart
    let output = output_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from("report.txt"));

    if let Err(e) = text_report::write_report(&output, strategy.name(), bt_config, &result, &metrics)
    {
        eprintln!("error: failed to write report: {e}");
        return (&e).into();
    }
    eprintln!("\nReport written to: {}", output.display());

    if let Some(chart) = chart_path {
        let svg = render_backtest_chart(&bt_config.instrument, &bars, &result.equity_curve);
        if let Err(e) = std::fs::write(chart, svg) {
            eprintln!("error: failed to write chart: {e}");
            return ExitCode::from(1);
        }
        eprintln!("Chart written to: {}", chart.display());
    }

    ExitCode::SUCCESS
}

pub fn run_dry_run(config_path: &PathBuf, strategy_path: Option<&PathBuf>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let strategy_adapter: Option<FileConfigAdapter>;
    let strategy_config: &dyn ConfigPort = if let Some(strat_path) = strategy_path {
        strategy_adapter = Some(match load_config(strat_path) {
            Ok(a) => a,
            Err(code) => return code,
        });
        strategy_adapter.as_ref().unwrap()
    } else {
        &adapter
    };

    let strategy = match build_strategy(strategy_config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Config validated successfully");
    eprintln!("\nPlan:");
    eprintln!("  strategy:    {} (warmup {} bars)", strategy.name(), strategy.warmup());
    eprintln!(
        "  instrument:  {} ({})",
        bt_config.instrument, bt_config.granularity
    );
    eprintln!(
        "  period:      {} to {}",
        bt_config.start.format("%Y-%m-%d"),
        bt_config.end.format("%Y-%m-%d")
    );
    eprintln!("  amount:      {:.2}", bt_config.amount);
    eprintln!(
        "  spread:      {}",
        if bt_config.use_spread { "on" } else { "off" }
    );

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

/// Collect `[optimize]` ranges for the configured strategy's parameters.
pub fn collect_ranges(adapter: &dyn ConfigPort) -> Result<Vec<ParamRange>, FxsimError> {
    let name = adapter
        .get_string("strategy", "name")
        .ok_or_else(|| FxsimError::ConfigMissing {
            section: "strategy".into(),
            key: "name".into(),
        })?;

    let mut ranges = Vec::new();
    for key in param_names(&name) {
        if let Some(expr) = adapter.get_string("optimize", key) {
            ranges.push(parse_range(key, &expr)?);
        }
    }
    Ok(ranges)
}

fn run_optimize(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let ranges = match collect_ranges(&adapter) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if ranges.is_empty() {
        eprintln!("error: no parameter ranges found in [optimize]");
        return ExitCode::from(2);
    }

    let data_port = match open_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let candles = match data_port.fetch_candles(
        &bt_config.instrument,
        bt_config.granularity,
        bt_config.start,
        bt_config.end,
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let bars = derive_bars(&candles);

    eprintln!(
        "Sweeping {} over {} bars",
        ranges
            .iter()
            .map(|r| format!("{} = {}..{}..{}", r.name, r.start, r.stop, r.step))
            .collect::<Vec<_>>()
            .join(", "),
        bars.len(),
    );

    let outcomes = match sweep(&bars, &bt_config, &adapter, &ranges) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if outcomes.is_empty() {
        eprintln!("error: no valid parameter combinations");
        return ExitCode::from(4);
    }

    for (rank, outcome) in outcomes.iter().enumerate() {
        let params = outcome
            .params
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:>3}. {}  performance {:+.2}%  trades {}",
            rank + 1,
            params,
            outcome.performance_pct,
            outcome.trades,
        );
    }

    eprintln!("\n{} combinations ranked", outcomes.len());
    ExitCode::SUCCESS
}

fn run_validate(strategy_path: &PathBuf) -> ExitCode {
    eprintln!("Validating strategy: {}", strategy_path.display());
    let adapter = match load_config(strategy_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match validate_strategy_config(&adapter) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    // build again for the echo; validation already proved it works
    if let Ok(strategy) = build_strategy(&adapter) {
        eprintln!("  strategy: {}", strategy.name());
        eprintln!("  warmup:   {} bars", strategy.warmup());
    }

    eprintln!("\nStrategy configuration is valid.");
    ExitCode::SUCCESS
}

fn run_list_instruments(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data_port = match open_data_port(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let instruments = match data_port.list_instruments() {
        Ok(i) => i,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if instruments.is_empty() {
        eprintln!("No instruments found");
    } else {
        for instrument in &instruments {
            println!("{}", instrument);
        }
        eprintln!("{} instruments found", instruments.len());
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, instrument_override: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let Some(instrument) = resolve_instrument(instrument_override, &config) else {
        eprintln!("error: instrument is required (use --instrument or set in config)");
        return ExitCode::from(2);
    };

    let granularity = match config
        .get_string("backtest", "granularity")
        .unwrap_or_else(|| "D".to_string())
        .parse::<Granularity>()
    {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let data_port = match open_data_port(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    match data_port.data_range(&instrument, granularity) {
        Ok(Some((min, max, count))) => {
            println!(
                "{} {}: {} candles, {} to {}",
                instrument,
                granularity,
                count,
                min.format("%Y-%m-%d"),
                max.format("%Y-%m-%d")
            );
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{} {}: no data found", instrument, granularity);
            ExitCode::from(5)
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

#[cfg(feature = "sqlite")]
fn run_import(
    config_path: &PathBuf,
    csv_path: &PathBuf,
    instrument: &str,
    granularity: &str,
) -> ExitCode {
    use crate::adapters::csv_adapter::parse_candle_csv;
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let granularity = match granularity.parse::<Granularity>() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let instrument = instrument.trim().to_uppercase();

    let content = match std::fs::read_to_string(csv_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", csv_path.display(), e);
            return ExitCode::from(1);
        }
    };

    let candles = match parse_candle_csv(&content, &instrument, granularity) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let adapter = match SqliteAdapter::from_config(&config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Err(e) = adapter.initialize_schema() {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = adapter.insert_candles(&candles) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!(
        "Imported {} candles for {} ({})",
        candles.len(),
        instrument,
        granularity
    );
    ExitCode::SUCCESS
}
