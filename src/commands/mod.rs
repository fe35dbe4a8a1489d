//! Subcommand implementations

pub mod backtest;
pub mod diagnostics;

use anyhow::{Context, Result};
use tracing::info;
use triple_reversal::{data, BacktestWindow, Bar, Config, StrategyParams};

use crate::RunArgs;

/// Everything a subcommand needs to start a run
pub struct RunSetup {
    pub params: StrategyParams,
    pub window: BacktestWindow,
    pub bars: Vec<Bar>,
    pub results_dir: String,
}

/// Load config, apply CLI overrides, validate and load bars
pub fn prepare(args: &RunArgs) -> Result<RunSetup> {
    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config))?;
    info!("Loaded configuration from: {}", args.config);

    if let Some(data_file) = &args.data {
        info!("Overriding data file to: {}", data_file);
        config.backtest.data_file = data_file.clone();
    }

    if args.crossover {
        info!("Overriding signal mode to: crossover");
        config.strategy.baseline_filter = false;
    }

    if let Some(output) = &args.output {
        config.backtest.results_dir = output.clone();
    }

    let params = config.strategy_params()?;
    let mut window = config.window()?;

    if let Some(start) = &args.start {
        info!("Overriding window start to: {}", start);
        window.start = Some(data::parse_date(start)?);
    }

    if let Some(stop) = &args.stop {
        info!("Overriding window stop to: {}", stop);
        window.stop = Some(data::parse_date(stop)?);
    }

    info!("Loading bars from: {}", config.backtest.data_file);
    let bars = data::load_csv(&config.backtest.data_file)?;

    Ok(RunSetup {
        params,
        window,
        bars,
        results_dir: config.backtest.results_dir,
    })
}
