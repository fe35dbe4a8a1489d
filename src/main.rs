//! Triple reversal strategy - main entry point
//!
//! This binary provides two subcommands:
//! - backtest: Run the strategy over a CSV bar file and export intents
//! - diagnostics: Export only the plot series (baseline, oscillator, direction)

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "triple-reversal")]
#[command(about = "Triple-nested EMA reversal strategy: signals, position intents and diagnostics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Overrides shared by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/default.json")]
    pub config: String,

    /// Bar CSV file (overrides config)
    #[arg(short, long)]
    pub data: Option<String>,

    /// Window start (YYYY-MM-DD or YYYY-MM-DD HH:MM)
    #[arg(long)]
    pub start: Option<String>,

    /// Window stop (YYYY-MM-DD or YYYY-MM-DD HH:MM)
    #[arg(long)]
    pub stop: Option<String>,

    /// Use the baseline as a crossover trigger instead of a trend filter
    #[arg(long)]
    pub crossover: bool,

    /// Results directory (overrides config)
    #[arg(short, long)]
    pub output: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run strategy backtest
    Backtest {
        #[command(flatten)]
        args: RunArgs,

        /// Print every intent
        #[arg(long)]
        show_intents: bool,
    },

    /// Export the diagnostic series for plotting
    Diagnostics {
        #[command(flatten)]
        args: RunArgs,
    },
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    // Same format without ANSI colors
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Backtest { .. } => "backtest",
        Commands::Diagnostics { .. } => "diagnostics",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Backtest { args, show_intents } => commands::backtest::run(args, show_intents),
        Commands::Diagnostics { args } => commands::diagnostics::run(args),
    }
}
