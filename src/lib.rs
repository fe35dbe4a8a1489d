//! Triple Reversal Strategy
//!
//! Signal-generation core of a momentum strategy. A three-level nested EMA
//! "reversal" oscillator is compared against a baseline SMA to produce entry
//! and exit signals, which drive a single flat/long/short position. The core
//! emits abstract order intents and plot diagnostics; order execution and
//! charting are left to collaborators.
//!
//! ## Example
//! ```no_run
//! use triple_reversal::{backtest::Backtester, data, Config};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file("configs/default.json")?;
//!     let bars = data::load_csv(&config.backtest.data_file)?;
//!     let mut backtester = Backtester::new(config.strategy_params()?, config.window()?)?;
//!     let report = backtester.run(&bars);
//!     println!("{} intents", report.intents.len());
//!     Ok(())
//! }
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod indicators;
pub mod oscillator;
pub mod position;
pub mod signals;
pub mod strategy;
pub mod types;
pub mod window;

pub use config::{Config, StrategyParams};
pub use error::ConfigError;
pub use position::{Position, PositionState};
pub use signals::{SignalMode, SignalSet};
pub use strategy::ReversalStrategy;
pub use types::*;
pub use window::BacktestWindow;
