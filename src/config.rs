//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files. Every field has a
//! default, so `{}` is a complete configuration. Validation into
//! [`StrategyParams`] happens once, before any bar is processed.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};
use crate::signals::SignalMode;
use crate::types::PriceSource;
use crate::window::{BacktestWindow, WindowBound};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        Ok(config)
    }

    /// Validated strategy parameters
    pub fn strategy_params(&self) -> ConfigResult<StrategyParams> {
        StrategyParams::try_from(&self.strategy)
    }

    /// Resolved evaluation window
    pub fn window(&self) -> ConfigResult<BacktestWindow> {
        match &self.backtest.window {
            Some(window) => window.resolve(),
            None => Ok(BacktestWindow::unbounded()),
        }
    }
}

/// Raw strategy inputs as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// SMA length of the baseline (default: 200)
    #[serde(default = "default_baseline_length")]
    pub baseline_length: usize,

    /// EMA length shared by all oscillator stages (default: 7)
    #[serde(default = "default_attack_length")]
    pub attack_length: usize,

    /// Bar field fed to the oscillator (default: close)
    #[serde(default)]
    pub source: PriceSource,

    /// Use the baseline only as a trend filter (default: true)
    #[serde(default = "default_true")]
    pub baseline_filter: bool,

    /// Weight of the second-order EMA correction, clamped to [0, 1] (default: 0.7)
    #[serde(default = "default_volume_factor")]
    pub volume_factor: f64,

    /// Close positions when the oscillator turns (default: true)
    #[serde(default = "default_true")]
    pub exit_on_reversal: bool,

    /// Fixed quantity attached to every intent (default: 4)
    #[serde(default = "default_order_quantity")]
    pub order_quantity: f64,
}

fn default_baseline_length() -> usize { 200 }
fn default_attack_length() -> usize { 7 }
fn default_true() -> bool { true }
fn default_volume_factor() -> f64 { 0.7 }
fn default_order_quantity() -> f64 { 4.0 }

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            baseline_length: default_baseline_length(),
            attack_length: default_attack_length(),
            source: PriceSource::default(),
            baseline_filter: default_true(),
            volume_factor: default_volume_factor(),
            exit_on_reversal: default_true(),
            order_quantity: default_order_quantity(),
        }
    }
}

/// Validated, immutable strategy parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrategyParams {
    pub baseline_length: usize,
    pub attack_length: usize,
    pub source: PriceSource,
    pub mode: SignalMode,
    /// Always within [0, 1]
    pub volume_factor: f64,
    pub exit_on_reversal: bool,
    pub order_quantity: f64,
}

impl StrategyParams {
    /// Bars needed before both the baseline and the oscillator are defined
    pub fn warm_up_bars(&self) -> usize {
        self.baseline_length.max(self.attack_length)
    }
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            baseline_length: default_baseline_length(),
            attack_length: default_attack_length(),
            source: PriceSource::default(),
            mode: SignalMode::Filter,
            volume_factor: default_volume_factor(),
            exit_on_reversal: true,
            order_quantity: default_order_quantity(),
        }
    }
}

impl TryFrom<&StrategyConfig> for StrategyParams {
    type Error = ConfigError;

    fn try_from(config: &StrategyConfig) -> Result<Self, Self::Error> {
        if config.baseline_length == 0 {
            return Err(ConfigError::NonPositiveLength {
                name: "baseline_length",
                value: config.baseline_length,
            });
        }
        if config.attack_length == 0 {
            return Err(ConfigError::NonPositiveLength {
                name: "attack_length",
                value: config.attack_length,
            });
        }
        if config.order_quantity.is_nan() || config.order_quantity <= 0.0 {
            return Err(ConfigError::NonPositiveQuantity(config.order_quantity));
        }

        Ok(Self {
            baseline_length: config.baseline_length,
            attack_length: config.attack_length,
            source: config.source,
            mode: SignalMode::from_filter_flag(config.baseline_filter),
            volume_factor: clamp_volume_factor(config.volume_factor),
            exit_on_reversal: config.exit_on_reversal,
            order_quantity: config.order_quantity,
        })
    }
}

/// Clamp into [0, 1]; NaN falls back to the default
pub fn clamp_volume_factor(value: f64) -> f64 {
    if value.is_nan() {
        warn!(
            default = default_volume_factor(),
            "volume_factor is NaN, using default"
        );
        return default_volume_factor();
    }

    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        warn!(value, clamped, "volume_factor outside [0, 1], clamped");
    }
    clamped
}

/// Backtest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// CSV file with `datetime,open,high,low,close,volume` rows
    #[serde(default = "default_data_file")]
    pub data_file: String,

    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    /// Entry window; omitted means every bar is eligible
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowConfig>,
}

fn default_data_file() -> String { "data/bars.csv".to_string() }
fn default_results_dir() -> String { "results".to_string() }

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            results_dir: default_results_dir(),
            window: None,
        }
    }
}

/// Window bounds as calendar components.
///
/// A bound left out of the object falls back to 2016-09-30 / 2018-01-10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub start: WindowBound,
    pub stop: WindowBound,
}

impl WindowConfig {
    pub fn resolve(&self) -> ConfigResult<BacktestWindow> {
        Ok(BacktestWindow::new(
            self.start.resolve("start")?,
            self.stop.resolve("stop")?,
        ))
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: WindowBound::date(2016, 9, 30),
            stop: WindowBound::date(2018, 1, 10),
        }
    }
}
