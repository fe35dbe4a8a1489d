//! Backtest runner
//!
//! Drives a [`ReversalStrategy`] over a finished bar sequence and collects
//! the intents and diagnostics it emits. Fills, fees and slippage belong to
//! the execution collaborator and are not modeled here.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::StrategyParams;
use crate::diagnostics::{self, DiagnosticPoint};
use crate::error::ConfigResult;
use crate::position::Position;
use crate::strategy::ReversalStrategy;
use crate::types::{Bar, IntentKind, OrderIntent};
use crate::window::BacktestWindow;

/// Intent totals by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntentCounts {
    pub enter_long: usize,
    pub enter_short: usize,
    pub close_long: usize,
    pub close_short: usize,
}

impl IntentCounts {
    pub fn record(&mut self, kind: IntentKind) {
        match kind {
            IntentKind::EnterLong => self.enter_long += 1,
            IntentKind::EnterShort => self.enter_short += 1,
            IntentKind::CloseLong => self.close_long += 1,
            IntentKind::CloseShort => self.close_short += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.enter_long + self.enter_short + self.close_long + self.close_short
    }
}

/// Outcome of one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BacktestReport {
    pub bars_processed: usize,
    pub first_bar: Option<DateTime<Utc>>,
    pub last_bar: Option<DateTime<Utc>>,
    pub counts: IntentCounts,
    pub final_position: Position,
    #[serde(skip)]
    pub intents: Vec<OrderIntent>,
    #[serde(skip)]
    pub diagnostics: Vec<DiagnosticPoint>,
}

impl BacktestReport {
    /// Write `intents.csv`, `diagnostics.csv` and `summary.json` into `dir`
    pub fn export(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create results dir {}", dir.display()))?;

        write_intents_csv(dir.join("intents.csv"), &self.intents)?;
        diagnostics::write_csv(dir.join("diagnostics.csv"), &self.diagnostics)?;

        let summary = serde_json::to_string_pretty(self).context("Failed to serialize summary")?;
        fs::write(dir.join("summary.json"), summary).context("Failed to write summary")?;

        info!("Results written to {}", dir.display());
        Ok(())
    }
}

/// Write intents as CSV, one row per intent in emission order
pub fn write_intents_csv(path: impl AsRef<Path>, intents: &[OrderIntent]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer
        .write_record(["timestamp", "kind", "price", "quantity", "entry_price"])
        .context("Failed to write intents header")?;
    for intent in intents {
        writer
            .write_record([
                intent.timestamp.to_rfc3339(),
                intent.kind.to_string(),
                intent.price.to_string(),
                intent.quantity.to_string(),
                intent.entry_price.map(|p| p.to_string()).unwrap_or_default(),
            ])
            .context("Failed to write intent row")?;
    }

    writer.flush().context("Failed to flush intents")?;
    Ok(())
}

/// Backtest engine
pub struct Backtester {
    strategy: ReversalStrategy,
}

impl Backtester {
    pub fn new(params: StrategyParams, window: BacktestWindow) -> ConfigResult<Self> {
        Ok(Self {
            strategy: ReversalStrategy::new(params, window)?,
        })
    }

    pub fn from_strategy(strategy: ReversalStrategy) -> Self {
        Self { strategy }
    }

    /// Run over the full bar sequence from a fresh state
    pub fn run(&mut self, bars: &[Bar]) -> BacktestReport {
        self.strategy.reset();

        let mut report = BacktestReport {
            diagnostics: Vec::with_capacity(bars.len()),
            ..Default::default()
        };

        if bars.is_empty() {
            warn!("No bars to process");
            return report;
        }

        let warm_up = self.strategy.params().warm_up_bars();
        if bars.len() < warm_up {
            warn!(
                bars = bars.len(),
                warm_up, "Fewer bars than the warm-up period, no entries possible"
            );
        }

        for bar in bars {
            let output = self.strategy.on_bar(bar);
            for intent in &output.intents {
                report.counts.record(intent.kind);
            }
            report.intents.extend(output.intents);
            report.diagnostics.push(output.diagnostics);
        }

        report.bars_processed = self.strategy.bars_processed();
        report.first_bar = bars.first().map(|b| b.timestamp);
        report.last_bar = bars.last().map(|b| b.timestamp);
        report.final_position = self.strategy.position().clone();

        info!(
            bars = report.bars_processed,
            intents = report.counts.total(),
            final_state = ?report.final_position.state,
            "Backtest finished"
        );

        report
    }

    pub fn strategy(&self) -> &ReversalStrategy {
        &self.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionState;
    use chrono::{Duration, TimeZone};

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let t0 = Utc.with_ymd_and_hms(2017, 1, 2, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new_unchecked(t0 + Duration::days(i as i64), c, c, c, c, 1.0))
            .collect()
    }

    fn params() -> StrategyParams {
        StrategyParams {
            baseline_length: 5,
            attack_length: 3,
            ..StrategyParams::default()
        }
    }

    #[test]
    fn test_empty_input() {
        let mut backtester = Backtester::new(params(), BacktestWindow::unbounded()).unwrap();
        let report = backtester.run(&[]);
        assert_eq!(report.bars_processed, 0);
        assert!(report.intents.is_empty());
        assert_eq!(report.first_bar, None);
    }

    #[test]
    fn test_report_collects_everything() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let series = bars(&closes);
        let mut backtester = Backtester::new(params(), BacktestWindow::unbounded()).unwrap();
        let report = backtester.run(&series);

        assert_eq!(report.bars_processed, 25);
        assert_eq!(report.diagnostics.len(), 25);
        assert_eq!(report.counts.enter_long, 1);
        assert_eq!(report.counts.total(), report.intents.len());
        assert_eq!(report.final_position.state, PositionState::Long);
        assert_eq!(report.last_bar, Some(series[24].timestamp));
    }

    #[test]
    fn test_runs_are_independent() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + (i as f64 * 0.5).sin() * 4.0)
            .collect();
        let series = bars(&closes);
        let mut backtester = Backtester::new(params(), BacktestWindow::unbounded()).unwrap();

        let first = backtester.run(&series);
        let second = backtester.run(&series);
        assert_eq!(first.intents, second.intents);
        assert_eq!(first.diagnostics, second.diagnostics);
    }

    #[test]
    fn test_intent_counts() {
        let mut counts = IntentCounts::default();
        counts.record(IntentKind::EnterLong);
        counts.record(IntentKind::CloseLong);
        counts.record(IntentKind::EnterShort);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.close_short, 0);
    }

    #[test]
    fn test_export_writes_files() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let mut backtester = Backtester::new(params(), BacktestWindow::unbounded()).unwrap();
        let report = backtester.run(&bars(&closes));

        let dir = std::env::temp_dir().join(format!("triple_reversal_export_{}", std::process::id()));
        report.export(&dir).unwrap();

        let intents = std::fs::read_to_string(dir.join("intents.csv")).unwrap();
        assert!(intents.starts_with("timestamp,kind,price,quantity,entry_price"));
        assert!(intents.contains("EnterLong"));
        assert!(dir.join("diagnostics.csv").exists());

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("summary.json")).unwrap())
                .unwrap();
        assert_eq!(summary["bars_processed"], 25);
        assert_eq!(summary["counts"]["enter_long"], 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
