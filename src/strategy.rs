//! Reversal strategy
//!
//! Wires the per-bar pipeline together:
//!
//! ```text
//! bar ─┬─> oscillator ─┐
//!      └─> baseline ───┴─> signals ─> window gate ─> position machine ─> intents
//!                      └─> diagnostics
//! ```
//!
//! All state is updated in dependency order before `on_bar` returns, so the
//! next bar never observes a partial update.

use tracing::{debug, info};

use crate::config::StrategyParams;
use crate::diagnostics::DiagnosticPoint;
use crate::error::ConfigResult;
use crate::indicators::Baseline;
use crate::oscillator::ReversalOscillator;
use crate::position::{BarGuards, Position, PositionState, PositionStateMachine};
use crate::signals::{self, SignalInputs, SignalSet};
use crate::types::{Bar, OrderIntent};
use crate::window::BacktestWindow;

/// Everything one bar produced
#[derive(Debug, Clone, PartialEq)]
pub struct BarOutput {
    pub signals: SignalSet,
    pub in_window: bool,
    pub intents: Vec<OrderIntent>,
    pub diagnostics: DiagnosticPoint,
}

/// Stateful strategy for one sequential bar stream
#[derive(Debug, Clone)]
pub struct ReversalStrategy {
    params: StrategyParams,
    window: BacktestWindow,
    oscillator: ReversalOscillator,
    baseline: Baseline,
    machine: PositionStateMachine,
    bars_processed: usize,
}

impl ReversalStrategy {
    pub fn new(params: StrategyParams, window: BacktestWindow) -> ConfigResult<Self> {
        let oscillator = ReversalOscillator::new(params.attack_length, params.volume_factor)?;
        let baseline = Baseline::new(params.baseline_length)?;

        info!(
            baseline_length = params.baseline_length,
            attack_length = params.attack_length,
            source = ?params.source,
            mode = ?params.mode,
            volume_factor = params.volume_factor,
            exit_on_reversal = params.exit_on_reversal,
            %window,
            "Reversal strategy initialized"
        );
        if window.is_empty() {
            info!(%window, "Window stop precedes start, no entries will be taken");
        }

        Ok(Self {
            params,
            window,
            oscillator,
            baseline,
            machine: PositionStateMachine::new(params.order_quantity),
            bars_processed: 0,
        })
    }

    /// Process one bar
    pub fn on_bar(&mut self, bar: &Bar) -> BarOutput {
        let reading = self.oscillator.update(self.params.source.value(bar));
        let baseline = self.baseline.update(bar.close);
        self.bars_processed += 1;

        let inputs = SignalInputs {
            oscillator: reading,
            baseline,
            previous_baseline: self.baseline.previous(),
            close: bar.close,
        };
        let signals = signals::generate(self.params.mode, &inputs);
        let in_window = self.window.contains(bar.timestamp);

        if signals.any() {
            debug!(
                timestamp = %bar.timestamp,
                rev = ?reading.current,
                prev_rev = ?reading.previous,
                baseline = ?baseline,
                close = bar.close,
                ?signals,
                in_window,
                "Signals"
            );
        }

        let intents = self.machine.on_bar(
            bar,
            BarGuards {
                signals,
                in_window,
                exit_on_reversal: self.params.exit_on_reversal,
            },
        );

        BarOutput {
            signals,
            in_window,
            intents,
            diagnostics: DiagnosticPoint::new(bar.timestamp, baseline, reading),
        }
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn window(&self) -> &BacktestWindow {
        &self.window
    }

    pub fn position(&self) -> &Position {
        self.machine.position()
    }

    pub fn state(&self) -> PositionState {
        self.machine.state()
    }

    pub fn bars_processed(&self) -> usize {
        self.bars_processed
    }

    /// Return to the freshly constructed state
    pub fn reset(&mut self) {
        self.oscillator.reset();
        self.baseline.reset();
        self.machine.reset();
        self.bars_processed = 0;
    }
}

// =============================================================================
// Tests
// =============================================================================
