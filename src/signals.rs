//! Entry and exit signal generation
//!
//! Signals are recomputed from scratch every bar. Any input that is still in
//! warm-up makes the signals that read it false.

use serde::{Deserialize, Serialize};

use crate::oscillator::OscillatorReading;

/// How the baseline SMA participates in entry signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalMode {
    /// Oscillator direction triggers, baseline vetoes counter-trend entries
    Filter,
    /// Oscillator crossing the baseline triggers
    Crossover,
}

impl SignalMode {
    pub fn from_filter_flag(baseline_filter: bool) -> Self {
        if baseline_filter {
            SignalMode::Filter
        } else {
            SignalMode::Crossover
        }
    }
}

/// Per-bar inputs to the signal generator
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalInputs {
    pub oscillator: OscillatorReading,
    pub baseline: Option<f64>,
    pub previous_baseline: Option<f64>,
    pub close: f64,
}

/// Signals for one bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SignalSet {
    pub bull_attack: bool,
    pub bear_attack: bool,
    pub exit_buys: bool,
    pub exit_sells: bool,
}

impl SignalSet {
    pub fn any(&self) -> bool {
        self.bull_attack || self.bear_attack || self.exit_buys || self.exit_sells
    }
}

/// `series` moved from at-or-below to above `reference`
pub fn crossover(prev: f64, current: f64, prev_reference: f64, reference: f64) -> bool {
    prev <= prev_reference && current > reference
}

/// `series` moved from at-or-above to below `reference`
pub fn crossunder(prev: f64, current: f64, prev_reference: f64, reference: f64) -> bool {
    prev >= prev_reference && current < reference
}

/// Evaluate entry and exit signals for one bar
pub fn generate(mode: SignalMode, inputs: &SignalInputs) -> SignalSet {
    let Some((prev_rev, rev)) = inputs.oscillator.pair() else {
        return SignalSet::default();
    };

    let rising = rev > prev_rev;
    let falling = rev < prev_rev;

    let (bull_attack, bear_attack) = match (mode, inputs.baseline) {
        (SignalMode::Filter, Some(sma)) => (
            rising && inputs.close > sma,
            falling && inputs.close < sma,
        ),
        (SignalMode::Crossover, Some(sma)) => match inputs.previous_baseline {
            Some(prev_sma) => (
                crossover(prev_rev, rev, prev_sma, sma),
                crossunder(prev_rev, rev, prev_sma, sma),
            ),
            None => (false, false),
        },
        (_, None) => (false, false),
    };

    SignalSet {
        bull_attack,
        bear_attack,
        exit_buys: falling,
        exit_sells: rising,
    }
}

// =============================================================================
// Tests
// =============================================================================
