//! Single-position state machine
//!
//! Tracks the net position and turns window-gated signals into order
//! intents. Per bar, entries are evaluated before exits. Reversing an open
//! position emits the close intent first, then the opposite entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::signals::SignalSet;
use crate::types::{Bar, IntentKind, OrderIntent};

/// Net position state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionState {
    #[default]
    Flat,
    Long,
    Short,
}

/// The run's single position
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub state: PositionState,
    pub entry_price: Option<f64>,
    pub entry_time: Option<DateTime<Utc>>,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.state == PositionState::Flat
    }
}

/// Guard flags the state machine evaluates for one bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarGuards {
    pub signals: SignalSet,
    pub in_window: bool,
    pub exit_on_reversal: bool,
}

/// Owns the position and emits intents on transitions
#[derive(Debug, Clone)]
pub struct PositionStateMachine {
    position: Position,
    quantity: f64,
}

impl PositionStateMachine {
    pub fn new(quantity: f64) -> Self {
        Self {
            position: Position::default(),
            quantity,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn state(&self) -> PositionState {
        self.position.state
    }

    /// Apply one bar's guards and return the intents it produced, in order
    ///
    /// Entries are evaluated before exits, so a position entered on a bar
    /// that also carries its exit signal is closed on that same bar.
    pub fn on_bar(&mut self, bar: &Bar, guards: BarGuards) -> Vec<OrderIntent> {
        let mut intents = Vec::new();
        let signals = guards.signals;

        if signals.bull_attack && guards.in_window {
            self.enter(PositionState::Long, bar, &mut intents);
        }

        if signals.bear_attack && guards.in_window {
            self.enter(PositionState::Short, bar, &mut intents);
        }

        if guards.exit_on_reversal {
            if signals.exit_buys && self.position.state == PositionState::Long {
                self.close(bar, &mut intents);
            }
            if signals.exit_sells && self.position.state == PositionState::Short {
                self.close(bar, &mut intents);
            }
        }

        intents
    }

    /// Start a fresh run
    pub fn reset(&mut self) {
        self.position = Position::default();
    }

    fn enter(&mut self, target: PositionState, bar: &Bar, intents: &mut Vec<OrderIntent>) {
        if self.position.state == target {
            debug!(timestamp = %bar.timestamp, state = ?target, "Entry ignored, already positioned");
            return;
        }

        if !self.position.is_flat() {
            self.close(bar, intents);
        }

        let kind = match target {
            PositionState::Long => IntentKind::EnterLong,
            PositionState::Short => IntentKind::EnterShort,
            PositionState::Flat => return,
        };

        self.position = Position {
            state: target,
            entry_price: Some(bar.close),
            entry_time: Some(bar.timestamp),
        };

        debug!(timestamp = %bar.timestamp, price = bar.close, intent = %kind, "Position opened");
        intents.push(self.intent(kind, bar, None));
    }

    fn close(&mut self, bar: &Bar, intents: &mut Vec<OrderIntent>) {
        let kind = match self.position.state {
            PositionState::Long => IntentKind::CloseLong,
            PositionState::Short => IntentKind::CloseShort,
            PositionState::Flat => return,
        };

        let entry_price = self.position.entry_price;
        self.position = Position::default();

        debug!(timestamp = %bar.timestamp, price = bar.close, intent = %kind, "Position closed");
        intents.push(self.intent(kind, bar, entry_price));
    }

    fn intent(&self, kind: IntentKind, bar: &Bar, entry_price: Option<f64>) -> OrderIntent {
        OrderIntent {
            kind,
            timestamp: bar.timestamp,
            price: bar.close,
            quantity: self.quantity,
            entry_price,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
