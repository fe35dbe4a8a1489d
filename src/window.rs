//! Backtest evaluation window
//!
//! Gates entries to an inclusive timestamp range. Exits are never gated.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Calendar timestamp with minute granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBound {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
}

impl WindowBound {
    pub fn date(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
        }
    }

    /// Resolve to a UTC timestamp, rejecting impossible dates
    pub fn resolve(&self, bound: &'static str) -> ConfigResult<DateTime<Utc>> {
        Utc.with_ymd_and_hms(self.year, self.month, self.day, self.hour, self.minute, 0)
            .single()
            .ok_or(ConfigError::InvalidDate {
                bound,
                year: self.year,
                month: self.month,
                day: self.day,
                hour: self.hour,
                minute: self.minute,
            })
    }
}

/// Inclusive `[start, stop]` range; a missing bound is open-ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BacktestWindow {
    pub start: Option<DateTime<Utc>>,
    pub stop: Option<DateTime<Utc>>,
}

impl BacktestWindow {
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            stop: Some(stop),
        }
    }

    /// Window that admits every bar
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let after_start = self.start.is_none_or(|s| timestamp >= s);
        let before_stop = self.stop.is_none_or(|e| timestamp <= e);
        after_start && before_stop
    }

    /// Stop precedes start, so no bar can match
    pub fn is_empty(&self) -> bool {
        matches!((self.start, self.stop), (Some(s), Some(e)) if e < s)
    }
}

impl std::fmt::Display for BacktestWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_bound = |b: Option<DateTime<Utc>>| {
            b.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        write!(f, "[{} .. {}]", fmt_bound(self.start), fmt_bound(self.stop))
    }
}
