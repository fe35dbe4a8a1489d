//! Plot-ready diagnostic series
//!
//! Observational only: nothing here feeds back into trading state.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::oscillator::OscillatorReading;
use crate::types::Direction;

/// Values plotted for one bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticPoint {
    pub timestamp: DateTime<Utc>,
    pub baseline: Option<f64>,
    pub oscillator: Option<f64>,
    /// `None` until the oscillator has one bar of history
    pub direction: Option<Direction>,
}

impl DiagnosticPoint {
    pub fn new(
        timestamp: DateTime<Utc>,
        baseline: Option<f64>,
        reading: OscillatorReading,
    ) -> Self {
        Self {
            timestamp,
            baseline,
            oscillator: reading.current,
            direction: reading
                .pair()
                .map(|(previous, current)| Direction::between(previous, current)),
        }
    }
}

/// Write the series as `timestamp,baseline,oscillator,direction`.
///
/// Undefined values are written as empty fields.
pub fn write_csv(path: impl AsRef<Path>, points: &[DiagnosticPoint]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for point in points {
        writer
            .serialize(point)
            .context("Failed to write diagnostic row")?;
    }

    writer.flush().context("Failed to flush diagnostics")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 5, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_direction_from_reading() {
        let rising = DiagnosticPoint::new(
            ts(),
            Some(100.0),
            OscillatorReading {
                current: Some(1.2),
                previous: Some(1.0),
            },
        );
        assert_eq!(rising.direction, Some(Direction::Rising));
        assert_eq!(rising.oscillator, Some(1.2));

        let flat = DiagnosticPoint::new(
            ts(),
            None,
            OscillatorReading {
                current: Some(1.0),
                previous: Some(1.0),
            },
        );
        assert_eq!(flat.direction, Some(Direction::Falling));
    }

    #[test]
    fn test_warm_up_has_no_direction() {
        let point = DiagnosticPoint::new(
            ts(),
            None,
            OscillatorReading {
                current: Some(1.0),
                previous: None,
            },
        );
        assert_eq!(point.direction, None);
        assert_eq!(point.baseline, None);
    }

    #[test]
    fn test_write_csv() {
        let path = std::env::temp_dir().join(format!(
            "triple_reversal_diag_{}.csv",
            std::process::id()
        ));
        let points = vec![
            DiagnosticPoint::new(ts(), None, OscillatorReading::default()),
            DiagnosticPoint::new(
                ts(),
                Some(100.5),
                OscillatorReading {
                    current: Some(101.0),
                    previous: Some(100.0),
                },
            ),
        ];

        write_csv(&path, &points).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "timestamp,baseline,oscillator,direction");
        assert!(lines[1].ends_with(",,,"));
        assert!(lines[2].ends_with(",100.5,101.0,rising"));
    }
}
