//! Streaming indicators powered by the `ta` crate
//!
//! Both indicators are updated once per bar and keep only O(length) state:
//! - [`Smoother`]: exponential moving average seeded with the first sample
//! - [`Baseline`]: simple moving average of the close with a one-bar history

use ta::indicators::{ExponentialMovingAverage, SimpleMovingAverage};
use ta::{Next, Reset};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Smoother (EMA)
// =============================================================================

/// Running exponential moving average.
///
/// The first update seeds the value with the observed sample; every later
/// update applies `value + α·(input − value)` with `α = 2/(length+1)`.
#[derive(Debug, Clone)]
pub struct Smoother {
    length: usize,
    ema: ExponentialMovingAverage,
    value: Option<f64>,
}

impl Smoother {
    pub fn new(length: usize) -> ConfigResult<Self> {
        let ema = ExponentialMovingAverage::new(length).map_err(|_| {
            ConfigError::NonPositiveLength {
                name: "smoother length",
                value: length,
            }
        })?;

        Ok(Self {
            length,
            ema,
            value: None,
        })
    }

    /// Feed one sample and return the updated average
    pub fn update(&mut self, input: f64) -> f64 {
        let value = self.ema.next(input);
        self.value = Some(value);
        value
    }

    /// Current average, `None` before the first sample
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn is_initialized(&self) -> bool {
        self.value.is_some()
    }

    /// Smoothing factor `2/(length+1)`
    pub fn alpha(&self) -> f64 {
        2.0 / (self.length as f64 + 1.0)
    }

    pub fn reset(&mut self) {
        self.ema.reset();
        self.value = None;
    }
}

// =============================================================================
// Baseline (SMA)
// =============================================================================

/// Simple moving average over a fixed number of bars.
///
/// Undefined until `length` samples exist. The previous bar's value is kept
/// for crossover detection.
#[derive(Debug, Clone)]
pub struct Baseline {
    length: usize,
    sma: SimpleMovingAverage,
    samples: usize,
    current: Option<f64>,
    previous: Option<f64>,
}

impl Baseline {
    pub fn new(length: usize) -> ConfigResult<Self> {
        let sma = SimpleMovingAverage::new(length).map_err(|_| {
            ConfigError::NonPositiveLength {
                name: "baseline_length",
                value: length,
            }
        })?;

        Ok(Self {
            length,
            sma,
            samples: 0,
            current: None,
            previous: None,
        })
    }

    /// Feed one close and return the average, `None` during warm-up
    pub fn update(&mut self, close: f64) -> Option<f64> {
        // ta's SMA averages over the samples seen so far until the window fills
        let average = self.sma.next(close);
        self.samples = self.samples.saturating_add(1);

        self.previous = self.current;
        self.current = if self.samples >= self.length {
            Some(average)
        } else {
            None
        };
        self.current
    }

    pub fn value(&self) -> Option<f64> {
        self.current
    }

    /// Value as of the previous bar
    pub fn previous(&self) -> Option<f64> {
        self.previous
    }

    pub fn reset(&mut self) {
        self.sma.reset();
        self.samples = 0;
        self.current = None;
        self.previous = None;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_smoother_rejects_zero_length() {
        assert_eq!(
            Smoother::new(0).unwrap_err(),
            ConfigError::NonPositiveLength {
                name: "smoother length",
                value: 0
            }
        );
    }

    #[test]
    fn test_smoother_seeds_with_first_value() {
        let mut smoother = Smoother::new(5).unwrap();
        assert_eq!(smoother.value(), None);
        assert!(!smoother.is_initialized());

        assert_relative_eq!(smoother.update(42.0), 42.0);
        assert!(smoother.is_initialized());
    }

    #[test]
    fn test_smoother_matches_recurrence() {
        let inputs = [10.0, 11.0, 9.5, 12.25, 13.0, 12.0, 14.5, 15.0, 13.75, 16.0];

        for length in [1usize, 2, 3, 7, 20] {
            let mut smoother = Smoother::new(length).unwrap();
            let alpha = 2.0 / (length as f64 + 1.0);
            assert_relative_eq!(smoother.alpha(), alpha);

            let mut expected = inputs[0];
            for (i, &x) in inputs.iter().enumerate() {
                if i > 0 {
                    expected += alpha * (x - expected);
                }
                let got = smoother.update(x);
                assert_relative_eq!(got, expected, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_smoother_hand_computed() {
        // α = 0.5 for length 3
        let mut smoother = Smoother::new(3).unwrap();
        smoother.update(2.0);
        assert_relative_eq!(smoother.update(4.0), 3.0);
        assert_relative_eq!(smoother.update(7.0), 5.0);
        assert_relative_eq!(smoother.update(1.0), 3.0);
    }

    #[test]
    fn test_smoother_reset() {
        let mut smoother = Smoother::new(3).unwrap();
        smoother.update(10.0);
        smoother.update(20.0);
        smoother.reset();
        assert_eq!(smoother.value(), None);
        assert_relative_eq!(smoother.update(5.0), 5.0);
    }

    #[test]
    fn test_baseline_warm_up_and_window() {
        let mut baseline = Baseline::new(3).unwrap();

        assert_eq!(baseline.update(1.0), None);
        assert_eq!(baseline.update(2.0), None);
        assert_relative_eq!(baseline.update(3.0).unwrap(), 2.0);
        assert_eq!(baseline.previous(), None);

        assert_relative_eq!(baseline.update(4.0).unwrap(), 3.0);
        assert_relative_eq!(baseline.previous().unwrap(), 2.0);
        assert_relative_eq!(baseline.update(5.0).unwrap(), 4.0);
    }

    #[test]
    fn test_baseline_rejects_zero_length() {
        assert!(matches!(
            Baseline::new(0),
            Err(ConfigError::NonPositiveLength {
                name: "baseline_length",
                ..
            })
        ));
    }
}
