//! Triple-nested reversal oscillator
//!
//! One reversal stage computes
//!
//! ```text
//! reversal(x) = ema(x)·(1+k) − ema(ema(x))·k
//! ```
//!
//! The oscillator chains three stages with the same length, each stage's
//! output feeding the next. Every stage owns its own pair of smoothers, so
//! no state is shared across levels.

use crate::error::ConfigResult;
use crate::indicators::Smoother;

/// Number of chained reversal stages
pub const STAGES: usize = 3;

/// One reversal level: an EMA of the input and an EMA of that EMA
#[derive(Debug, Clone)]
pub struct ReversalStage {
    ema: Smoother,
    ema_of_ema: Smoother,
    volume_factor: f64,
}

impl ReversalStage {
    pub fn new(length: usize, volume_factor: f64) -> ConfigResult<Self> {
        Ok(Self {
            ema: Smoother::new(length)?,
            ema_of_ema: Smoother::new(length)?,
            volume_factor,
        })
    }

    /// Advance the inner EMA, then the EMA-of-EMA, and combine them
    pub fn update(&mut self, input: f64) -> f64 {
        let first = self.ema.update(input);
        let second = self.ema_of_ema.update(first);
        first * (1.0 + self.volume_factor) - second * self.volume_factor
    }

    fn reset(&mut self) {
        self.ema.reset();
        self.ema_of_ema.reset();
    }
}

/// Oscillator value for the current bar and the bar before it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OscillatorReading {
    pub current: Option<f64>,
    pub previous: Option<f64>,
}

impl OscillatorReading {
    /// Both the current and previous values are defined
    pub fn pair(&self) -> Option<(f64, f64)> {
        Some((self.previous?, self.current?))
    }
}

/// Reversal oscillator with a one-slot history buffer
#[derive(Debug, Clone)]
pub struct ReversalOscillator {
    stages: [ReversalStage; STAGES],
    length: usize,
    bars: usize,
    reading: OscillatorReading,
}

impl ReversalOscillator {
    /// `volume_factor` is expected to be clamped to [0, 1] already
    pub fn new(length: usize, volume_factor: f64) -> ConfigResult<Self> {
        let stages = [
            ReversalStage::new(length, volume_factor)?,
            ReversalStage::new(length, volume_factor)?,
            ReversalStage::new(length, volume_factor)?,
        ];

        Ok(Self {
            stages,
            length,
            bars: 0,
            reading: OscillatorReading::default(),
        })
    }

    /// Advance all stages by one bar.
    ///
    /// The returned reading is undefined until `length` bars have been fed.
    pub fn update(&mut self, source: f64) -> OscillatorReading {
        let value = self
            .stages
            .iter_mut()
            .fold(source, |input, stage| stage.update(input));

        self.bars = self.bars.saturating_add(1);
        self.reading.previous = self.reading.current;
        self.reading.current = (self.bars >= self.length).then_some(value);
        self.reading
    }

    pub fn reading(&self) -> OscillatorReading {
        self.reading
    }

    pub fn is_ready(&self) -> bool {
        self.reading.current.is_some()
    }

    pub fn bars(&self) -> usize {
        self.bars
    }

    pub fn reset(&mut self) {
        self.stages.iter_mut().for_each(ReversalStage::reset);
        self.bars = 0;
        self.reading = OscillatorReading::default();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Straightforward batch evaluation of the nested formula
    fn reference(values: &[f64], length: usize, k: f64) -> Vec<f64> {
        fn ema(values: &[f64], length: usize) -> Vec<f64> {
            let alpha = 2.0 / (length as f64 + 1.0);
            let mut out = Vec::with_capacity(values.len());
            for &v in values {
                let next = match out.last() {
                    Some(&prev) => prev + alpha * (v - prev),
                    None => v,
                };
                out.push(next);
            }
            out
        }

        fn reversal(values: &[f64], length: usize, k: f64) -> Vec<f64> {
            let e1 = ema(values, length);
            let e2 = ema(&e1, length);
            e1.iter()
                .zip(&e2)
                .map(|(a, b)| a * (1.0 + k) - b * k)
                .collect()
        }

        let level1 = reversal(values, length, k);
        let level2 = reversal(&level1, length, k);
        reversal(&level2, length, k)
    }

    fn sample_series() -> Vec<f64> {
        (0..60)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn test_stage_with_zero_factor_is_plain_ema() {
        let mut stage = ReversalStage::new(3, 0.0).unwrap();
        let mut ema = Smoother::new(3).unwrap();
        for x in [5.0, 7.0, 6.0, 9.0] {
            assert_relative_eq!(stage.update(x), ema.update(x));
        }
    }

    #[test]
    fn test_matches_nested_formula() {
        let values = sample_series();
        let expected = reference(&values, 7, 0.7);

        let mut osc = ReversalOscillator::new(7, 0.7).unwrap();
        for (i, &v) in values.iter().enumerate() {
            let reading = osc.update(v);
            if i + 1 >= 7 {
                assert_relative_eq!(reading.current.unwrap(), expected[i], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_warm_up() {
        let mut osc = ReversalOscillator::new(4, 0.7).unwrap();
        for i in 0..3 {
            let reading = osc.update(100.0 + i as f64);
            assert_eq!(reading.current, None);
            assert_eq!(reading.pair(), None);
        }

        let reading = osc.update(103.0);
        assert!(reading.current.is_some());
        assert_eq!(reading.previous, None);
        assert_eq!(reading.pair(), None);

        let reading = osc.update(104.0);
        assert!(reading.pair().is_some());
    }

    #[test]
    fn test_previous_tracks_last_value() {
        let mut osc = ReversalOscillator::new(2, 0.5).unwrap();
        osc.update(10.0);
        let first = osc.update(11.0).current;
        let second = osc.update(12.0);
        assert_eq!(second.previous, first);
    }

    #[test]
    fn test_constant_input_is_fixed_point() {
        let mut osc = ReversalOscillator::new(7, 0.7).unwrap();
        for _ in 0..20 {
            let reading = osc.update(50.0);
            if let Some(v) = reading.current {
                assert_relative_eq!(v, 50.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_deterministic_across_fresh_runs() {
        let values = sample_series();
        let run = || {
            let mut osc = ReversalOscillator::new(7, 0.7).unwrap();
            values.iter().map(|&v| osc.update(v).current).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_reset_replays_identically() {
        let values = sample_series();
        let mut osc = ReversalOscillator::new(5, 0.3).unwrap();
        let first: Vec<_> = values.iter().map(|&v| osc.update(v)).collect();
        osc.reset();
        assert_eq!(osc.bars(), 0);
        let second: Vec<_> = values.iter().map(|&v| osc.update(v)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_zero_length() {
        assert!(ReversalOscillator::new(0, 0.7).is_err());
    }
}
