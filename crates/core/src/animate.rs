//! Timed ramps of a link field.
//!
//! A [`Ramp`] spreads `increment` over `steps` equal sub-steps, one every
//! `duration / steps`. It only describes the plan; driving it against a clock
//! is left to the caller.

use std::time::Duration;

use crate::link::DhField;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ramp {
    pub field: DhField,
    pub increment: f64,
    pub duration: Duration,
    steps: u32,
}

/// One sub-step: apply `delta` at `at` after the ramp started.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RampStep {
    pub index: u32,
    pub at: Duration,
    pub delta: f64,
}

impl Ramp {
    /// `steps` below one is treated as one.
    pub fn new(field: DhField, increment: f64, duration: Duration, steps: u32) -> Self {
        Self {
            field,
            increment,
            duration,
            steps: steps.max(1),
        }
    }

    /// Everything at once.
    pub fn immediate(field: DhField, increment: f64) -> Self {
        Self::new(field, increment, Duration::ZERO, 1)
    }

    #[inline]
    pub fn step_count(&self) -> u32 {
        self.steps
    }

    #[inline]
    pub fn step_delta(&self) -> f64 {
        self.increment / self.steps as f64
    }

    /// Wait between two sub-steps.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.duration / self.steps
    }

    pub fn steps(&self) -> impl Iterator<Item = RampStep> + '_ {
        let (delta, interval) = (self.step_delta(), self.interval());
        (0..self.steps).map(move |index| RampStep {
            index,
            at: interval * index,
            delta,
        })
    }

    /// Sub-steps already applied `elapsed` after the start. The first one is
    /// applied at time zero.
    pub fn completed_steps(&self, elapsed: Duration) -> u32 {
        let interval = self.interval();
        if interval.is_zero() {
            return self.steps;
        }
        let done = elapsed.as_nanos() / interval.as_nanos() + 1;
        done.min(self.steps as u128) as u32
    }

    /// Fraction of `increment` applied after `elapsed`, in `[0, 1]`.
    pub fn progress_at(&self, elapsed: Duration) -> f64 {
        self.completed_steps(elapsed) as f64 / self.steps as f64
    }

    /// Field value after `elapsed`, starting from `start`.
    pub fn value_at(&self, start: f64, elapsed: Duration) -> f64 {
        start + self.step_delta() * self.completed_steps(elapsed) as f64
    }

    #[inline]
    pub fn end_value(&self, start: f64) -> f64 {
        start + self.increment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_split_increment_evenly() {
        let ramp = Ramp::new(DhField::Q, 90.0, Duration::from_millis(900), 90);
        assert_eq!(ramp.step_count(), 90);
        assert!((ramp.step_delta() - 1.0).abs() < 1e-12);
        assert_eq!(ramp.interval(), Duration::from_millis(10));
        let total: f64 = ramp.steps().map(|s| s.delta).sum();
        assert!((total - 90.0).abs() < 1e-9);
        let last = ramp.steps().last().unwrap();
        assert_eq!(last.index, 89);
        assert_eq!(last.at, Duration::from_millis(890));
    }

    #[test]
    fn zero_steps_means_one() {
        let ramp = Ramp::new(DhField::D, 0.5, Duration::from_secs(1), 0);
        assert_eq!(ramp.step_count(), 1);
        assert_eq!(ramp.steps().count(), 1);
        assert_eq!(ramp.step_delta(), 0.5);
    }

    #[test]
    fn value_is_quantized_to_completed_steps() {
        let ramp = Ramp::new(DhField::Q, 10.0, Duration::from_millis(100), 10);
        assert_eq!(ramp.value_at(5.0, Duration::ZERO), 6.0);
        assert_eq!(ramp.value_at(5.0, Duration::from_millis(35)), 9.0);
        assert_eq!(ramp.value_at(5.0, Duration::from_secs(3)), 15.0);
        assert_eq!(ramp.progress_at(Duration::from_millis(49)), 0.5);
        assert_eq!(ramp.end_value(5.0), 15.0);
    }

    #[test]
    fn immediate_ramp_is_done_at_start() {
        let ramp = Ramp::immediate(DhField::Alpha, -30.0);
        assert_eq!(ramp.interval(), Duration::ZERO);
        assert_eq!(ramp.progress_at(Duration::ZERO), 1.0);
    }
}
