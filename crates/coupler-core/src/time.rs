//! Simulation clock.
//!
//! The adapter never owns the solver's clock. It reads the current time
//! when a checkpoint is stored and sets it back on rollback, through the
//! [`SimulationClock`] trait. [`Time`] is a ready-made clock with a
//! variable step size.

use crate::error::TimeError;

/// Minimal clock interface needed for checkpoint rollback.
pub trait SimulationClock {
    /// Current absolute simulation time.
    fn current(&self) -> f64;

    /// Overwrite the current absolute simulation time.
    fn set_absolute_time(&mut self, time: f64);

    /// Number of steps taken. Clocks without a counter report `0`.
    fn step(&self) -> u64 {
        0
    }

    /// Overwrite the step counter. Clocks without a counter ignore it.
    fn set_step(&mut self, _step: u64) {}
}

/// Simulation clock with a step counter.
///
/// Each [`increment`](Self::increment) adds the current step size, so the
/// step size can shrink to honour the coupling library's maximum step
/// without touching the time already travelled. The counter is kept
/// separately from the time value and is restored explicitly on rollback.
#[derive(Clone, Debug, PartialEq)]
pub struct Time {
    start: f64,
    end: f64,
    delta: f64,
    current: f64,
    step: u64,
}

impl Time {
    /// Create a clock running from `start` to `end` in steps of `delta`.
    pub fn new(start: f64, end: f64, delta: f64) -> Result<Self, TimeError> {
        check_delta(delta)?;
        Ok(Self {
            start,
            end,
            delta,
            current: start,
            step: 0,
        })
    }

    /// Advance by one step of the current size.
    pub fn increment(&mut self) {
        self.current += self.delta;
        self.step += 1;
    }

    /// Step size.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Change the step size, e.g. to honour the coupling library's
    /// maximum allowed step. Past steps are unaffected.
    pub fn set_delta(&mut self, delta: f64) -> Result<(), TimeError> {
        check_delta(delta)?;
        self.delta = delta;
        Ok(())
    }

    /// Start time.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End time.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// `true` once the current time reached the end time (within half a
    /// step, to absorb rounding).
    pub fn is_finished(&self) -> bool {
        self.current >= self.end - 0.5 * self.delta
    }
}

fn check_delta(delta: f64) -> Result<(), TimeError> {
    if delta.is_finite() && delta > 0.0 {
        Ok(())
    } else {
        Err(TimeError::InvalidStep { delta })
    }
}

impl SimulationClock for Time {
    fn current(&self) -> f64 {
        self.current
    }

    fn set_absolute_time(&mut self, time: f64) {
        self.current = time;
    }

    fn step(&self) -> u64 {
        self.step
    }

    fn set_step(&mut self, step: u64) {
        self.step = step;
    }
}
