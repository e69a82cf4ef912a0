//! Per-sample parameter smoothing.
//!
//! A control that jumps from one value to another between blocks is heard as
//! a click (gain, master) or a zipper (tone bands). `Smoother` turns each
//! block-rate target into a per-sample ramp.
//!
//! Two ramp shapes:
//!   - `Linear`: constant step, lands exactly on the target after
//!     `time_constant * sample_rate` samples.
//!   - `Exponential`: one-pole approach, `y += k * (target - y)` with
//!     `k = 1 - exp(-1 / (tau * fs))`. Snaps once within `SNAP_EPSILON`.
//!
//! Both are monotonic toward the target and never overshoot it.

/// Distance at which the exponential ramp is considered arrived.
const SNAP_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SmoothingStyle {
    #[default]
    Linear,
    Exponential,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Smoother {
    style: SmoothingStyle,
    current: f64,
    target: f64,
    /// Ramp length in samples (linear) or time constant in samples (exponential).
    ramp_samples: u32,
    /// Linear: per-sample increment of the active ramp.
    step: f64,
    /// Linear: samples left in the active ramp.
    remaining: u32,
    /// Exponential: one-pole coefficient.
    coeff: f64,
}

impl Smoother {
    pub fn new(style: SmoothingStyle) -> Self {
        Self {
            style,
            current: 0.0,
            target: 0.0,
            ramp_samples: 0,
            step: 0.0,
            remaining: 0,
            coeff: 1.0,
        }
    }

    /// Configure the ramp for a sample rate and time constant, and snap the
    /// current value to the target.
    pub fn reset(&mut self, sample_rate: f64, time_constant_s: f64) {
        let samples = (sample_rate * time_constant_s).max(0.0).floor();
        self.ramp_samples = samples.min(u32::MAX as f64) as u32;
        self.coeff = if self.ramp_samples == 0 {
            1.0
        } else {
            1.0 - (-1.0 / samples).exp()
        };
        self.current = self.target;
        self.step = 0.0;
        self.remaining = 0;
    }

    /// Start ramping toward `value` from wherever the ramp currently is.
    pub fn set_target(&mut self, value: f64) {
        if value == self.target {
            return;
        }
        self.target = value;
        match self.style {
            SmoothingStyle::Linear => {
                self.remaining = self.ramp_samples;
                if self.remaining == 0 {
                    self.current = value;
                    self.step = 0.0;
                } else {
                    self.step = (value - self.current) / self.remaining as f64;
                }
            }
            SmoothingStyle::Exponential => {
                if self.ramp_samples == 0 {
                    self.current = value;
                }
            }
        }
    }

    /// Jump straight to `value` with no ramp.
    pub fn set_immediate(&mut self, value: f64) {
        self.target = value;
        self.current = value;
        self.step = 0.0;
        self.remaining = 0;
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next_value(&mut self) -> f64 {
        match self.style {
            SmoothingStyle::Linear => {
                if self.remaining > 0 {
                    self.remaining -= 1;
                    self.current = if self.remaining == 0 {
                        self.target
                    } else {
                        self.current + self.step
                    };
                }
            }
            SmoothingStyle::Exponential => {
                if self.current != self.target {
                    self.current += self.coeff * (self.target - self.current);
                    if (self.target - self.current).abs() < SNAP_EPSILON {
                        self.current = self.target;
                    }
                }
            }
        }
        self.current
    }

    /// Advance `n` samples and return the value reached.
    pub fn skip(&mut self, n: usize) -> f64 {
        match self.style {
            SmoothingStyle::Linear => {
                if n as u64 >= self.remaining as u64 {
                    self.current = self.target;
                    self.remaining = 0;
                } else {
                    // n < remaining <= u32::MAX
                    self.remaining -= n as u32;
                    self.current += self.step * n as f64;
                }
                self.current
            }
            SmoothingStyle::Exponential => {
                for _ in 0..n {
                    if self.current == self.target {
                        break;
                    }
                    self.next_value();
                }
                self.current
            }
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_smoothing(&self) -> bool {
        self.current != self.target
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(SmoothingStyle::default())
    }
}
