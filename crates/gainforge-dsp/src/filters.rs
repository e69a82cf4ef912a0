//! Second-order filter primitive for the tone stack.
//!
//! All shapes come from the Audio EQ Cookbook and take a *linear* gain
//! factor (1.0 = flat), so a tone control maps straight onto `gain`.
//! `new`-style constructors start with cleared memory; the `set_*` methods
//! swap coefficients and keep the delay line, which is what a per-block
//! coefficient refresh needs.

use std::f64::consts::PI;

/// Biquad filter — Direct Form II Transposed.
#[derive(Clone, Debug, PartialEq)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    s1: f64,
    s2: f64,
}

impl Biquad {
    /// Pass-through filter (b0 = 1, everything else 0).
    pub fn identity() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            s1: 0.0,
            s2: 0.0,
        }
    }

    /// Low shelf: `gain` applied below `corner_hz`, unity above.
    pub fn low_shelf(corner_hz: f64, q: f64, gain: f64, sample_rate: f64) -> Self {
        let mut f = Self::identity();
        f.set_low_shelf(corner_hz, q, gain, sample_rate);
        f
    }

    /// High shelf: unity below `corner_hz`, `gain` above.
    pub fn high_shelf(corner_hz: f64, q: f64, gain: f64, sample_rate: f64) -> Self {
        let mut f = Self::identity();
        f.set_high_shelf(corner_hz, q, gain, sample_rate);
        f
    }

    /// Peaking EQ: `gain` at `center_hz`, unity far away from it.
    pub fn peaking(center_hz: f64, q: f64, gain: f64, sample_rate: f64) -> Self {
        let mut f = Self::identity();
        f.set_peaking(center_hz, q, gain, sample_rate);
        f
    }

    /// Update coefficients to a low shelf without resetting filter state.
    pub fn set_low_shelf(&mut self, corner_hz: f64, q: f64, gain: f64, sample_rate: f64) {
        let a = gain.max(0.0).sqrt();
        let (cos_w0, beta) = shelf_terms(corner_hz, q, a, sample_rate);
        let ap1 = a + 1.0;
        let am1 = a - 1.0;

        let b0 = a * (ap1 - am1 * cos_w0 + beta);
        let b1 = 2.0 * a * (am1 - ap1 * cos_w0);
        let b2 = a * (ap1 - am1 * cos_w0 - beta);
        let a0 = ap1 + am1 * cos_w0 + beta;
        let a1 = -2.0 * (am1 + ap1 * cos_w0);
        let a2 = ap1 + am1 * cos_w0 - beta;

        self.set_normalized(b0, b1, b2, a0, a1, a2);
    }

    /// Update coefficients to a high shelf without resetting filter state.
    pub fn set_high_shelf(&mut self, corner_hz: f64, q: f64, gain: f64, sample_rate: f64) {
        let a = gain.max(0.0).sqrt();
        let (cos_w0, beta) = shelf_terms(corner_hz, q, a, sample_rate);
        let ap1 = a + 1.0;
        let am1 = a - 1.0;

        let b0 = a * (ap1 + am1 * cos_w0 + beta);
        let b1 = -2.0 * a * (am1 + ap1 * cos_w0);
        let b2 = a * (ap1 + am1 * cos_w0 - beta);
        let a0 = ap1 - am1 * cos_w0 + beta;
        let a1 = 2.0 * (am1 - ap1 * cos_w0);
        let a2 = ap1 - am1 * cos_w0 - beta;

        self.set_normalized(b0, b1, b2, a0, a1, a2);
    }

    /// Update coefficients to a peaking EQ without resetting filter state.
    pub fn set_peaking(&mut self, center_hz: f64, q: f64, gain: f64, sample_rate: f64) {
        let a = gain.max(0.0).sqrt();
        let w0 = 2.0 * PI * center_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_w0;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha / a;

        self.set_normalized(b0, b1, b2, a0, a1, a2);
    }

    fn set_normalized(&mut self, b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) {
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    /// Process one sample (Direct Form II Transposed).
    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.s1;
        self.s1 = self.b1 * x - self.a1 * y + self.s2;
        self.s2 = self.b2 * x - self.a2 * y;
        y
    }

    /// Filter a whole block in place.
    pub fn process_block(&mut self, block: &mut [f64]) {
        for s in block.iter_mut() {
            *s = self.process(*s);
        }
    }

    /// Coefficients as `[b0, b1, b2, a1, a2]` (a0 normalized to 1).
    pub fn coefficients(&self) -> [f64; 5] {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
    }

    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::identity()
    }
}

/// `(cos w0, 2 sqrt(A) alpha)` shared by both shelf shapes.
fn shelf_terms(corner_hz: f64, q: f64, a: f64, sample_rate: f64) -> (f64, f64) {
    let w0 = 2.0 * PI * corner_hz / sample_rate;
    let beta = w0.sin() * a.sqrt() / q;
    (w0.cos(), beta)
}
