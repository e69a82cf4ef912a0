//! Power-supply rectifier model — drive gain + regime-dependent clipping.
//!
//! Two regimes, chosen per sample by the (smoothed) rectifier-mode value:
//!
//!   Silicon (< 0.5): stiff supply, immediate attack.
//!     x -> tanh(3.0 x) * 0.48
//!
//!   Tube (>= 0.5): the supply droops under load. A one-pole follower of
//!   the rectified signal ("sag") pulls the gain down before a softer clip:
//!     sag <- 0.94 sag + 0.06 * (0.18 |x|)
//!     x   <- x * (1 - 0.35 sag)
//!     x   -> tanh(2.2 x) * 0.52
//!
//! Drive scales the input by 1 + 14 * drive in both regimes. The sag
//! follower is the only sample-to-sample memory outside the tone stack.
//! It is per channel and holds its value while in Silicon mode.

/// Drive scaling: 1x at drive = 0, 15x at drive = 1.
const DRIVE_RANGE: f64 = 14.0;

const SILICON_DRIVE: f64 = 3.0;
const SILICON_LEVEL: f64 = 0.48;

/// Follower pole.
const SAG_RETAIN: f64 = 0.94;
/// Rectified magnitude -> supply load.
const SAG_LOAD: f64 = 0.18;
/// Follower input weight.
const SAG_ATTACK: f64 = 0.06;
/// Gain lost per unit of sag.
const SAG_DEPTH: f64 = 0.35;

const TUBE_DRIVE: f64 = 2.2;
const TUBE_LEVEL: f64 = 0.52;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rectifier {
    sag: f64,
}

impl Rectifier {
    pub fn new() -> Self {
        Self { sag: 0.0 }
    }

    /// `drive` in [0, 1]; `mode` is the smoothed rectifier-mode value
    /// (0 = Silicon, 1 = Tube).
    #[inline]
    pub fn process(&mut self, input: f64, drive: f64, mode: f64) -> f64 {
        let x = input * (1.0 + drive * DRIVE_RANGE);

        if mode < 0.5 {
            (x * SILICON_DRIVE).tanh() * SILICON_LEVEL
        } else {
            self.sag = self.sag * SAG_RETAIN + x.abs() * SAG_LOAD * SAG_ATTACK;
            let sagged = x * (1.0 - self.sag * SAG_DEPTH);
            (sagged * TUBE_DRIVE).tanh() * TUBE_LEVEL
        }
    }

    /// Current sag follower value.
    pub fn sag(&self) -> f64 {
        self.sag
    }

    pub fn reset(&mut self) {
        self.sag = 0.0;
    }
}
