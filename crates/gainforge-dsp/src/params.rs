//! Control snapshot handed to the engine once per block.
//!
//! Continuous controls are normalized to [0, 1]. The engine never trusts
//! them: `sanitized()` clamps every one (NaN becomes 0) before use.

use crate::voicing::{Mode, Voice};

/// Power-supply rectifier selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RectifierMode {
    /// Solid-state diodes: tight, immediate.
    #[default]
    Silicon,
    /// Tube rectifier: compressed, sags under load.
    Tube,
}

impl RectifierMode {
    pub fn from_flag(tube: bool) -> Self {
        if tube {
            RectifierMode::Tube
        } else {
            RectifierMode::Silicon
        }
    }

    /// Smoother target: 0.0 for Silicon, 1.0 for Tube.
    pub fn target(self) -> f64 {
        match self {
            RectifierMode::Silicon => 0.0,
            RectifierMode::Tube => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmpParams {
    pub gain: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub presence: f32,
    pub master: f32,
    pub drive: f32,
    pub rectifier: RectifierMode,
    pub voice: Voice,
    pub mode: Mode,
    pub bypass: bool,
}

impl Default for AmpParams {
    fn default() -> Self {
        Self {
            gain: 0.5,
            bass: 0.5,
            mid: 0.5,
            treble: 0.5,
            presence: 0.5,
            master: 0.5,
            drive: 0.3,
            rectifier: RectifierMode::Silicon,
            voice: Voice::Mid,
            mode: Mode::Crunch,
            bypass: false,
        }
    }
}

impl AmpParams {
    /// Copy with every continuous control clamped to [0, 1].
    pub fn sanitized(&self) -> Self {
        Self {
            gain: unit(self.gain),
            bass: unit(self.bass),
            mid: unit(self.mid),
            treble: unit(self.treble),
            presence: unit(self.presence),
            master: unit(self.master),
            drive: unit(self.drive),
            ..*self
        }
    }
}

/// Clamp to [0, 1]. `f32::max` drops a NaN operand, so NaN maps to 0.
#[inline]
pub fn unit(x: f32) -> f32 {
    x.max(0.0).min(1.0)
}
