//! Voice and mode switches — discrete post-rectifier character stages.
//!
//! Both are three-position toggles applied in series (voice, then mode).
//! Neither has memory. Hosts deliver them as normalized floats
//! (0.0 / 0.5 / 1.0); anything below 0.25 selects the first position,
//! anything from 0.75 up the last.

/// Lower edge of the middle toggle position.
const MIDDLE_FROM: f32 = 0.25;
/// Lower edge of the last toggle position.
const LAST_FROM: f32 = 0.75;

/// Index 0/1/2 of a three-position toggle from its normalized value.
fn position(normalized: f32) -> u8 {
    if normalized < MIDDLE_FROM {
        0
    } else if normalized < LAST_FROM {
        1
    } else {
        2
    }
}

/// Preamp voicing toggle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Voice {
    /// Tightest clip, lowest level.
    Raw,
    #[default]
    Mid,
    /// Softest clip, most level.
    Mod,
}

impl Voice {
    pub const ALL: [Voice; 3] = [Voice::Raw, Voice::Mid, Voice::Mod];

    /// NaN falls through to the last position.
    pub fn from_normalized(value: f32) -> Self {
        Self::ALL[position(value) as usize]
    }

    pub fn normalized(self) -> f32 {
        match self {
            Voice::Raw => 0.0,
            Voice::Mid => 0.5,
            Voice::Mod => 1.0,
        }
    }

    #[inline]
    pub fn shape(self, x: f64) -> f64 {
        match self {
            Voice::Raw => (x * 2.1).tanh() * 0.62,
            Voice::Mid => (x * 1.65).tanh() * 0.68,
            Voice::Mod => (x * 1.5).tanh() * 0.72,
        }
    }
}

/// Channel mode toggle: pre-gain into a final soft clip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    Clean,
    #[default]
    Crunch,
    Modern,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Clean, Mode::Crunch, Mode::Modern];

    pub fn from_normalized(value: f32) -> Self {
        Self::ALL[position(value) as usize]
    }

    pub fn normalized(self) -> f32 {
        match self {
            Mode::Clean => 0.0,
            Mode::Crunch => 0.5,
            Mode::Modern => 1.0,
        }
    }

    #[inline]
    pub fn shape(self, x: f64) -> f64 {
        match self {
            Mode::Clean => (x * 0.35).tanh() * 0.9,
            Mode::Crunch => (x * 1.4 * 1.6).tanh() * 0.7,
            Mode::Modern => (x * 1.8 * 2.3).tanh() * 0.58,
        }
    }
}
