use nih_plug::prelude::*;
use std::sync::Arc;

use gainforge_dsp::{AmpParams, Mode, RectifierMode, Voice};

/// Voice toggle as the host sees it.
#[derive(Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceChoice {
    #[id = "raw"]
    Raw,
    #[id = "mid"]
    Mid,
    #[id = "mod"]
    Mod,
}

impl From<VoiceChoice> for Voice {
    fn from(v: VoiceChoice) -> Self {
        match v {
            VoiceChoice::Raw => Voice::Raw,
            VoiceChoice::Mid => Voice::Mid,
            VoiceChoice::Mod => Voice::Mod,
        }
    }
}

/// Mode toggle as the host sees it.
#[derive(Enum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeChoice {
    #[id = "clean"]
    Clean,
    #[id = "crunch"]
    Crunch,
    #[id = "modern"]
    Modern,
}

impl From<ModeChoice> for Mode {
    fn from(m: ModeChoice) -> Self {
        match m {
            ModeChoice::Clean => Mode::Clean,
            ModeChoice::Crunch => Mode::Crunch,
            ModeChoice::Modern => Mode::Modern,
        }
    }
}

#[derive(Params)]
pub struct GainForgeParams {
    /// Preamp gain: drives the four-stage cascade.
    #[id = "GAIN"]
    pub gain: FloatParam,

    #[id = "BASS"]
    pub bass: FloatParam,

    #[id = "MID"]
    pub mid: FloatParam,

    #[id = "TREBLE"]
    pub treble: FloatParam,

    #[id = "PRESENCE"]
    pub presence: FloatParam,

    /// Output level ahead of the final clip.
    #[id = "MASTER"]
    pub master: FloatParam,

    /// Power-supply drive into the rectifier.
    #[id = "DRIVE"]
    pub drive: FloatParam,

    /// Off = silicon, on = tube (sagging) rectifier.
    #[id = "RECTIFIER_MODE"]
    pub tube_rectifier: BoolParam,

    #[id = "VOICE"]
    pub voice: EnumParam<VoiceChoice>,

    #[id = "MODE"]
    pub mode: EnumParam<ModeChoice>,

    #[id = "BYPASS"]
    pub bypass: BoolParam,
}

// The engine ramps every continuous control itself, so none of these carry
// an nih_plug smoother.
fn knob(name: &str, default: f32) -> FloatParam {
    FloatParam::new(name, default, FloatRange::Linear { min: 0.0, max: 1.0 })
        .with_unit(" %")
        .with_value_to_string(formatters::v2s_f32_percentage(0))
        .with_string_to_value(formatters::s2v_f32_percentage())
}

impl Default for GainForgeParams {
    fn default() -> Self {
        let d = AmpParams::default();
        Self {
            gain: knob("Gain", d.gain),
            bass: knob("Bass", d.bass),
            mid: knob("Mid", d.mid),
            treble: knob("Treble", d.treble),
            presence: knob("Presence", d.presence),
            master: knob("Master", d.master),
            drive: knob("Drive", d.drive),

            tube_rectifier: BoolParam::new("Rectifier", d.rectifier == RectifierMode::Tube)
                .with_value_to_string(Arc::new(|tube| {
                    String::from(if tube { "Tube" } else { "Silicon" })
                })),

            voice: EnumParam::new("Voice", VoiceChoice::Mid),
            mode: EnumParam::new("Mode", ModeChoice::Crunch),

            bypass: BoolParam::new("Bypass", d.bypass).make_bypass(),
        }
    }
}

impl GainForgeParams {
    /// Read every parameter once into an engine snapshot.
    pub fn snapshot(&self) -> AmpParams {
        AmpParams {
            gain: self.gain.value(),
            bass: self.bass.value(),
            mid: self.mid.value(),
            treble: self.treble.value(),
            presence: self.presence.value(),
            master: self.master.value(),
            drive: self.drive.value(),
            rectifier: RectifierMode::from_flag(self.tube_rectifier.value()),
            voice: self.voice.value().into(),
            mode: self.mode.value().into(),
            bypass: self.bypass.value(),
        }
    }
}
