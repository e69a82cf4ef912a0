//! Flat key -> float parameter state.
//!
//! This is the persisted form of the controls: one float per parameter,
//! under the same ids the plugin exposes to hosts. Booleans are stored as
//! 0.0/1.0 and toggles as their normalized position. Decoding never
//! rejects a value, only an unknown key; range handling happens in the
//! conversion to `AmpParams`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::{AmpParams, RectifierMode};
use crate::voicing::{Mode, Voice};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("malformed amp state: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown amp parameter `{0}`")]
    UnknownKey(String),
}

/// Parameter ids, in panel order.
pub const KEYS: [&str; 11] = [
    "GAIN",
    "BASS",
    "MID",
    "TREBLE",
    "PRESENCE",
    "MASTER",
    "DRIVE",
    "RECTIFIER_MODE",
    "VOICE",
    "MODE",
    "BYPASS",
];

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AmpState {
    pub gain: f32,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub presence: f32,
    pub master: f32,
    pub drive: f32,
    pub rectifier_mode: f32,
    pub voice: f32,
    pub mode: f32,
    pub bypass: f32,
}

impl AmpState {
    pub fn from_json(json: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build from a host-style flat map. Missing keys keep their defaults.
    pub fn from_map(map: &BTreeMap<String, f32>) -> Result<Self, StateError> {
        let mut state = Self::default();
        for (key, &value) in map {
            *state.slot_mut(key)? = value;
        }
        Ok(state)
    }

    pub fn to_map(&self) -> BTreeMap<String, f32> {
        KEYS.iter()
            .zip(self.values())
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    /// Values in `KEYS` order.
    fn values(&self) -> [f32; 11] {
        [
            self.gain,
            self.bass,
            self.mid,
            self.treble,
            self.presence,
            self.master,
            self.drive,
            self.rectifier_mode,
            self.voice,
            self.mode,
            self.bypass,
        ]
    }

    fn slot_mut(&mut self, key: &str) -> Result<&mut f32, StateError> {
        Ok(match key {
            "GAIN" => &mut self.gain,
            "BASS" => &mut self.bass,
            "MID" => &mut self.mid,
            "TREBLE" => &mut self.treble,
            "PRESENCE" => &mut self.presence,
            "MASTER" => &mut self.master,
            "DRIVE" => &mut self.drive,
            "RECTIFIER_MODE" => &mut self.rectifier_mode,
            "VOICE" => &mut self.voice,
            "MODE" => &mut self.mode,
            "BYPASS" => &mut self.bypass,
            other => return Err(StateError::UnknownKey(other.to_string())),
        })
    }
}

impl Default for AmpState {
    fn default() -> Self {
        Self::from(&AmpParams::default())
    }
}

impl From<&AmpParams> for AmpState {
    fn from(p: &AmpParams) -> Self {
        Self {
            gain: p.gain,
            bass: p.bass,
            mid: p.mid,
            treble: p.treble,
            presence: p.presence,
            master: p.master,
            drive: p.drive,
            rectifier_mode: p.rectifier.target() as f32,
            voice: p.voice.normalized(),
            mode: p.mode.normalized(),
            bypass: if p.bypass { 1.0 } else { 0.0 },
        }
    }
}

impl From<&AmpState> for AmpParams {
    fn from(s: &AmpState) -> Self {
        AmpParams {
            gain: s.gain,
            bass: s.bass,
            mid: s.mid,
            treble: s.treble,
            presence: s.presence,
            master: s.master,
            drive: s.drive,
            rectifier: RectifierMode::from_flag(s.rectifier_mode > 0.5),
            voice: Voice::from_normalized(s.voice),
            mode: Mode::from_normalized(s.mode),
            bypass: s.bypass > 0.5,
        }
        .sanitized()
    }
}
