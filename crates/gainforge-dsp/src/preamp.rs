//! Four-stage cascaded tube preamp — gain staging + asymmetric soft-clip.
//!
//! Signal flow per sample:
//!   input -> x(amount*0.4) -> stage 1 -> x(amount*0.6) -> stage 2
//!         -> x(amount*0.8) -> stage 3 -> x(amount*1.0) -> stage 4 -> output
//!
//! Each stage is the same transfer curve with a saturation strength that
//! rises with the stage index (1.35, 1.70, 2.05, 2.40), so later stages
//! compress harder. The curve is asymmetric, like a single-ended triode
//! biased off-center:
//!   - positive half: tanh(x * strength * 1.8) * 0.58  (compresses earlier)
//!   - negative half: tanh(x * strength * 1.4) * 0.65  (more headroom)
//!
//! The asymmetry produces the even harmonics of the emulated voicing.
//! Swapping the two halves changes the character and is not allowed.
//!
//! Stateless: the cascade has no memory between samples.

/// Gain amount at gain = 0 (lowest setting, still slightly amplified).
const GAIN_MIN: f64 = 0.3;
/// Gain amount at gain = 1.
const GAIN_MAX: f64 = 20.0;

/// Share of the overall gain amount each stage receives.
pub const STAGE_FRACTIONS: [f64; 4] = [0.4, 0.6, 0.8, 1.0];

/// Per-stage saturation strength increment.
const STRENGTH_PER_STAGE: f64 = 0.35;

const POS_DRIVE: f64 = 1.8;
const POS_LEVEL: f64 = 0.58;
const NEG_DRIVE: f64 = 1.4;
const NEG_LEVEL: f64 = 0.65;

/// Map the normalized gain control to the overall gain amount (0.3x-20x).
#[inline]
pub fn gain_amount(gain: f64) -> f64 {
    GAIN_MIN + gain * (GAIN_MAX - GAIN_MIN)
}

/// One saturating stage. `stage_index` is 1-based.
#[inline]
pub fn stage(input: f64, stage_index: u32) -> f64 {
    let strength = 1.0 + stage_index as f64 * STRENGTH_PER_STAGE;
    if input > 0.0 {
        (input * strength * POS_DRIVE).tanh() * POS_LEVEL
    } else {
        (input * strength * NEG_DRIVE).tanh() * NEG_LEVEL
    }
}

/// Run all four stages for one sample at the given overall gain amount.
#[inline]
pub fn process(input: f64, amount: f64) -> f64 {
    let mut x = input;
    for (i, fraction) in STAGE_FRACTIONS.iter().enumerate() {
        x = stage(x * amount * fraction, i as u32 + 1);
    }
    x
}
