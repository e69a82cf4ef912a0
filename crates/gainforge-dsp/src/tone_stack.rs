//! Four-band tone stack — bass shelf, scooped mid peak, treble and presence
//! shelves, in series.
//!
//! Each knob maps linearly onto the band's linear gain factor:
//!
//! | Band     | Shape      | Corner  | Q     | Gain at 0 -> 1 |
//! |----------|------------|---------|-------|----------------|
//! | Bass     | low shelf  | 80 Hz   | 0.707 | 0.12x -> 4.2x  |
//! | Mid      | peaking    | 800 Hz  | 0.65  | 0.08x -> 2.4x  |
//! | Treble   | high shelf | 2.5 kHz | 0.707 | 0.18x -> 2.8x  |
//! | Presence | high shelf | 5.5 kHz | 0.707 | 0.15x -> 2.6x  |
//!
//! Coefficients are rebuilt from scratch on every `update`, whether or not
//! a knob moved. Filter memory survives the rebuild.

use crate::filters::Biquad;

/// Corner frequencies are kept below this fraction of the sample rate.
const MAX_CORNER_RATIO: f64 = 0.49;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandSpec {
    pub corner_hz: f64,
    pub q: f64,
    pub gain_min: f64,
    pub gain_max: f64,
}

impl BandSpec {
    /// Linear gain factor for a normalized knob position.
    #[inline]
    pub fn gain(&self, knob: f64) -> f64 {
        self.gain_min + knob * (self.gain_max - self.gain_min)
    }
}

pub const BASS: BandSpec = BandSpec {
    corner_hz: 80.0,
    q: 0.707,
    gain_min: 0.12,
    gain_max: 4.2,
};

pub const MID: BandSpec = BandSpec {
    corner_hz: 800.0,
    q: 0.65,
    gain_min: 0.08,
    gain_max: 2.4,
};

pub const TREBLE: BandSpec = BandSpec {
    corner_hz: 2500.0,
    q: 0.707,
    gain_min: 0.18,
    gain_max: 2.8,
};

pub const PRESENCE: BandSpec = BandSpec {
    corner_hz: 5500.0,
    q: 0.707,
    gain_min: 0.15,
    gain_max: 2.6,
};

/// Knob positions for the four bands, each in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneSettings {
    pub bass: f64,
    pub mid: f64,
    pub treble: f64,
    pub presence: f64,
}

impl Default for ToneSettings {
    fn default() -> Self {
        Self {
            bass: 0.5,
            mid: 0.5,
            treble: 0.5,
            presence: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToneStack {
    bass: Biquad,
    mid: Biquad,
    treble: Biquad,
    presence: Biquad,
    sample_rate: f64,
}

impl ToneStack {
    pub fn new(sample_rate: f64) -> Self {
        let mut s = Self {
            bass: Biquad::identity(),
            mid: Biquad::identity(),
            treble: Biquad::identity(),
            presence: Biquad::identity(),
            sample_rate,
        };
        s.update(&ToneSettings::default());
        s
    }

    /// Rebuild all four coefficient sets.
    pub fn update(&mut self, tone: &ToneSettings) {
        let sr = self.sample_rate;
        let corner = |band: &BandSpec| band.corner_hz.min(sr * MAX_CORNER_RATIO);

        self.bass
            .set_low_shelf(corner(&BASS), BASS.q, BASS.gain(tone.bass), sr);
        self.mid
            .set_peaking(corner(&MID), MID.q, MID.gain(tone.mid), sr);
        self.treble
            .set_high_shelf(corner(&TREBLE), TREBLE.q, TREBLE.gain(tone.treble), sr);
        self.presence.set_high_shelf(
            corner(&PRESENCE),
            PRESENCE.q,
            PRESENCE.gain(tone.presence),
            sr,
        );
    }

    /// Run a block through bass -> mid -> treble -> presence.
    pub fn process_block(&mut self, block: &mut [f64]) {
        self.bass.process_block(block);
        self.mid.process_block(block);
        self.treble.process_block(block);
        self.presence.process_block(block);
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn reset(&mut self) {
        self.bass.reset();
        self.mid.reset();
        self.treble.reset();
        self.presence.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn measure_response(stack: &mut ToneStack, freq: f64, sr: f64) -> f64 {
        stack.reset();
        let n = (sr * 0.2) as usize;
        let mut block: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sr).sin())
            .collect();
        stack.process_block(&mut block);
        block[n / 2..].iter().fold(0.0f64, |m, y| m.max(y.abs()))
    }

    fn db(x: f64) -> f64 {
        20.0 * x.log10()
    }

    #[test]
    fn test_gain_mapping_endpoints() {
        assert_eq!(BASS.gain(0.0), 0.12);
        assert_eq!(MID.gain(0.0), 0.08);
        assert!((BASS.gain(1.0) - 4.2).abs() < 1e-12);
        assert!((MID.gain(1.0) - 2.4).abs() < 1e-12);
        assert!((TREBLE.gain(1.0) - 2.8).abs() < 1e-12);
        assert!((PRESENCE.gain(1.0) - 2.6).abs() < 1e-12);
    }

    #[test]
    fn test_bass_knob_moves_lows() {
        let sr = 44100.0;
        let mut stack = ToneStack::new(sr);

        stack.update(&ToneSettings { bass: 0.0, ..Default::default() });
        let cut = measure_response(&mut stack, 40.0, sr);
        stack.update(&ToneSettings { bass: 1.0, ..Default::default() });
        let boost = measure_response(&mut stack, 40.0, sr);

        assert!(db(boost / cut) > 20.0, "Bass sweep at 40 Hz: {:.1} dB", db(boost / cut));
    }

    #[test]
    fn test_mid_knob_scoops() {
        let sr = 44100.0;
        let mut stack = ToneStack::new(sr);

        stack.update(&ToneSettings { mid: 0.0, ..Default::default() });
        let scooped = measure_response(&mut stack, 800.0, sr);
        stack.update(&ToneSettings { mid: 1.0, ..Default::default() });
        let full = measure_response(&mut stack, 800.0, sr);

        assert!(scooped < full * 0.1, "Scoop {scooped} vs full {full}");
    }

    #[test]
    fn test_presence_only_touches_top() {
        let sr = 48000.0;
        let mut stack = ToneStack::new(sr);

        stack.update(&ToneSettings { presence: 0.0, ..Default::default() });
        let low_a = measure_response(&mut stack, 200.0, sr);
        let high_a = measure_response(&mut stack, 12000.0, sr);
        stack.update(&ToneSettings { presence: 1.0, ..Default::default() });
        let low_b = measure_response(&mut stack, 200.0, sr);
        let high_b = measure_response(&mut stack, 12000.0, sr);

        assert!(db(low_b / low_a).abs() < 1.0, "200 Hz moved by {:.2} dB", db(low_b / low_a));
        assert!(db(high_b / high_a) > 12.0, "12 kHz moved by {:.2} dB", db(high_b / high_a));
    }

    #[test]
    fn test_coefficients_finite_over_knob_range() {
        for sr in [8000.0, 22050.0, 44100.0, 96000.0, 192000.0] {
            let mut stack = ToneStack::new(sr);
            for step in 0..=20 {
                let k = step as f64 / 20.0;
                stack.update(&ToneSettings { bass: k, mid: k, treble: k, presence: k });
                for f in [&stack.bass, &stack.mid, &stack.treble, &stack.presence] {
                    assert!(
                        f.coefficients().iter().all(|c| c.is_finite()),
                        "Non-finite coefficient at sr={sr}, knob={k}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_stable_at_low_sample_rate() {
        // Presence corner (5.5 kHz) sits above Nyquist at 8 kHz.
        let sr = 8000.0;
        let mut stack = ToneStack::new(sr);
        stack.update(&ToneSettings { bass: 1.0, mid: 1.0, treble: 1.0, presence: 1.0 });

        let mut block = vec![0.0; 8000];
        block[0] = 1.0;
        stack.process_block(&mut block);

        assert!(block.iter().all(|y| y.is_finite()));
        assert!(block[7999].abs() < 1e-6, "Impulse response should decay: {}", block[7999]);
    }

    #[test]
    fn test_update_is_idempotent() {
        let sr = 44100.0;
        let tone = ToneSettings { bass: 0.3, mid: 0.9, treble: 0.1, presence: 0.6 };
        let mut a = ToneStack::new(sr);
        let mut b = ToneStack::new(sr);
        a.update(&tone);
        b.update(&tone);
        b.update(&tone);
        assert_eq!(a, b);
    }
}
