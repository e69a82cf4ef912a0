//! Per-channel amp engine — one mono signal chain with all of its state.
//!
//! Per block:
//!   1. set smoother targets from the snapshot
//!   2. advance the tone smoothers and rebuild the tone-stack coefficients
//!   3. per sample: preamp cascade -> rectifier -> voice -> mode
//!   4. tone stack over the whole block (bass -> mid -> treble -> presence)
//!   5. per sample: master level, then hard clip to +/-0.95
//!
//! Lifecycle: `Uninitialized --prepare--> Prepared --process--> Processing`,
//! `reset` goes back to `Prepared`. Everything `process_block` touches is
//! allocated in `prepare`; processing never allocates, locks or logs.

use log::{debug, warn};

use crate::params::AmpParams;
use crate::preamp;
use crate::rectifier::Rectifier;
use crate::smoother::{Smoother, SmoothingStyle};
use crate::tone_stack::{ToneSettings, ToneStack};

/// Ramp time for the continuous controls.
pub const CONTROL_SMOOTHING_S: f64 = 0.05;
/// Ramp time for the rectifier switch. Slower, to hide the regime change.
pub const RECTIFIER_SMOOTHING_S: f64 = 0.1;

/// Master level at master = 0.
const MASTER_MIN: f64 = 0.15;
/// Master level at master = 1.
const MASTER_MAX: f64 = 12.0;
/// Output hard-clip ceiling.
pub const OUTPUT_LIMIT: f64 = 0.95;

/// Lowest sample rate `prepare` accepts.
const MIN_SAMPLE_RATE: f64 = 8000.0;
const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// `prepare` has not been called; `process_block` does nothing.
    Uninitialized,
    /// Ready, with cleared filter and sag memory.
    Prepared,
    /// At least one block processed since the last prepare/reset.
    Processing,
}

/// The eight smoothed controls.
#[derive(Clone, Debug, PartialEq)]
struct Smoothers {
    gain: Smoother,
    bass: Smoother,
    mid: Smoother,
    treble: Smoother,
    presence: Smoother,
    master: Smoother,
    drive: Smoother,
    rectifier: Smoother,
}

impl Smoothers {
    fn new() -> Self {
        let s = Smoother::new(SmoothingStyle::Linear);
        Self {
            gain: s.clone(),
            bass: s.clone(),
            mid: s.clone(),
            treble: s.clone(),
            presence: s.clone(),
            master: s.clone(),
            drive: s.clone(),
            rectifier: s,
        }
    }

    fn reset(&mut self, sample_rate: f64) {
        for s in [
            &mut self.gain,
            &mut self.bass,
            &mut self.mid,
            &mut self.treble,
            &mut self.presence,
            &mut self.master,
            &mut self.drive,
        ] {
            s.reset(sample_rate, CONTROL_SMOOTHING_S);
        }
        self.rectifier.reset(sample_rate, RECTIFIER_SMOOTHING_S);
    }

    fn set_targets(&mut self, p: &AmpParams) {
        self.gain.set_target(p.gain as f64);
        self.bass.set_target(p.bass as f64);
        self.mid.set_target(p.mid as f64);
        self.treble.set_target(p.treble as f64);
        self.presence.set_target(p.presence as f64);
        self.master.set_target(p.master as f64);
        self.drive.set_target(p.drive as f64);
        self.rectifier.set_target(p.rectifier.target());
    }

    fn set_immediate(&mut self, p: &AmpParams) {
        self.gain.set_immediate(p.gain as f64);
        self.bass.set_immediate(p.bass as f64);
        self.mid.set_immediate(p.mid as f64);
        self.treble.set_immediate(p.treble as f64);
        self.presence.set_immediate(p.presence as f64);
        self.master.set_immediate(p.master as f64);
        self.drive.set_immediate(p.drive as f64);
        self.rectifier.set_immediate(p.rectifier.target());
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChannelEngine {
    state: EngineState,
    sample_rate: f64,
    max_block_size: usize,
    smoothers: Smoothers,
    tone_stack: ToneStack,
    rectifier: Rectifier,
    /// Working copy of the current block in f64.
    scratch: Vec<f64>,
    /// False until the first snapshot after `prepare` has been applied.
    primed: bool,
}

impl ChannelEngine {
    pub fn new() -> Self {
        Self {
            state: EngineState::Uninitialized,
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_block_size: 0,
            smoothers: Smoothers::new(),
            tone_stack: ToneStack::new(DEFAULT_SAMPLE_RATE),
            rectifier: Rectifier::new(),
            scratch: Vec::new(),
            primed: false,
        }
    }

    /// Configure for a sample rate and maximum block size. Clears all
    /// signal memory. Must be called before the first `process_block` and
    /// again whenever the host configuration changes.
    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        let sample_rate = if sample_rate.is_finite() && sample_rate >= MIN_SAMPLE_RATE {
            sample_rate
        } else {
            warn!("sample rate {sample_rate} unusable, running at {MIN_SAMPLE_RATE} Hz");
            MIN_SAMPLE_RATE
        };
        if max_block_size == 0 {
            warn!("max block size 0, processing one sample at a time");
        }
        let max_block_size = max_block_size.max(1);

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.smoothers.reset(sample_rate);
        self.tone_stack = ToneStack::new(sample_rate);
        self.rectifier.reset();
        self.scratch.clear();
        self.scratch.resize(max_block_size, 0.0);
        self.primed = false;
        self.state = EngineState::Prepared;

        debug!("channel engine prepared: {sample_rate} Hz, max block {max_block_size}");
    }

    /// Clear filter delay lines and sag. Smoother targets and positions are
    /// kept, so resuming playback doesn't ramp in from a default.
    pub fn reset(&mut self) {
        self.tone_stack.reset();
        self.rectifier.reset();
        if self.state == EngineState::Processing {
            self.state = EngineState::Prepared;
        }
    }

    /// Process one block in place.
    ///
    /// With `params.bypass` set the buffer is left untouched and no state
    /// moves. Blocks longer than the prepared maximum are processed in
    /// consecutive chunks of at most that size.
    pub fn process_block(&mut self, buffer: &mut [f32], params: &AmpParams) {
        if self.state == EngineState::Uninitialized || buffer.is_empty() || params.bypass {
            return;
        }

        let p = params.sanitized();
        if self.primed {
            self.smoothers.set_targets(&p);
        } else {
            self.smoothers.set_immediate(&p);
            self.primed = true;
        }
        self.state = EngineState::Processing;

        for chunk in buffer.chunks_mut(self.max_block_size) {
            self.process_chunk(chunk, &p);
        }
    }

    fn process_chunk(&mut self, chunk: &mut [f32], p: &AmpParams) {
        let n = chunk.len();

        // Block rate: tone coefficients follow the smoothed knobs.
        let tone = ToneSettings {
            bass: self.smoothers.bass.skip(n),
            mid: self.smoothers.mid.skip(n),
            treble: self.smoothers.treble.skip(n),
            presence: self.smoothers.presence.skip(n),
        };
        self.tone_stack.update(&tone);

        let block = &mut self.scratch[..n];

        for (y, &x) in block.iter_mut().zip(chunk.iter()) {
            // Non-finite input would poison the filter memory for good.
            let x = if x.is_finite() { x as f64 } else { 0.0 };

            let amount = preamp::gain_amount(self.smoothers.gain.next_value());
            let mut s = preamp::process(x, amount);

            let drive = self.smoothers.drive.next_value();
            let rect = self.smoothers.rectifier.next_value();
            s = self.rectifier.process(s, drive, rect);

            s = p.voice.shape(s);
            *y = p.mode.shape(s);
        }

        self.tone_stack.process_block(block);

        for (out, &y) in chunk.iter_mut().zip(block.iter()) {
            let level = master_level(self.smoothers.master.next_value());
            *out = (y * level).clamp(-OUTPUT_LIMIT, OUTPUT_LIMIT) as f32;
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Rectifier sag follower value.
    pub fn sag_state(&self) -> f64 {
        self.rectifier.sag()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }
}

impl Default for ChannelEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Master control -> output level (0.15x-12x).
#[inline]
fn master_level(master: f64) -> f64 {
    MASTER_MIN + master * (MASTER_MAX - MASTER_MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RectifierMode;
    use std::f64::consts::PI;

    const SR: f64 = 44100.0;

    fn prepared(max_block: usize) -> ChannelEngine {
        let mut e = ChannelEngine::new();
        e.prepare(SR, max_block);
        e
    }

    fn sine(freq: f64, amp: f64, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (amp * (2.0 * PI * freq * i as f64 / SR).sin()) as f32)
            .collect()
    }

    #[test]
    fn test_unprepared_is_noop() {
        let mut e = ChannelEngine::new();
        let mut buf = sine(440.0, 0.5, 64);
        let orig = buf.clone();
        e.process_block(&mut buf, &AmpParams::default());
        assert_eq!(buf, orig);
        assert_eq!(e.state(), EngineState::Uninitialized);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut e = prepared(512);
        assert_eq!(e.state(), EngineState::Prepared);

        e.process_block(&mut [], &AmpParams::default());
        assert_eq!(e.state(), EngineState::Prepared, "empty block is not processing");

        let mut buf = sine(220.0, 0.3, 512);
        e.process_block(&mut buf, &AmpParams::default());
        assert_eq!(e.state(), EngineState::Processing);

        e.reset();
        assert_eq!(e.state(), EngineState::Prepared);
    }

    #[test]
    fn test_silence_in_silence_out() {
        let mut e = prepared(512);
        let params = AmpParams { gain: 1.0, drive: 1.0, master: 1.0, ..Default::default() };
        let mut buf = vec![0.0f32; 512];
        for _ in 0..4 {
            e.process_block(&mut buf, &params);
            assert!(buf.iter().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_output_clipped() {
        let mut e = prepared(256);
        let params = AmpParams {
            gain: 1.0,
            bass: 1.0,
            mid: 1.0,
            treble: 1.0,
            presence: 1.0,
            master: 1.0,
            drive: 1.0,
            ..Default::default()
        };
        let mut buf = sine(110.0, 1.0, 4096);
        e.process_block(&mut buf, &params);
        let peak = buf.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak <= OUTPUT_LIMIT as f32, "peak {peak}");
        assert!(peak > 0.9, "full settings should hit the clip: {peak}");
    }

    #[test]
    fn test_bypass_freezes_everything() {
        let mut e = prepared(512);
        let tube = AmpParams { rectifier: RectifierMode::Tube, ..Default::default() };
        let mut warm = sine(330.0, 0.8, 512);
        e.process_block(&mut warm, &tube);

        let before = e.clone();
        let mut buf = sine(440.0, 0.7, 512);
        let orig = buf.clone();
        e.process_block(&mut buf, &AmpParams { gain: 0.0, bypass: true, ..tube });

        assert_eq!(buf, orig);
        assert_eq!(e, before);
    }

    #[test]
    fn test_first_block_snaps_smoothers() {
        let mut e = prepared(512);
        let params = AmpParams { gain: 0.9, master: 0.2, ..Default::default() };
        e.process_block(&mut vec![0.0; 512], &params);
        assert!(!e.smoothers.gain.is_smoothing());
        assert!((e.smoothers.gain.current() - 0.9).abs() < 1e-6);
        assert!((e.smoothers.master.current() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_later_blocks_ramp() {
        let mut e = prepared(512);
        e.process_block(&mut vec![0.0; 512], &AmpParams::default());
        e.process_block(&mut vec![0.0; 512], &AmpParams { master: 1.0, ..Default::default() });

        let m = e.smoothers.master.current();
        assert!(m > 0.5 && m < 1.0, "master mid-ramp: {m}");

        // 0.05 s = 2205 samples; four more blocks finish the ramp.
        for _ in 0..4 {
            e.process_block(&mut vec![0.0; 512], &AmpParams { master: 1.0, ..Default::default() });
        }
        assert_eq!(e.smoothers.master.current(), 1.0);
    }

    #[test]
    fn test_reset_keeps_smoothers_clears_memory() {
        let mut e = prepared(512);
        let params = AmpParams { rectifier: RectifierMode::Tube, drive: 0.8, ..Default::default() };
        let mut buf = sine(200.0, 0.9, 512);
        e.process_block(&mut buf, &params);
        assert!(e.sag_state() > 0.0);

        let smoothers = e.smoothers.clone();
        e.reset();
        assert_eq!(e.sag_state(), 0.0);
        assert_eq!(e.smoothers, smoothers);

        // Cleared delay lines: silence right after reset stays silent.
        let mut silence = vec![0.0f32; 512];
        e.process_block(&mut silence, &params);
        assert!(silence.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_oversized_block_is_chunked() {
        let params = AmpParams { gain: 0.7, treble: 0.9, ..Default::default() };
        let input = sine(150.0, 0.6, 512);

        let mut whole = prepared(256);
        let mut a = input.clone();
        whole.process_block(&mut a, &params);

        let mut split = prepared(256);
        let (first, second) = input.split_at(256);
        let mut b1 = first.to_vec();
        let mut b2 = second.to_vec();
        split.process_block(&mut b1, &params);
        split.process_block(&mut b2, &params);

        b1.extend_from_slice(&b2);
        assert_eq!(a, b1);
    }

    #[test]
    fn test_non_finite_input_is_contained() {
        let mut e = prepared(64);
        let mut buf = sine(440.0, 0.5, 64);
        buf[10] = f32::NAN;
        buf[20] = f32::INFINITY;
        e.process_block(&mut buf, &AmpParams::default());
        assert!(buf.iter().all(|s| s.is_finite()));

        let mut next = sine(440.0, 0.5, 64);
        e.process_block(&mut next, &AmpParams::default());
        assert!(next.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_prepare_rejects_bad_config() {
        let mut e = ChannelEngine::new();
        e.prepare(f64::NAN, 0);
        assert_eq!(e.sample_rate(), MIN_SAMPLE_RATE);
        assert_eq!(e.max_block_size(), 1);

        let mut buf = sine(440.0, 0.5, 16);
        e.process_block(&mut buf, &AmpParams::default());
        assert!(buf.iter().all(|s| s.is_finite() && s.abs() <= 0.95));
    }

    /// Bass -> mid -> treble -> presence, then master and clip, built by hand.
    fn tone_and_master(mut block: Vec<f64>, p: &AmpParams) -> Vec<f32> {
        use crate::filters::Biquad;
        use crate::tone_stack::{BASS, MID, PRESENCE, TREBLE};

        let mut bands = [
            Biquad::low_shelf(BASS.corner_hz, BASS.q, BASS.gain(p.bass as f64), SR),
            Biquad::peaking(MID.corner_hz, MID.q, MID.gain(p.mid as f64), SR),
            Biquad::high_shelf(TREBLE.corner_hz, TREBLE.q, TREBLE.gain(p.treble as f64), SR),
            Biquad::high_shelf(
                PRESENCE.corner_hz,
                PRESENCE.q,
                PRESENCE.gain(p.presence as f64),
                SR,
            ),
        ];
        for band in &mut bands {
            band.process_block(&mut block);
        }
        let level = master_level(p.master as f64);
        block
            .iter()
            .map(|&y| (y * level).clamp(-OUTPUT_LIMIT, OUTPUT_LIMIT) as f32)
            .collect()
    }

    #[test]
    fn test_stage_order() {
        use crate::voicing::{Mode, Voice};

        for rectifier in [RectifierMode::Silicon, RectifierMode::Tube] {
            let p = AmpParams {
                gain: 0.5,
                bass: 0.7,
                mid: 0.3,
                treble: 0.6,
                presence: 0.4,
                master: 0.0,
                drive: 0.2,
                rectifier,
                voice: Voice::Raw,
                mode: Mode::Crunch,
                bypass: false,
            };
            let input = sine(180.0, 0.3, 256);

            let mut e = prepared(256);
            let mut out = input.clone();
            e.process_block(&mut out, &p);

            let amount = preamp::gain_amount(p.gain as f64);
            let drive = p.drive as f64;
            let rect_mode = p.rectifier.target();

            // preamp -> rectifier -> voice -> mode
            let mut rect = Rectifier::new();
            let staged: Vec<f64> = input
                .iter()
                .map(|&x| {
                    let s = rect.process(preamp::process(x as f64, amount), drive, rect_mode);
                    p.mode.shape(p.voice.shape(s))
                })
                .collect();
            assert_eq!(out, tone_and_master(staged, &p), "{rectifier:?}");
            assert_eq!(e.sag_state(), rect.sag());

            // Reordered chains must not produce the same block.
            let mut rect = Rectifier::new();
            let mode_first: Vec<f64> = input
                .iter()
                .map(|&x| {
                    let s = rect.process(preamp::process(x as f64, amount), drive, rect_mode);
                    p.voice.shape(p.mode.shape(s))
                })
                .collect();
            assert_ne!(out, tone_and_master(mode_first, &p));

            let mut rect = Rectifier::new();
            let rectifier_last: Vec<f64> = input
                .iter()
                .map(|&x| {
                    let s = p.mode.shape(p.voice.shape(preamp::process(x as f64, amount)));
                    rect.process(s, drive, rect_mode)
                })
                .collect();
            assert_ne!(out, tone_and_master(rectifier_last, &p));
        }
    }

    #[test]
    fn test_master_mapping() {
        assert!((master_level(0.0) - 0.15).abs() < 1e-12);
        assert!((master_level(1.0) - 12.0).abs() < 1e-12);
    }
}
