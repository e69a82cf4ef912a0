//! Amp chain benchmarks

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gainforge_dsp::tone_stack::{ToneSettings, ToneStack};
use gainforge_dsp::{AmpDriver, AmpParams, ChannelEngine, RectifierMode};

const SR: f64 = 48000.0;
const BLOCK: usize = 512;

fn input() -> Vec<f32> {
    (0..BLOCK).map(|i| (i as f32 * 0.03).sin() * 0.6).collect()
}

fn bench_channel_engine(c: &mut Criterion) {
    let mut engine = ChannelEngine::new();
    engine.prepare(SR, BLOCK);
    let params = AmpParams { rectifier: RectifierMode::Tube, ..Default::default() };

    let source = input();
    let mut buffer = source.clone();

    c.bench_function("channel_engine_512", |b| {
        b.iter(|| {
            buffer.copy_from_slice(&source);
            engine.process_block(black_box(&mut buffer), &params);
        })
    });
}

fn bench_stereo_driver(c: &mut Criterion) {
    let mut driver = AmpDriver::new();
    driver.prepare(SR, BLOCK);
    let params = AmpParams::default();

    let source = input();
    let mut left = source.clone();
    let mut right = source.clone();

    c.bench_function("amp_driver_stereo_512", |b| {
        b.iter(|| {
            left.copy_from_slice(&source);
            right.copy_from_slice(&source);
            driver.process(black_box(&mut [&mut left[..], &mut right[..]]), &params);
        })
    });
}

fn bench_tone_stack_update(c: &mut Criterion) {
    let mut stack = ToneStack::new(SR);
    let mut knob = 0.0;

    c.bench_function("tone_stack_update", |b| {
        b.iter(|| {
            knob = (knob + 0.01) % 1.0;
            stack.update(black_box(&ToneSettings {
                bass: knob,
                mid: 1.0 - knob,
                treble: knob,
                presence: 0.5,
            }));
        })
    });
}

criterion_group!(benches, bench_channel_engine, bench_stereo_driver, bench_tone_stack_update);
criterion_main!(benches);
