//! Performance benchmarks for the effect modules
//!
//! Run with: cargo bench -p euphoriae-dsp --bench effects_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use euphoriae_dsp::effects::*;
use euphoriae_dsp::TimeStretcher;
use std::f32::consts::PI;

const SR: u32 = 48000;
const BLOCK: usize = 512;

/// 1 kHz test block
fn test_block() -> Vec<f32> {
    (0..BLOCK)
        .map(|i| (2.0 * PI * 1000.0 * i as f32 / SR as f32).sin() * 0.5)
        .collect()
}

fn modules() -> Vec<(&'static str, Box<dyn AudioEffect>)> {
    let mut eq = GraphicEq::new(EqLayout::TenBand);
    eq.set_gains(&[3.0, -2.0, 4.0, 1.0, -1.0, 2.0, 3.0, -3.0, 2.0, 1.0]);
    let mut compressor = Compressor::new();
    compressor.set_strength(0.7);
    let mut clarity = Enhancer::new(CLARITY);
    clarity.set_strength(0.7);
    let mut surround = Surround::new(SR);
    surround.set_level(0.7);
    surround.set_depth(0.5);
    let mut reverb = Reverb::new(SR);
    reverb.set_preset(ReverbPreset::MediumHall);
    reverb.set_wetness(0.4);
    let mut pitch = PitchShifter::new(SR);
    pitch.set_semitones(3.0);

    vec![
        ("graphic_eq_10", Box::new(eq)),
        ("compressor", Box::new(compressor)),
        ("clarity", Box::new(clarity)),
        ("surround", Box::new(surround)),
        ("reverb", Box::new(reverb)),
        ("pitch", Box::new(pitch)),
        ("limiter", Box::new(Limiter::new(DEFAULT_LOOKAHEAD_MS, SR))),
    ]
}

fn bench_modules(c: &mut Criterion) {
    let mut group = c.benchmark_group("effect_block_512");
    group.throughput(Throughput::Elements(BLOCK as u64));
    let block = test_block();

    for (name, mut module) in modules() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &block, |b, block| {
            let mut left = block.clone();
            let mut right = block.clone();
            b.iter(|| {
                left.copy_from_slice(block);
                right.copy_from_slice(block);
                module.process(black_box(&mut left), black_box(&mut right), SR);
            });
        });
    }
    group.finish();
}

fn bench_time_stretch(c: &mut Criterion) {
    let mut group = c.benchmark_group("time_stretch");
    group.throughput(Throughput::Elements(BLOCK as u64));
    let block = test_block();

    for tempo in [0.75_f32, 1.25, 2.0] {
        group.bench_with_input(BenchmarkId::from_parameter(tempo), &block, |b, block| {
            let mut stretcher = TimeStretcher::new(SR, BLOCK);
            stretcher.set_sample_rate(SR);
            stretcher.set_tempo(tempo);
            let mut out_l = vec![0.0; BLOCK * 2];
            let mut out_r = vec![0.0; BLOCK * 2];
            b.iter(|| {
                stretcher.write(block, block);
                black_box(stretcher.read(&mut out_l, &mut out_r));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_modules, bench_time_stretch);
criterion_main!(benches);
