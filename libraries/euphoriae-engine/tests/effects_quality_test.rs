//! End-to-end quality tests through the full engine
//!
//! Every signal runs through `AudioEngine::process` in host-sized periods,
//! the same path a device callback takes.

use euphoriae_dsp::effects::EqLayout;
use euphoriae_dsp::test_utils::{
    generate_burst, generate_sine, generate_white_noise, linear_to_db, max_step, peak,
    tone_magnitude,
};
use euphoriae_dsp::AudioBuffer;
use euphoriae_engine::{
    AudioEngine, BandLayout, EngineConfig, EngineHandle, FadeCurve, ParamId, PresetLabel,
};

const SR: u32 = 48000;
const PERIOD: usize = 256;

fn stereo(samples: &[f32]) -> AudioBuffer {
    AudioBuffer::from_channels(vec![samples.to_vec(), samples.to_vec()], SR).unwrap()
}

fn engine_with(config: EngineConfig) -> (AudioEngine, EngineHandle) {
    let (mut engine, handle) = AudioEngine::new(config).unwrap();
    engine.prepare(SR);
    handle.create(1).unwrap();
    (engine, handle)
}

fn engine() -> (AudioEngine, EngineHandle) {
    engine_with(EngineConfig::default())
}

fn render(engine: &mut AudioEngine, input: &[f32]) -> Vec<f32> {
    let mut output = Vec::with_capacity(input.len());
    for chunk in input.chunks(PERIOD) {
        let mut buffer = stereo(chunk);
        engine.process(&mut buffer);
        output.extend_from_slice(buffer.channel(0).unwrap());
    }
    output
}

/// Steady-state gain (dB) at `frequency`, aligned for the engine's latency
fn gain_db(engine: &mut AudioEngine, frequency: f32, amplitude: f32) -> f32 {
    let input = generate_sine(frequency, SR, 1.0, amplitude);
    let output = render(engine, &input);
    let latency = engine.latency_frames();
    let start = SR as usize / 4;

    let out = tone_magnitude(&output[start..], frequency, SR);
    let reference = tone_magnitude(&input[start - latency..input.len() - latency], frequency, SR);
    linear_to_db(out / reference)
}

// ===== Equalizer =====

#[test]
fn full_band_boost_is_twelve_db() {
    let (mut engine, handle) = engine();
    // 1 kHz band at full level, tone at -6 dBFS
    handle.set_equalizer_band(5, 1.0);
    let amplitude = 10.0_f32.powf(-6.0 / 20.0);

    let boost = gain_db(&mut engine, 1000.0, amplitude);
    assert!((boost - 12.0).abs() < 0.5, "1 kHz gain {boost:.2} dB");

    for frequency in [31.0, 16000.0] {
        let gain = gain_db(&mut engine, frequency, amplitude);
        assert!(gain.abs() < 0.5, "{frequency} Hz moved by {gain:.2} dB");
    }
}

#[test]
fn layout_round_trip_keeps_stored_levels_audible() {
    let (mut engine, handle) = engine();
    // Band 7 is 4 kHz in the 10-band layout
    handle.set_equalizer_band(7, 1.0);
    render(&mut engine, &vec![0.0; 4800]);

    handle.set_eq_layout(EqLayout::FiveBand);
    assert!(handle.apply_preset("Bass Boost"));
    render(&mut engine, &vec![0.0; 4800]);

    handle.set_eq_layout(EqLayout::TenBand);
    assert_eq!(handle.equalizer_band(7), Some(0.0));
    let gain = gain_db(&mut engine, 4000.0, 0.1);
    assert!(gain.abs() < 0.5, "4 kHz still moved by {gain:.2} dB");
}

#[test]
fn bass_boost_preset_in_five_band_layout() {
    let config = EngineConfig {
        eq_layout: BandLayout::FiveBand,
        ..EngineConfig::default()
    };
    let (_engine, handle) = engine_with(config);

    assert_eq!(handle.band_count(), 5);
    assert!(handle.apply_preset("Bass Boost"));
    let levels: Vec<f32> = (0..5).filter_map(|band| handle.equalizer_band(band)).collect();
    assert_eq!(levels, vec![0.8, 0.5, 0.0, 0.0, 0.0]);
    assert_eq!(handle.active_preset(), PresetLabel::named("Bass Boost"));
    assert!(!handle.apply_preset("Vocal"));
}

#[test]
fn flat_then_edit_is_custom() {
    let (mut engine, handle) = engine();
    handle.apply_preset("Jazz");
    handle.apply_preset("Flat");
    assert_eq!(handle.active_preset().as_str(), "Flat");

    // Flat sounds like nothing at all
    let input = generate_sine(300.0, SR, 0.1, 0.4);
    let output = render(&mut engine, &input);
    let latency = engine.latency_frames();
    assert_eq!(output[latency..], input[..input.len() - latency]);

    handle.set_equalizer_band(2, -0.5);
    assert_eq!(handle.active_preset(), PresetLabel::Custom);
}

// ===== Dynamics =====

#[test]
fn full_limiter_holds_half_scale() {
    let (mut engine, handle) = engine();
    handle.set_limiter(1.0);
    // Let the ceiling ramp settle
    render(&mut engine, &vec![0.0; 4800]);

    let burst = generate_burst(440.0, SR, 0.1, 0.3, 0.9);
    let output = render(&mut engine, &burst);
    let level = peak(&output);
    assert!(level <= 0.5 + 1e-3, "limiter let {level} through");
    assert!(level > 0.45);
}

#[test]
fn limiter_engages_only_above_zero() {
    let (mut engine, handle) = engine();
    assert_eq!(engine.latency_frames(), 0);

    let hot = generate_sine(1000.0, SR, 0.1, 1.5);
    assert!(peak(&render(&mut engine, &hot)) > 1.4);

    handle.set_limiter(0.2);
    assert_eq!(engine.latency_frames(), 144);
    handle.set_limiter(0.0);
    assert_eq!(engine.latency_frames(), 0);
}

#[test]
fn engaged_limiter_bounds_a_hot_mix() {
    let (mut engine, handle) = engine();
    handle.set_limiter(0.01);
    render(&mut engine, &vec![0.0; 4800]);
    handle.apply_preset("Electronic");
    handle.set_bass_boost(1.0);
    handle.set_treble_boost(1.0);
    handle.set_tube_warmth(1.0);
    handle.set_surround_3d(1.0);

    let output = render(&mut engine, &generate_white_noise(SR, 0.5, 1.0));
    assert!(peak(&output) <= 0.99 + 1e-3);
    assert!(peak(&output) > 0.9);
}

// ===== Smoothing =====

#[test]
fn parameter_jumps_do_not_click() {
    let (mut engine, handle) = engine();
    let input = generate_sine(100.0, SR, 0.5, 0.4);
    let mut output = Vec::with_capacity(input.len());

    for (index, chunk) in input.chunks(PERIOD).enumerate() {
        match index {
            20 => handle.set_volume(0.1),
            40 => {
                handle.apply_preset("Rock");
                handle.set_volume(1.0);
            }
            60 => handle.set_bass_boost(1.0),
            _ => {}
        }
        let mut buffer = stereo(chunk);
        engine.process(&mut buffer);
        output.extend_from_slice(buffer.channel(0).unwrap());
    }

    // An unramped volume step at this level would jump by ~0.35
    let step = max_step(&output);
    assert!(step < 0.05, "largest step {step}");
}

#[test]
fn full_band_swing_ramps_smoothly() {
    let (mut engine, handle) = engine();
    handle.set_equalizer_band(3, -1.0);
    let input = generate_sine(200.0, SR, 0.3, 0.05);
    let mut output = Vec::with_capacity(input.len());

    for (index, chunk) in input.chunks(PERIOD).enumerate() {
        if index == 25 {
            handle.set_equalizer_band(3, 1.0);
        }
        let mut buffer = stereo(chunk);
        engine.process(&mut buffer);
        output.extend_from_slice(buffer.channel(0).unwrap());
    }

    let step = max_step(&output);
    assert!(step < 0.02, "largest step {step}");
    // Full level once the ramp is over: roughly +11 dB just below 250 Hz
    let tail = &output[output.len() - 4800..];
    assert!(peak(tail) > 0.05 * 3.0);
}

#[test]
fn repeated_writes_are_idempotent() {
    let input = generate_white_noise(SR, 0.2, 0.5);

    let (mut once, handle) = engine();
    handle.apply_preset("Pop");
    handle.set_virtualizer(0.7);

    let (mut twice, twice_handle) = engine();
    for _ in 0..2 {
        twice_handle.apply_preset("Pop");
        twice_handle.set_virtualizer(0.7);
    }

    assert_eq!(render(&mut once, &input), render(&mut twice, &input));
}

// ===== Reverb, tempo, crossfade =====

#[test]
fn reverb_none_is_exact_bypass() {
    let (mut engine, handle) = engine();
    handle.set_reverb(0, 1.0);

    let input = generate_white_noise(SR, 0.1, 0.5);
    let output = render(&mut engine, &input);
    let latency = engine.latency_frames();
    assert_eq!(output[latency..], input[..input.len() - latency]);
}

#[test]
fn reverb_adds_a_tail() {
    let (mut engine, handle) = engine();
    handle.set_reverb(4, 0.8);

    let output = render(&mut engine, &generate_burst(800.0, SR, 0.2, 0.1, 0.5));
    let tail_start = (SR as f32 * 0.35) as usize;
    assert!(peak(&output[tail_start..]) > 1e-3);
}

#[test]
fn tempo_changes_output_length() {
    let (mut engine, handle) = engine();
    handle.set_playback_tempo_pitch(2.0, 0.0);

    let source = generate_sine(440.0, SR, 2.0, 0.3);
    let input = stereo(&source);
    let mut period_in = AudioBuffer::new(2, PERIOD, SR);
    let mut period_out = AudioBuffer::new(2, PERIOD, SR);

    let mut position = 0;
    let mut produced = 0;
    for _ in 0..10_000 {
        if position >= source.len() {
            break;
        }
        let frames = period_in.set_frames((source.len() - position).min(PERIOD));
        for channel in 0..2 {
            let src = &input.channel(channel).unwrap()[position..position + frames];
            period_in.channel_mut(channel).unwrap().copy_from_slice(src);
        }
        let progress = engine.process_stretched(&period_in, &mut period_out);
        assert!(period_out.channel(0).unwrap().iter().all(|s| s.is_finite()));
        position += progress.consumed;
        produced += progress.produced;
    }
    assert_eq!(position, source.len());

    let ratio = produced as f32 / source.len() as f32;
    assert!((ratio - 0.5).abs() < 0.05, "tempo 2.0 produced ratio {ratio}");
}

#[test]
fn unit_tempo_copies_through() {
    let (mut engine, _handle) = engine();
    let input = stereo(&generate_sine(440.0, SR, 0.01, 0.3));
    let mut output = AudioBuffer::new(2, input.frames(), SR);

    let progress = engine.process_stretched(&input, &mut output);
    assert_eq!(progress.consumed, input.frames());
    assert_eq!(progress.produced, input.frames());
}

#[test]
fn crossfade_uses_configured_duration() {
    let (mut engine, handle) = engine();
    handle.set_crossfade_duration(10);
    // Ramp the duration to its target
    render(&mut engine, &vec![0.0; 4800]);

    engine.set_crossfade_curve(FadeCurve::Linear);
    engine.start_crossfade();
    assert_eq!(engine.current_value(ParamId::CrossfadeMs), 10.0);

    let outgoing = AudioBuffer::from_channels(vec![vec![1.0; 1024]; 2], SR).unwrap();
    let incoming = AudioBuffer::from_channels(vec![vec![0.0; 1024]; 2], SR).unwrap();
    let mut mixed = AudioBuffer::new(2, 1024, SR);

    let (written, complete) = engine.mix_crossfade(&outgoing, &incoming, &mut mixed);
    assert_eq!(written, 1024);
    assert!(complete);
    let left = mixed.channel(0).unwrap();
    assert!(left[0] > 0.99);
    assert!(left[240] > 0.45 && left[240] < 0.55);
    assert_eq!(left[600], 0.0);
}
