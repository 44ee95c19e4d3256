//! Offline rendering through the engine
//!
//! The engine is driven exactly as a host would drive it: one fixed-size
//! period at a time through the synthetic callback driver. The limiter's
//! lookahead latency, when engaged, is compensated so the output lines up
//! with the input.

use anyhow::{bail, Context, Result};
use euphoriae_dsp::AudioBuffer;
use euphoriae_engine::{
    AudioEngine, EffectProfile, EffectSettings, EngineHandle, Faults, ParamId, StreamConfig,
    SyntheticDriver,
};
use tracing::{debug, info};

use crate::config::RenderConfig;
use crate::wav::WavAudio;

/// Session bound for the duration of one render
const RENDER_SESSION: u64 = 1;

/// Overrides applied on top of the configured effect settings
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub profile: Option<EffectProfile>,
    pub preset: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub frames_in: usize,
    pub frames_out: usize,
    pub latency_frames: usize,
    pub peak: f32,
    pub faults: Faults,
    /// Effective settings after profile and preset overrides
    pub settings: EffectSettings,
}

/// Render `audio` through a fresh engine
pub fn render(
    audio: &WavAudio,
    config: &RenderConfig,
    options: &RenderOptions,
) -> Result<(WavAudio, RenderReport)> {
    let (mut engine, handle) =
        AudioEngine::new(config.engine.clone()).context("Failed to build engine")?;
    handle.create(RENDER_SESSION)?;
    configure(&handle, config, options)?;

    let stream = StreamConfig::new(audio.sample_rate, audio.channels, config.output.period_frames);
    let driver = SyntheticDriver::new(stream).context("Unsupported input format")?;
    engine.prepare(audio.sample_rate);
    let latency = engine.latency_frames();

    let tempo = handle.param(ParamId::Tempo);
    let samples = if tempo == 1.0 {
        render_direct(&mut engine, &driver, audio, latency)
    } else {
        render_stretched(&mut engine, audio, config.output.period_frames, tempo, latency)?
    };

    let faults = handle.take_faults();
    let settings = handle.settings();
    handle.destroy();

    let output = WavAudio {
        samples,
        channels: audio.channels,
        sample_rate: audio.sample_rate,
    };
    let report = RenderReport {
        frames_in: audio.frames(),
        frames_out: output.frames(),
        latency_frames: latency,
        peak: output.samples.iter().fold(0.0_f32, |p, s| p.max(s.abs())),
        faults,
        settings,
    };
    info!(
        "Rendered {} frames -> {} frames (peak {:.3})",
        report.frames_in, report.frames_out, report.peak
    );
    Ok((output, report))
}

fn configure(handle: &EngineHandle, config: &RenderConfig, options: &RenderOptions) -> Result<()> {
    // The [engine] section owns the band layout
    let mut effects = config.effects.clone();
    effects.eq_layout = config.engine.eq_layout;
    handle.apply_settings(&effects);

    if let Some(profile) = options.profile {
        handle.apply_profile(profile);
        debug!("Profile '{profile}' applied");
    }

    if let Some(name) = &options.preset {
        if !handle.apply_preset(name) {
            let available: Vec<&str> = handle.presets().iter().map(|p| p.name).collect();
            bail!(
                "Unknown preset '{name}' for {} bands (available: {})",
                handle.band_count(),
                available.join(", ")
            );
        }
    }
    Ok(())
}

/// Unit tempo: pad by the latency, render, drop the leading delay
fn render_direct(
    engine: &mut AudioEngine,
    driver: &SyntheticDriver,
    audio: &WavAudio,
    latency: usize,
) -> Vec<f32> {
    let pad = latency * audio.channels;
    let mut input = Vec::with_capacity(audio.samples.len() + pad);
    input.extend_from_slice(&audio.samples);
    input.resize(audio.samples.len() + pad, 0.0);

    let mut output = driver.run(engine, &input);
    output.drain(..pad.min(output.len()));
    output
}

/// Tempo change: push periods through the stretcher until the expected
/// output length (plus latency) has been produced
fn render_stretched(
    engine: &mut AudioEngine,
    audio: &WavAudio,
    period: usize,
    tempo: f32,
    latency: usize,
) -> Result<Vec<f32>> {
    let channels = audio.channels;
    let source = AudioBuffer::from_interleaved(&audio.samples, channels, audio.sample_rate)?;
    let target_frames = (audio.frames() as f64 / f64::from(tempo)).round() as usize;
    let wanted = target_frames + latency;
    // Generous flush allowance for the stretcher's internal buffering
    let max_flush = audio.sample_rate as usize;

    let mut period_in = AudioBuffer::new(channels, period, audio.sample_rate);
    let mut period_out = AudioBuffer::new(channels, period, audio.sample_rate);
    let mut interleaved = vec![0.0; period * channels];
    let mut output = Vec::with_capacity(wanted * channels);

    let mut position = 0;
    let mut flushed = 0;
    while output.len() < wanted * channels && flushed < max_flush {
        let remaining = source.frames().saturating_sub(position);
        let frames = if remaining > 0 { remaining.min(period) } else { period };
        period_in.set_frames(frames);
        for channel in 0..channels {
            let Some(dst) = period_in.channel_mut(channel) else {
                continue;
            };
            match source.channel(channel) {
                Some(src) if remaining > 0 => dst.copy_from_slice(&src[position..position + frames]),
                _ => dst.fill(0.0),
            }
        }

        let progress = engine.process_stretched(&period_in, &mut period_out);
        if remaining > 0 {
            position += progress.consumed;
        } else {
            flushed += progress.consumed.max(1);
        }

        let produced = progress.produced * channels;
        period_out.write_interleaved(&mut interleaved[..produced])?;
        output.extend_from_slice(&interleaved[..produced]);
    }

    let pad = (latency * channels).min(output.len());
    output.drain(..pad);
    output.truncate(target_frames * channels);
    debug!("Stretched {} frames at tempo {tempo}", audio.frames());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use euphoriae_dsp::test_utils::{generate_sine, tone_magnitude};

    const SR: u32 = 48000;

    fn stereo_tone(frequency: f32, seconds: f32, amplitude: f32) -> WavAudio {
        let mono = generate_sine(frequency, SR, seconds, amplitude);
        WavAudio {
            samples: mono.iter().flat_map(|&s| [s, s]).collect(),
            channels: 2,
            sample_rate: SR,
        }
    }

    fn left(audio: &WavAudio) -> Vec<f32> {
        audio.samples.iter().step_by(audio.channels).copied().collect()
    }

    #[test]
    fn defaults_render_is_transparent() {
        let input = stereo_tone(440.0, 0.2, 0.5);
        let (output, report) =
            render(&input, &RenderConfig::default(), &RenderOptions::default()).unwrap();
        assert_eq!(report.latency_frames, 0);
        assert_eq!(output, input);
        assert!(report.faults.is_empty());
    }

    #[test]
    fn engaged_limiter_delay_is_compensated() {
        let mut config = RenderConfig::default();
        config.effects.limiter = 0.1;
        let input = stereo_tone(440.0, 0.2, 0.5);
        let (output, report) = render(&input, &config, &RenderOptions::default()).unwrap();
        assert_eq!(report.latency_frames, 144);
        assert_eq!(output.frames(), input.frames());
        for (a, b) in output.samples.iter().zip(&input.samples) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn preset_option_shapes_the_sound() {
        let input = stereo_tone(62.0, 1.0, 0.05);
        let options = RenderOptions {
            preset: Some("Bass Boost".to_string()),
            ..RenderOptions::default()
        };
        let (output, _) = render(&input, &RenderConfig::default(), &options).unwrap();

        let tail = SR as usize / 2;
        let before = tone_magnitude(&left(&input)[tail..], 62.0, SR);
        let after = tone_magnitude(&left(&output)[tail..], 62.0, SR);
        assert!(after > before * 2.0, "{before} -> {after}");
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let options = RenderOptions {
            preset: Some("Disco".to_string()),
            ..RenderOptions::default()
        };
        let err = render(&stereo_tone(440.0, 0.05, 0.1), &RenderConfig::default(), &options)
            .unwrap_err();
        assert!(err.to_string().contains("Disco"));
    }

    #[test]
    fn tempo_shortens_output() {
        let mut config = RenderConfig::default();
        config.effects.tempo = 1.5;
        let input = stereo_tone(330.0, 1.5, 0.3);
        let (output, report) = render(&input, &config, &RenderOptions::default()).unwrap();
        assert_eq!(report.frames_out, (input.frames() as f32 / 1.5).round() as usize);
        assert!(output.samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn surround_input_is_rejected() {
        let input = WavAudio {
            samples: vec![0.0; 6 * 64],
            channels: 6,
            sample_rate: SR,
        };
        assert!(render(&input, &RenderConfig::default(), &RenderOptions::default()).is_err());
    }
}
