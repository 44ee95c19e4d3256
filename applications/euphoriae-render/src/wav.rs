//! WAV file input and output

use std::path::Path;

use anyhow::{Context, Result};

/// Interleaved audio read from or written to a file
#[derive(Debug, Clone, PartialEq)]
pub struct WavAudio {
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl WavAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1)
    }

    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate.max(1) as f32
    }
}

/// Read any integer or float WAV into normalized f32 samples
pub fn read_wav(path: &Path) -> Result<WavAudio> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("Failed to decode {}", path.display()))?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .with_context(|| format!("Failed to decode {}", path.display()))?
        }
    };

    Ok(WavAudio {
        samples,
        channels: usize::from(spec.channels),
        sample_rate: spec.sample_rate,
    })
}

/// Write interleaved samples as 16-bit PCM or 32-bit float
pub fn write_wav(path: &Path, audio: &WavAudio, float: bool) -> Result<()> {
    let spec = hound::WavSpec {
        channels: u16::try_from(audio.channels).context("Too many channels")?,
        sample_rate: audio.sample_rate,
        bits_per_sample: if float { 32 } else { 16 },
        sample_format: if float {
            hound::SampleFormat::Float
        } else {
            hound::SampleFormat::Int
        },
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for &sample in &audio.samples {
        if float {
            writer.write_sample(sample)?;
        } else {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * f32::from(i16::MAX)).round() as i16)?;
        }
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finish {}", path.display()))?;
    Ok(())
}
