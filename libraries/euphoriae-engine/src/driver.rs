//! Synthetic callback driver
//!
//! Stands in for a host audio stack: it hands an [`AudioCallback`] one
//! fixed-size period at a time, either on the caller's thread
//! ([`SyntheticDriver::run`]) or on a dedicated audio thread
//! ([`SyntheticDriver::spawn`]). Renders and tests drive the engine through
//! it exactly as a device callback would.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use euphoriae_dsp::{AudioBuffer, MAX_CHANNELS, MIN_SAMPLE_RATE};
use tracing::{debug, warn};

use crate::engine::AudioEngine;
use crate::error::{EngineError, Result};

/// Stream format a host negotiates before the first callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub sample_rate: u32,
    pub channels: usize,
    /// Frames per callback
    pub period_frames: usize,
}

impl StreamConfig {
    pub fn new(sample_rate: u32, channels: usize, period_frames: usize) -> Self {
        Self {
            sample_rate,
            channels,
            period_frames,
        }
    }
}

/// Periodic processing callback registered with a host
pub trait AudioCallback: Send {
    /// Called once before the first period
    fn prepare(&mut self, _config: &StreamConfig) {}

    /// Process one period in place; must finish within the period's duration
    fn render(&mut self, buffer: &mut AudioBuffer);
}

impl AudioCallback for AudioEngine {
    fn prepare(&mut self, config: &StreamConfig) {
        AudioEngine::prepare(self, config.sample_rate);
    }

    fn render(&mut self, buffer: &mut AudioBuffer) {
        self.process(buffer);
    }
}

/// Calls an [`AudioCallback`] with fixed-size periods
#[derive(Debug, Clone)]
pub struct SyntheticDriver {
    config: StreamConfig,
}

impl SyntheticDriver {
    pub fn new(config: StreamConfig) -> Result<Self> {
        if config.channels == 0 || config.channels > MAX_CHANNELS {
            return Err(EngineError::UnsupportedCapability(format!(
                "{} channels",
                config.channels
            )));
        }
        if config.sample_rate < MIN_SAMPLE_RATE {
            return Err(EngineError::UnsupportedCapability(format!(
                "{} Hz sample rate",
                config.sample_rate
            )));
        }
        if config.period_frames == 0 {
            return Err(EngineError::UnsupportedCapability(
                "zero-length period".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Render interleaved input through `callback` on the current thread
    ///
    /// The last period is zero-padded; the output has the input's length.
    pub fn run<C: AudioCallback + ?Sized>(&self, callback: &mut C, input: &[f32]) -> Vec<f32> {
        let StreamConfig {
            sample_rate,
            channels,
            period_frames,
        } = self.config;

        let period_samples = period_frames * channels;
        let mut buffer = AudioBuffer::new(channels, period_frames, sample_rate);
        let mut interleaved = vec![0.0; period_samples];
        let mut output = Vec::with_capacity(input.len().div_ceil(period_samples) * period_samples);

        callback.prepare(&self.config);
        for chunk in input.chunks(period_samples) {
            interleaved[..chunk.len()].copy_from_slice(chunk);
            interleaved[chunk.len()..].fill(0.0);
            fill_period(&mut buffer, &interleaved);

            callback.render(&mut buffer);

            buffer.set_frames(period_frames);
            // Shape is fixed for the whole run
            let _ = buffer.write_interleaved(&mut interleaved);
            output.extend_from_slice(&interleaved);
        }

        output.truncate(input.len());
        debug!(
            "Rendered {} frames in periods of {}",
            input.len() / channels,
            period_frames
        );
        output
    }

    /// Run `callback` on a dedicated audio thread
    ///
    /// Each period, `source` fills the buffer (returning false once it has
    /// nothing left), the callback renders it, and `sink` receives the
    /// result. The thread ends when the source runs dry or the handle is
    /// stopped.
    pub fn spawn<C, S, K>(&self, mut callback: C, mut source: S, mut sink: K) -> Result<DriverHandle<C>>
    where
        C: AudioCallback + 'static,
        S: FnMut(&mut AudioBuffer) -> bool + Send + 'static,
        K: FnMut(&AudioBuffer) + Send + 'static,
    {
        let config = self.config;
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&stop_signal);

        let thread = thread::Builder::new()
            .name("euphoriae-audio".to_string())
            .spawn(move || {
                let mut buffer =
                    AudioBuffer::new(config.channels, config.period_frames, config.sample_rate);
                callback.prepare(&config);

                while !stop.load(Ordering::Acquire) {
                    buffer.set_frames(config.period_frames);
                    if !source(&mut buffer) {
                        break;
                    }
                    callback.render(&mut buffer);
                    sink(&buffer);
                }
                callback
            })
            .map_err(|e| EngineError::UnsupportedCapability(format!("audio thread: {e}")))?;

        Ok(DriverHandle {
            stop_signal,
            thread: Some(thread),
        })
    }
}

/// Copy a full interleaved period into `buffer`
fn fill_period(buffer: &mut AudioBuffer, interleaved: &[f32]) {
    let channels = buffer.channel_count();
    let frames = buffer.set_frames(interleaved.len() / channels);
    for channel in 0..channels {
        if let Some(samples) = buffer.channel_mut(channel) {
            for (frame, sample) in samples.iter_mut().enumerate().take(frames) {
                *sample = interleaved[frame * channels + channel];
            }
        }
    }
}

/// Handle to a spawned audio thread
pub struct DriverHandle<C> {
    stop_signal: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<C>>,
}

impl<C> DriverHandle<C> {
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Ask the thread to stop after its current period and wait for it
    pub fn stop(mut self) -> Option<C> {
        self.stop_signal.store(true, Ordering::Release);
        self.wait()
    }

    /// Wait for the source to run dry
    pub fn join(mut self) -> Option<C> {
        self.wait()
    }

    fn wait(&mut self) -> Option<C> {
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(callback) => Some(callback),
            Err(_) => {
                warn!("Audio thread panicked");
                None
            }
        }
    }
}

impl<C> Drop for DriverHandle<C> {
    fn drop(&mut self) {
        self.stop_signal.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Doubles every sample and counts periods
    struct Doubler {
        periods: usize,
        prepared_rate: u32,
    }

    impl AudioCallback for Doubler {
        fn prepare(&mut self, config: &StreamConfig) {
            self.prepared_rate = config.sample_rate;
        }

        fn render(&mut self, buffer: &mut AudioBuffer) {
            self.periods += 1;
            for channel in 0..buffer.channel_count() {
                if let Some(samples) = buffer.channel_mut(channel) {
                    samples.iter_mut().for_each(|s| *s *= 2.0);
                }
            }
        }
    }

    fn doubler() -> Doubler {
        Doubler {
            periods: 0,
            prepared_rate: 0,
        }
    }

    #[test]
    fn rejects_unsupported_streams() {
        assert!(SyntheticDriver::new(StreamConfig::new(48000, 6, 256)).is_err());
        assert!(SyntheticDriver::new(StreamConfig::new(4000, 2, 256)).is_err());
        assert!(SyntheticDriver::new(StreamConfig::new(48000, 2, 0)).is_err());
    }

    #[test]
    fn run_keeps_length_and_order() {
        let driver = SyntheticDriver::new(StreamConfig::new(48000, 2, 4)).unwrap();
        let input: Vec<f32> = (0..22).map(|i| i as f32 * 0.01).collect();
        let mut callback = doubler();

        let output = driver.run(&mut callback, &input);
        assert_eq!(output.len(), input.len());
        assert_eq!(callback.periods, 3);
        assert_eq!(callback.prepared_rate, 48000);
        for (out, inp) in output.iter().zip(&input) {
            assert!((out - inp * 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn spawned_thread_drains_source() {
        let driver = SyntheticDriver::new(StreamConfig::new(44100, 1, 64)).unwrap();
        let mut remaining = 10;
        let (tx, rx) = std::sync::mpsc::channel();

        let handle = driver
            .spawn(
                doubler(),
                move |buffer| {
                    if remaining == 0 {
                        return false;
                    }
                    remaining -= 1;
                    if let Some(samples) = buffer.channel_mut(0) {
                        samples.fill(0.25);
                    }
                    true
                },
                move |buffer| {
                    let _ = tx.send(buffer.peak());
                },
            )
            .unwrap();

        let callback = handle.join().unwrap();
        assert_eq!(callback.periods, 10);
        let peaks: Vec<f32> = rx.iter().collect();
        assert_eq!(peaks, vec![0.5; 10]);
    }

    #[test]
    fn stop_ends_an_endless_source() {
        let driver = SyntheticDriver::new(StreamConfig::new(48000, 2, 32)).unwrap();
        let handle = driver.spawn(doubler(), |_| true, |_| {}).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let callback = handle.stop().unwrap();
        assert!(callback.periods > 0);
    }
}
