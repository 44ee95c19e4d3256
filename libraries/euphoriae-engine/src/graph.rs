//! Effect graph
//!
//! Owns every effect module and runs them in a fixed order on planar stereo
//! sub-blocks of at most `max_block_frames`. Mono buffers are spread into
//! preallocated stereo scratch and folded back as `(L + R) / 2`.
//!
//! Continuous parameters are pushed into the modules once per control granule
//! while a ramp is running, and once per sub-block when every ramp has settled.
//! A stage that goes from idle to active is reset first so it never starts
//! from stale state.
//!
//! Each active stage is guarded: if it produces a non-finite sample, its
//! block is restored from the copy taken before it ran, the stage is latched
//! to pass-through until the next session reset, and its bit is raised in the
//! shared fault mask.

use std::mem;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use euphoriae_dsp::effects::*;
use euphoriae_dsp::AudioBuffer;

use crate::config::EngineConfig;
use crate::params::{ParamId, ParamKind, PARAM_COUNT};
use crate::smoothing::{SmoothingController, CONTROL_GRANULE};
use crate::store::ParamSnapshot;

/// Surround mix floor while headphone surround is on
pub const HEADPHONE_SURROUND_MIN_MIX: f32 = 0.35;

/// Processing stages in graph order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Equalizer,
    BassBoost,
    Virtualizer,
    Clarity,
    SpectrumExtension,
    TubeWarmth,
    TrebleBoost,
    Compressor,
    VolumeLeveler,
    StereoImage,
    HeadphoneCorrection,
    Surround,
    HeadphoneCrossfeed,
    Reverb,
    Pitch,
    Volume,
    Limiter,
}

impl Stage {
    /// Every stage, in processing order
    pub const ALL: [Self; 17] = [
        Self::Equalizer,
        Self::BassBoost,
        Self::Virtualizer,
        Self::Clarity,
        Self::SpectrumExtension,
        Self::TubeWarmth,
        Self::TrebleBoost,
        Self::Compressor,
        Self::VolumeLeveler,
        Self::StereoImage,
        Self::HeadphoneCorrection,
        Self::Surround,
        Self::HeadphoneCrossfeed,
        Self::Reverb,
        Self::Pitch,
        Self::Volume,
        Self::Limiter,
    ];

    #[inline]
    pub fn bit(self) -> u32 {
        1 << self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Equalizer => "equalizer",
            Self::BassBoost => "bass boost",
            Self::Virtualizer => "virtualizer",
            Self::Clarity => "clarity",
            Self::SpectrumExtension => "spectrum extension",
            Self::TubeWarmth => "tube warmth",
            Self::TrebleBoost => "treble boost",
            Self::Compressor => "compressor",
            Self::VolumeLeveler => "volume leveler",
            Self::StereoImage => "stereo image",
            Self::HeadphoneCorrection => "headphone correction",
            Self::Surround => "surround",
            Self::HeadphoneCrossfeed => "headphone crossfeed",
            Self::Reverb => "reverb",
            Self::Pitch => "pitch",
            Self::Volume => "volume",
            Self::Limiter => "limiter",
        }
    }
}

/// Fault flags raised by the audio thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Faults(u32);

impl Faults {
    /// A buffer had a channel count or sample rate the graph cannot process
    pub const UNSUPPORTED_FORMAT: u32 = 1 << 31;

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, stage: Stage) -> bool {
        self.0 & stage.bit() != 0
    }

    pub fn unsupported_format(self) -> bool {
        self.0 & Self::UNSUPPORTED_FORMAT != 0
    }

    /// Stages latched to pass-through
    pub fn stages(self) -> impl Iterator<Item = Stage> {
        Stage::ALL.into_iter().filter(move |&stage| self.contains(stage))
    }
}

struct Modules {
    eq: GraphicEq,
    bass_boost: BassBoost,
    virtualizer: Virtualizer,
    clarity: Enhancer,
    spectrum_extension: Enhancer,
    tube_warmth: Enhancer,
    treble_boost: Enhancer,
    compressor: Compressor,
    leveler: VolumeLeveler,
    stereo: StereoImage,
    headphone: HeadphoneCorrection,
    surround: Surround,
    crossfeed: Crossfeed,
    reverb: Reverb,
    pitch: PitchShifter,
    volume: OutputGain,
    limiter: Limiter,
}

impl Modules {
    fn new(config: &EngineConfig) -> Self {
        let max_sr = config.max_sample_rate;
        Self {
            eq: GraphicEq::new(config.eq_layout.into()),
            bass_boost: BassBoost::new(),
            virtualizer: Virtualizer::new(max_sr),
            clarity: Enhancer::new(CLARITY),
            spectrum_extension: Enhancer::new(SPECTRUM_EXTENSION),
            tube_warmth: Enhancer::new(TUBE_WARMTH),
            treble_boost: Enhancer::new(TREBLE_BOOST),
            compressor: Compressor::new(),
            leveler: VolumeLeveler::new(config.leveler_target_db),
            stereo: StereoImage::new(),
            headphone: HeadphoneCorrection::new(),
            surround: Surround::new(max_sr),
            crossfeed: Crossfeed::new(),
            reverb: Reverb::new(max_sr),
            pitch: PitchShifter::new(max_sr),
            volume: OutputGain::default(),
            limiter: Limiter::new(config.limiter_lookahead_ms, max_sr),
        }
    }

    fn effect_mut(&mut self, stage: Stage) -> &mut dyn AudioEffect {
        match stage {
            Stage::Equalizer => &mut self.eq,
            Stage::BassBoost => &mut self.bass_boost,
            Stage::Virtualizer => &mut self.virtualizer,
            Stage::Clarity => &mut self.clarity,
            Stage::SpectrumExtension => &mut self.spectrum_extension,
            Stage::TubeWarmth => &mut self.tube_warmth,
            Stage::TrebleBoost => &mut self.treble_boost,
            Stage::Compressor => &mut self.compressor,
            Stage::VolumeLeveler => &mut self.leveler,
            Stage::StereoImage => &mut self.stereo,
            Stage::HeadphoneCorrection => &mut self.headphone,
            Stage::Surround => &mut self.surround,
            Stage::HeadphoneCrossfeed => &mut self.crossfeed,
            Stage::Reverb => &mut self.reverb,
            Stage::Pitch => &mut self.pitch,
            Stage::Volume => &mut self.volume,
            Stage::Limiter => &mut self.limiter,
        }
    }

    /// Whether running the stage can change the signal
    ///
    /// The equalizer skips flat bands itself and the pitch shifter must keep
    /// its delay line fed, so both always run. The limiter only engages once
    /// its strength is above zero.
    fn is_active(&self, stage: Stage, headphone_surround: bool) -> bool {
        match stage {
            Stage::Equalizer | Stage::Pitch | Stage::Volume => true,
            Stage::Limiter => self.limiter.strength() > 0.0,
            Stage::BassBoost => self.bass_boost.strength() > 0.0,
            Stage::Virtualizer => self.virtualizer.strength() > 0.0,
            Stage::Clarity => self.clarity.strength() > 0.0,
            Stage::SpectrumExtension => self.spectrum_extension.strength() > 0.0,
            Stage::TubeWarmth => self.tube_warmth.strength() > 0.0,
            Stage::TrebleBoost => self.treble_boost.strength() > 0.0,
            Stage::Compressor => self.compressor.strength() > 0.0,
            Stage::VolumeLeveler => self.leveler.strength() > 0.0,
            Stage::StereoImage => !self.stereo.is_neutral(),
            Stage::HeadphoneCorrection => self.headphone.profile() != HeadphoneProfile::Generic,
            Stage::Surround => self.surround.effective_mix() > 0.0,
            Stage::HeadphoneCrossfeed => headphone_surround,
            Stage::Reverb => self.reverb.is_active(),
        }
    }

    fn reset_all(&mut self) {
        for stage in Stage::ALL {
            self.effect_mut(stage).reset();
        }
    }

    /// Push one continuous parameter into its module
    fn apply(&mut self, id: ParamId, value: f32) {
        if let Some(band) = id.band_index() {
            self.eq.set_band_level(band, value);
            return;
        }
        match id {
            ParamId::BassBoost => self.bass_boost.set_strength(value),
            ParamId::Virtualizer => self.virtualizer.set_strength(value),
            ParamId::Clarity => self.clarity.set_strength(value),
            ParamId::SpectrumExtension => self.spectrum_extension.set_strength(value),
            ParamId::TubeWarmth => self.tube_warmth.set_strength(value),
            ParamId::TrebleBoost => self.treble_boost.set_strength(value),
            ParamId::Compressor => self.compressor.set_strength(value),
            ParamId::VolumeLeveler => self.leveler.set_strength(value),
            ParamId::Limiter => self.limiter.set_strength(value),
            ParamId::StereoBalance => self.stereo.set_balance(value),
            ParamId::ChannelSeparation => self.stereo.set_separation(value),
            ParamId::SurroundLevel => self.surround.set_level(value),
            ParamId::RoomSize => self.surround.set_room_size(value),
            ParamId::Surround3D => self.surround.set_depth(value),
            ParamId::ReverbWetness => self.reverb.set_wetness(value),
            ParamId::Pitch => self.pitch.set_semitones(value),
            ParamId::Volume => self.volume.set_gain(value),
            _ => {}
        }
    }
}

/// The ordered effect chain
pub struct EffectGraph {
    modules: Modules,
    smoothing: SmoothingController,
    /// Last value pushed into each module setter
    applied: [f32; PARAM_COUNT],

    /// Master switch is off
    bypassed: bool,
    headphone_surround: bool,

    /// Stages that ran on the previous block
    active: u32,
    /// Stages latched to pass-through
    faulted: u32,
    faults: Arc<AtomicU32>,

    scratch_l: Vec<f32>,
    scratch_r: Vec<f32>,
    backup_l: Vec<f32>,
    backup_r: Vec<f32>,

    max_block_frames: usize,
    max_sample_rate: u32,
    sample_rate: u32,
}

impl EffectGraph {
    /// Build every module and the scratch buffers
    ///
    /// This is the only place the graph allocates.
    pub fn new(config: &EngineConfig, snapshot: &ParamSnapshot, faults: Arc<AtomicU32>) -> Self {
        let frames = config.max_block_frames.max(1);
        let mut graph = Self {
            modules: Modules::new(config),
            smoothing: SmoothingController::new(config.ramp_ms, snapshot),
            applied: [f32::NAN; PARAM_COUNT],
            bypassed: false,
            headphone_surround: false,
            active: 0,
            faulted: 0,
            faults,
            scratch_l: vec![0.0; frames],
            scratch_r: vec![0.0; frames],
            backup_l: vec![0.0; frames],
            backup_r: vec![0.0; frames],
            max_block_frames: frames,
            max_sample_rate: config.max_sample_rate,
            sample_rate: 0,
        };
        graph.prepare(44100);
        graph.reset(snapshot);
        graph
    }

    /// Bind to a stream sample rate ahead of processing
    ///
    /// A rate change resets every module.
    pub fn prepare(&mut self, sample_rate: u32) {
        if sample_rate == self.sample_rate || sample_rate == 0 {
            return;
        }
        self.sample_rate = sample_rate;
        self.smoothing.set_sample_rate(sample_rate);
        self.modules.eq.set_sample_rate(sample_rate);
        self.modules.limiter.set_sample_rate(sample_rate);
        self.modules.reset_all();
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Delay added by the graph at the current sample rate (frames)
    ///
    /// Follows the limiter's target strength: non-zero once the limiter is
    /// set to engage, zero once it is set to zero.
    pub fn latency_frames(&self) -> usize {
        if self.smoothing.target(ParamId::Limiter) > 0.0 {
            self.modules.limiter.latency_frames()
        } else {
            0
        }
    }

    /// Audible value of a parameter
    pub fn value(&self, id: ParamId) -> f32 {
        self.smoothing.value(id)
    }

    /// No ramp is running
    pub fn is_settled(&self) -> bool {
        self.smoothing.is_settled()
    }

    /// Stages latched to pass-through since the last reset
    pub fn faulted(&self) -> Faults {
        Faults(self.faulted)
    }

    /// Follow a new parameter snapshot
    ///
    /// Structural parameters switch now; continuous ones start ramping.
    pub fn update(&mut self, snapshot: &ParamSnapshot) {
        self.apply_structural(snapshot);
        self.smoothing.retarget(snapshot);
    }

    /// Start a new session from silence
    ///
    /// Every ramp snaps to the snapshot, every module is zeroed and latched
    /// faults are cleared, so the graph behaves exactly like a new one.
    pub fn reset(&mut self, snapshot: &ParamSnapshot) {
        self.apply_structural(snapshot);
        self.smoothing.snap_to(snapshot);

        // Force coefficient recomputation for every band
        for band in 0..MAX_BANDS {
            self.modules.eq.set_band_gain(band, 0.0);
        }
        self.applied = [f32::NAN; PARAM_COUNT];
        self.apply_continuous();

        self.modules.reset_all();
        self.faulted = 0;
        self.active = self.active_mask();
    }

    fn apply_structural(&mut self, snapshot: &ParamSnapshot) {
        let enabled = snapshot.flag(ParamId::Enabled);
        if enabled && self.bypassed {
            self.modules.reset_all();
            self.active = self.active_mask();
        }
        self.bypassed = !enabled;

        let layout = EqLayout::from_id(snapshot.get(ParamId::EqLayout) as u32);
        if layout != self.modules.eq.layout() {
            self.modules.eq.set_layout(layout);
            // Push every band level again under the new layout
            for id in ParamId::ALL.into_iter().filter(|id| id.band_index().is_some()) {
                self.applied[id.index()] = f32::NAN;
            }
        }

        let profile = HeadphoneProfile::from_id(snapshot.get(ParamId::HeadphoneType) as i64);
        self.modules.headphone.set_profile(profile);

        let headphone_surround = snapshot.flag(ParamId::HeadphoneSurround);
        if headphone_surround != self.headphone_surround {
            self.headphone_surround = headphone_surround;
            let minimum = if headphone_surround {
                HEADPHONE_SURROUND_MIN_MIX
            } else {
                0.0
            };
            self.modules.surround.set_minimum_mix(minimum);
            self.modules.surround.reset();
            self.modules.crossfeed.reset();
        }

        let preset = ReverbPreset::from_id(snapshot.get(ParamId::ReverbPreset) as i64);
        self.modules.reverb.set_preset(preset);
    }

    fn apply_continuous(&mut self) {
        for id in ParamId::ALL {
            if id.spec().kind != ParamKind::Continuous {
                continue;
            }
            let value = self.smoothing.value(id);
            let applied = &mut self.applied[id.index()];
            if value != *applied {
                *applied = value;
                self.modules.apply(id, value);
            }
        }
    }

    fn active_mask(&self) -> u32 {
        Stage::ALL
            .into_iter()
            .filter(|&stage| self.modules.is_active(stage, self.headphone_surround))
            .fold(0, |mask, stage| mask | stage.bit())
    }

    fn raise(&self, bits: u32) {
        self.faults.fetch_or(bits, Ordering::Relaxed);
    }

    /// Process one host buffer in place
    ///
    /// Never allocates or blocks. Unsupported formats pass through untouched
    /// and raise [`Faults::UNSUPPORTED_FORMAT`].
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        if buffer.validate(self.max_sample_rate).is_err() {
            self.raise(Faults::UNSUPPORTED_FORMAT);
            return;
        }
        if self.bypassed || buffer.is_empty() {
            return;
        }
        self.prepare(buffer.sample_rate());

        if let Some((left, right)) = buffer.stereo_mut() {
            let max = self.max_block_frames;
            for (l, r) in left.chunks_mut(max).zip(right.chunks_mut(max)) {
                self.process_block(l, r);
            }
            return;
        }

        let Some(mono) = buffer.channel_mut(0) else {
            return;
        };
        let mut left = mem::take(&mut self.scratch_l);
        let mut right = mem::take(&mut self.scratch_r);
        for chunk in mono.chunks_mut(self.max_block_frames) {
            let frames = chunk.len();
            left[..frames].copy_from_slice(chunk);
            right[..frames].copy_from_slice(chunk);
            self.process_block(&mut left[..frames], &mut right[..frames]);
            for (sample, (l, r)) in chunk.iter_mut().zip(left.iter().zip(right.iter())) {
                *sample = (l + r) * 0.5;
            }
        }
        self.scratch_l = left;
        self.scratch_r = right;
    }

    fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        for sample in left.iter_mut().chain(right.iter_mut()) {
            if !sample.is_finite() {
                *sample = 0.0;
            }
        }

        let frames = left.len();
        let mut start = 0;
        while start < frames {
            let len = if self.smoothing.is_settled() {
                frames - start
            } else {
                CONTROL_GRANULE.min(frames - start)
            };
            self.smoothing.advance(len);
            self.apply_continuous();

            let end = start + len;
            self.run_stages(&mut left[start..end], &mut right[start..end]);
            start = end;
        }
    }

    fn run_stages(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len();
        let sample_rate = self.sample_rate;

        for stage in Stage::ALL {
            let bit = stage.bit();
            if self.faulted & bit != 0 {
                continue;
            }
            if !self.modules.is_active(stage, self.headphone_surround) {
                self.active &= !bit;
                continue;
            }
            if self.active & bit == 0 {
                self.modules.effect_mut(stage).reset();
                self.active |= bit;
            }

            self.backup_l[..frames].copy_from_slice(left);
            self.backup_r[..frames].copy_from_slice(right);

            self.modules.effect_mut(stage).process(left, right, sample_rate);

            if !all_finite(left) || !all_finite(right) {
                left.copy_from_slice(&self.backup_l[..frames]);
                right.copy_from_slice(&self.backup_r[..frames]);
                self.faulted |= bit;
                self.raise(bit);
            }
        }
    }
}

#[inline]
fn all_finite(samples: &[f32]) -> bool {
    samples.iter().all(|s| s.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use euphoriae_dsp::test_utils::{generate_sine, peak, tone_magnitude};

    const SR: u32 = 48000;

    fn graph(snapshot: &ParamSnapshot) -> (EffectGraph, Arc<AtomicU32>) {
        let faults = Arc::new(AtomicU32::new(0));
        let mut graph = EffectGraph::new(&EngineConfig::default(), snapshot, Arc::clone(&faults));
        graph.prepare(SR);
        (graph, faults)
    }

    fn stereo(samples: &[f32]) -> AudioBuffer {
        AudioBuffer::from_channels(vec![samples.to_vec(), samples.to_vec()], SR).unwrap()
    }

    #[test]
    fn default_graph_is_transparent() {
        let (mut graph, _) = graph(&ParamSnapshot::defaults());
        let input = generate_sine(440.0, SR, 0.1, 0.5);
        let mut buffer = stereo(&input);
        graph.process(&mut buffer);

        assert_eq!(graph.latency_frames(), 0);
        assert_eq!(buffer.channel(0).unwrap(), &input[..]);
    }

    #[test]
    fn engaged_limiter_only_delays() {
        let mut snapshot = ParamSnapshot::defaults();
        snapshot.set(ParamId::Limiter, 0.2);
        let (mut graph, _) = graph(&snapshot);
        let input = generate_sine(440.0, SR, 0.1, 0.5);
        let mut buffer = stereo(&input);
        graph.process(&mut buffer);

        let latency = graph.latency_frames();
        assert_eq!(latency, 144);
        let out = buffer.channel(0).unwrap();
        assert_eq!(out[latency..], input[..input.len() - latency]);
    }

    #[test]
    fn layout_switch_replays_stored_levels() {
        let mut snapshot = ParamSnapshot::defaults();
        snapshot.set(ParamId::EqBand7, 1.0);
        let (mut graph, _) = graph(&snapshot);

        // Five bands: band 7 is hidden and its level written back to zero
        snapshot.set(ParamId::EqLayout, 0.0);
        snapshot.set(ParamId::EqBand7, 0.0);
        graph.update(&snapshot);
        graph.process(&mut stereo(&[0.0; 4800]));

        snapshot.set(ParamId::EqLayout, 1.0);
        graph.update(&snapshot);
        graph.process(&mut stereo(&[0.0; 4800]));
        assert!(graph.modules.eq.is_flat());
    }

    #[test]
    fn stage_order_matches_graph() {
        assert_eq!(Stage::ALL[0], Stage::Equalizer);
        assert_eq!(Stage::ALL[16], Stage::Limiter);
        let mut bits = 0;
        for stage in Stage::ALL {
            assert_eq!(bits & stage.bit(), 0);
            bits |= stage.bit();
        }
        assert_eq!(bits & Faults::UNSUPPORTED_FORMAT, 0);
    }

    #[test]
    fn unsupported_buffers_pass_through() {
        let (mut graph, faults) = graph(&ParamSnapshot::defaults());
        let mut buffer = AudioBuffer::from_channels(vec![vec![0.5; 64]; 3], SR).unwrap();
        let before = buffer.clone();
        graph.process(&mut buffer);
        assert_eq!(buffer, before);

        let flags = Faults::from_bits(faults.load(Ordering::Relaxed));
        assert!(flags.unsupported_format());
        assert_eq!(flags.stages().count(), 0);

        let mut buffer = AudioBuffer::from_channels(vec![vec![0.5; 64]; 2], 4000).unwrap();
        graph.process(&mut buffer);
        assert!(buffer.channel(0).unwrap().iter().all(|&s| s == 0.5));
    }

    #[test]
    fn mono_is_folded_back() {
        let mut snapshot = ParamSnapshot::defaults();
        snapshot.set(ParamId::EqBand5, 0.5);
        let (mut graph, _) = graph(&snapshot);

        let input = generate_sine(1000.0, SR, 0.2, 0.1);
        let mut buffer = AudioBuffer::from_channels(vec![input.clone()], SR).unwrap();
        graph.process(&mut buffer);

        let out = buffer.channel(0).unwrap();
        let tail = &out[4800..];
        let gain = tone_magnitude(tail, 1000.0, SR) / 0.1;
        assert!((20.0 * gain.log10() - 6.0).abs() < 0.5, "gain {gain}");
    }

    #[test]
    fn master_switch_bypasses() {
        let mut snapshot = ParamSnapshot::defaults();
        snapshot.set(ParamId::Enabled, 0.0);
        snapshot.set(ParamId::BassBoost, 1.0);
        let (mut graph, _) = graph(&snapshot);

        let input = generate_sine(60.0, SR, 0.05, 0.5);
        let mut buffer = stereo(&input);
        graph.process(&mut buffer);
        assert_eq!(buffer.channel(0).unwrap(), &input[..]);
    }

    #[test]
    fn non_finite_input_is_silenced() {
        let (mut graph, faults) = graph(&ParamSnapshot::defaults());
        let mut buffer = stereo(&[f32::NAN, f32::INFINITY, 0.25, 0.0]);
        graph.process(&mut buffer);
        assert!(buffer.channel(0).unwrap().iter().all(|s| s.is_finite()));
        assert_eq!(faults.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn long_buffers_are_split() {
        let faults = Arc::new(AtomicU32::new(0));
        let config = EngineConfig {
            max_block_frames: 256,
            ..EngineConfig::default()
        };
        let mut snapshot = ParamSnapshot::defaults();
        snapshot.set(ParamId::Limiter, 1.0);
        let mut graph = EffectGraph::new(&config, &snapshot, faults);

        let input = generate_sine(440.0, SR, 0.5, 0.9);
        let mut buffer = stereo(&input);
        graph.process(&mut buffer);
        assert!(peak(buffer.channel(0).unwrap()) <= 0.5 + 1e-4);
    }

    #[test]
    fn headphone_surround_forces_surround_and_crossfeed() {
        let mut snapshot = ParamSnapshot::defaults();
        snapshot.set(ParamId::HeadphoneSurround, 1.0);
        let (graph, _) = graph(&snapshot);
        assert!(graph.active & Stage::Surround.bit() != 0);
        assert!(graph.active & Stage::HeadphoneCrossfeed.bit() != 0);
        assert!(graph.active & Stage::Reverb.bit() == 0);
    }
}
