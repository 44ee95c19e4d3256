//! Engine lifecycle and control surface
//!
//! [`AudioEngine::new`] builds the two halves of an engine:
//!
//! - [`AudioEngine`] lives on the audio thread. Its process calls never block,
//!   allocate or return errors.
//! - [`EngineHandle`] is the cloneable control side. Every setter clamps its
//!   input, writes the parameter store and returns immediately.
//!
//! The halves share a parameter store, the session binding and a fault mask.
//! `create`/`destroy` only publish a new session generation; the audio thread
//! picks it up at the next buffer boundary and zeroes every piece of filter
//! state before processing, so no tail from a previous session survives.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use euphoriae_dsp::effects::{EqLayout, MAX_BANDS};
use euphoriae_dsp::{AudioBuffer, TimeStretcher};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::crossfade::{CrossfadeEngine, CrossfadeState, FadeCurve};
use crate::error::{EngineError, Result};
use crate::graph::{EffectGraph, Faults};
use crate::params::ParamId;
use crate::presets::{self, Preset, PresetLabel};
use crate::profiles::EffectProfile;
use crate::settings::EffectSettings;
use crate::store::{ParamSnapshot, ParamStore};

/// Labels that only the control side touches
#[derive(Debug, Default)]
struct Labels {
    preset: PresetLabel,
    profile: EffectProfile,
}

struct Shared {
    config: EngineConfig,
    store: ParamStore,
    /// Bound session, 0 when destroyed
    session: AtomicU64,
    /// Bumped by every create and destroy
    generation: AtomicU64,
    faults: Arc<AtomicU32>,
    labels: Mutex<Labels>,
    /// Serializes create and destroy
    lifecycle: Mutex<()>,
}

impl Shared {
    fn labels(&self) -> std::sync::MutexGuard<'_, Labels> {
        self.labels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Frames taken from the input and written to the output by one stretched call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StretchProgress {
    pub consumed: usize,
    pub produced: usize,
}

/// Audio-thread half of the engine
pub struct AudioEngine {
    shared: Arc<Shared>,
    graph: EffectGraph,
    snapshot: ParamSnapshot,
    /// Store sequence the snapshot belongs to
    seen: u64,
    generation: u64,

    stretcher: TimeStretcher,
    stretch_l: Vec<f32>,
    stretch_r: Vec<f32>,
    crossfade: CrossfadeEngine,
}

impl AudioEngine {
    /// Build an engine from a validated configuration
    ///
    /// Both halves start unbound: audio passes through untouched until
    /// [`EngineHandle::create`] binds a session.
    pub fn new(config: EngineConfig) -> Result<(Self, EngineHandle)> {
        config.validate()?;

        let store = ParamStore::new();
        store.set(ParamId::EqLayout, EqLayout::from(config.eq_layout).id() as f32);
        let snapshot = store.snapshot();

        let faults = Arc::new(AtomicU32::new(0));
        let graph = EffectGraph::new(&config, &snapshot, Arc::clone(&faults));
        let stretcher = TimeStretcher::new(config.max_sample_rate, config.max_block_frames);
        let frames = config.max_block_frames;

        info!(
            "Engine built: {} bands, {} ms ramps, up to {} Hz",
            EqLayout::from(config.eq_layout).count(),
            config.ramp_ms,
            config.max_sample_rate
        );

        let shared = Arc::new(Shared {
            config,
            store,
            session: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            faults,
            labels: Mutex::new(Labels::default()),
            lifecycle: Mutex::new(()),
        });

        let engine = Self {
            shared: Arc::clone(&shared),
            graph,
            snapshot,
            seen: u64::MAX,
            generation: 0,
            stretcher,
            stretch_l: vec![0.0; frames],
            stretch_r: vec![0.0; frames],
            crossfade: CrossfadeEngine::default(),
        };
        Ok((engine, EngineHandle { shared }))
    }

    /// Bind to the host stream's sample rate ahead of the first callback
    pub fn prepare(&mut self, sample_rate: u32) {
        self.graph.prepare(sample_rate);
        self.stretcher.set_sample_rate(sample_rate);
        self.crossfade.set_sample_rate(sample_rate);
    }

    /// A session is bound
    pub fn is_active(&self) -> bool {
        self.shared.session.load(Ordering::Acquire) != 0
    }

    /// Delay added by the graph (frames)
    ///
    /// Picks up pending parameter and lifecycle changes first, so the value
    /// holds for the next buffer.
    pub fn latency_frames(&mut self) -> usize {
        self.sync();
        self.graph.latency_frames()
    }

    /// Audible (post-ramp) value of a parameter
    pub fn current_value(&self, id: ParamId) -> f32 {
        self.graph.value(id)
    }

    /// Pick up lifecycle and parameter changes; false when unbound
    fn sync(&mut self) -> bool {
        if self.shared.session.load(Ordering::Acquire) == 0 {
            return false;
        }

        let generation = self.shared.generation.load(Ordering::Acquire);
        if generation != self.generation {
            self.generation = generation;
            self.seen = u64::MAX;
            self.shared
                .store
                .read_if_changed(&mut self.seen, &mut self.snapshot);
            self.graph.reset(&self.snapshot);
            self.stretcher.reset();
            self.crossfade.reset();
        } else if self
            .shared
            .store
            .read_if_changed(&mut self.seen, &mut self.snapshot)
        {
            self.graph.update(&self.snapshot);
        }
        self.stretcher.set_tempo(self.snapshot.get(ParamId::Tempo));
        true
    }

    /// Run the effect graph over one host buffer, in place
    ///
    /// Without a bound session the buffer is left untouched.
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        if self.sync() {
            self.graph.process(buffer);
        }
    }

    /// Change tempo through the time stretcher, then run the graph
    ///
    /// Reads as much of `input` as the stretcher accepts and fills `output`
    /// (resized within its capacity) with what is ready. At tempo 1.0 with
    /// nothing buffered, input is copied straight through. Feed the
    /// unconsumed remainder of `input` on the next call.
    pub fn process_stretched(
        &mut self,
        input: &AudioBuffer,
        output: &mut AudioBuffer,
    ) -> StretchProgress {
        output.set_sample_rate(input.sample_rate());
        let active = self.sync();
        let supported = input.validate(self.shared.config.max_sample_rate).is_ok()
            && output.validate(self.shared.config.max_sample_rate).is_ok();

        if !active || !supported {
            if !supported {
                self.shared
                    .faults
                    .fetch_or(Faults::UNSUPPORTED_FORMAT, Ordering::Relaxed);
            }
            let frames = copy_through(input, output);
            return StretchProgress {
                consumed: frames,
                produced: frames,
            };
        }

        self.stretcher.set_sample_rate(input.sample_rate());
        if self.stretcher.tempo() == 1.0 && self.stretcher.is_idle() {
            let frames = copy_through(input, output);
            self.graph.process(output);
            return StretchProgress {
                consumed: frames,
                produced: frames,
            };
        }

        let consumed = match (input.channel(0), input.channel(1)) {
            (Some(left), Some(right)) => self.stretcher.write(left, right),
            (Some(mono), None) => self.stretcher.write(mono, mono),
            _ => 0,
        };

        let capacity = output.capacity();
        output.set_frames(capacity);
        let produced = match output.stereo_mut() {
            Some((left, right)) => self.stretcher.read(left, right),
            None => {
                let wanted = capacity.min(self.stretch_l.len());
                let produced = self
                    .stretcher
                    .read(&mut self.stretch_l[..wanted], &mut self.stretch_r[..wanted]);
                if let Some(mono) = output.channel_mut(0) {
                    for (sample, (l, r)) in mono
                        .iter_mut()
                        .zip(self.stretch_l.iter().zip(self.stretch_r.iter()))
                        .take(produced)
                    {
                        *sample = (l + r) * 0.5;
                    }
                }
                produced
            }
        };
        output.set_frames(produced);
        self.graph.process(output);

        StretchProgress { consumed, produced }
    }

    /// Begin a crossfade lasting the current (ramped) crossfade duration
    pub fn start_crossfade(&mut self) {
        self.crossfade.start(self.graph.value(ParamId::CrossfadeMs));
    }

    pub fn set_crossfade_curve(&mut self, curve: FadeCurve) {
        self.crossfade.set_curve(curve);
    }

    pub fn crossfade_state(&self) -> CrossfadeState {
        self.crossfade.state()
    }

    /// Mix two decoded streams ahead of [`AudioEngine::process`]
    ///
    /// Returns the frames written and whether the fade completed.
    pub fn mix_crossfade(
        &mut self,
        outgoing: &AudioBuffer,
        incoming: &AudioBuffer,
        output: &mut AudioBuffer,
    ) -> (usize, bool) {
        self.crossfade.process(outgoing, incoming, output)
    }
}

/// Copy `input` into `output`, spreading mono to stereo or folding stereo to
/// mono; returns the frames copied
fn copy_through(input: &AudioBuffer, output: &mut AudioBuffer) -> usize {
    let frames = output.set_frames(input.frames());
    let last = input.channel_count().saturating_sub(1);
    let fold = output.channel_count() == 1 && input.channel_count() == 2;

    if fold {
        if let (Some(left), Some(right), Some(out)) =
            (input.channel(0), input.channel(1), output.channel_mut(0))
        {
            for (sample, (l, r)) in out.iter_mut().zip(left.iter().zip(right.iter())) {
                *sample = (l + r) * 0.5;
            }
        }
        return frames;
    }

    for channel in 0..output.channel_count() {
        if let (Some(source), Some(out)) = (input.channel(channel.min(last)), output.channel_mut(channel)) {
            out.copy_from_slice(&source[..frames]);
        }
    }
    frames
}

/// Control-side half of the engine
#[derive(Clone)]
pub struct EngineHandle {
    shared: Arc<Shared>,
}

impl EngineHandle {
    // ===== Lifecycle =====

    /// Bind the engine to a playback session
    ///
    /// An engine that is already bound is destroyed first. Parameters keep
    /// their values; all filter state is zeroed before the next buffer.
    pub fn create(&self, session: u64) -> Result<()> {
        if session == 0 {
            return Err(EngineError::InvalidSession(session));
        }
        let _guard = self
            .shared
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let previous = self.shared.session.load(Ordering::Acquire);
        if previous != 0 {
            info!("Engine already bound to session {previous}, destroying first");
            self.unbind();
        }

        // New generation first: a bound session is never seen with stale state
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        self.shared.session.store(session, Ordering::Release);
        info!("Engine created for session {session}");
        Ok(())
    }

    /// Release the session; audio passes through until the next `create`
    pub fn destroy(&self) {
        let _guard = self
            .shared
            .lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.shared.session.load(Ordering::Acquire) == 0 {
            debug!("destroy ignored: engine not initialized");
            return;
        }
        self.unbind();
    }

    fn unbind(&self) {
        let session = self.shared.session.swap(0, Ordering::AcqRel);
        self.shared.generation.fetch_add(1, Ordering::AcqRel);
        info!("Engine destroyed (session {session})");
    }

    pub fn is_initialized(&self) -> bool {
        self.session().is_some()
    }

    pub fn session(&self) -> Option<u64> {
        match self.shared.session.load(Ordering::Acquire) {
            0 => None,
            session => Some(session),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    // ===== Store access =====

    /// Last value written to a parameter (the ramp target)
    pub fn param(&self, id: ParamId) -> f32 {
        self.shared.store.get(id)
    }

    fn ready(&self, what: &str) -> bool {
        let ready = self.is_initialized();
        if !ready {
            debug!("{what} ignored: engine not initialized");
        }
        ready
    }

    /// Write one parameter, clamped
    ///
    /// Returns the stored value, or `None` before `create`.
    pub fn set_param(&self, id: ParamId, value: f32) -> Option<f32> {
        if !self.ready(id.name()) {
            return None;
        }
        Some(self.shared.store.set(id, value))
    }

    fn set(&self, id: ParamId, value: f32) {
        self.set_param(id, value);
    }

    // ===== Equalizer =====

    pub fn eq_layout(&self) -> EqLayout {
        EqLayout::from_id(self.param(ParamId::EqLayout) as u32)
    }

    pub fn band_count(&self) -> usize {
        self.eq_layout().count()
    }

    pub fn band_center_frequency(&self, band: usize) -> Option<f32> {
        self.eq_layout().frequencies().get(band).copied()
    }

    /// Stored level of a band in [-1, 1]
    pub fn equalizer_band(&self, band: usize) -> Option<f32> {
        if band >= self.band_count() {
            return None;
        }
        ParamId::eq_band(band).map(|id| self.param(id))
    }

    /// Set one band level in [-1, 1] (+12 dB at 1.0)
    ///
    /// The active preset label becomes "Custom".
    pub fn set_equalizer_band(&self, band: usize, level: f32) {
        if !self.ready("set_equalizer_band") {
            return;
        }
        let Some(id) = ParamId::eq_band(band).filter(|_| band < self.band_count()) else {
            debug!("set_equalizer_band ignored: no band {band}");
            return;
        };
        if level.is_nan() {
            return;
        }
        let mut labels = self.shared.labels();
        self.shared.store.set(id, level);
        labels.preset = PresetLabel::Custom;
    }

    /// Presets available for the current layout
    pub fn presets(&self) -> &'static [Preset] {
        presets::presets(self.eq_layout())
    }

    pub fn active_preset(&self) -> PresetLabel {
        self.shared.labels().preset.clone()
    }

    /// Set every band from a named preset, as one update
    ///
    /// Returns false when the current layout has no such preset.
    pub fn apply_preset(&self, name: &str) -> bool {
        if !self.ready("apply_preset") {
            return false;
        }
        let Some(preset) = presets::find(self.eq_layout(), name) else {
            debug!("Unknown preset '{name}' for {} bands", self.band_count());
            return false;
        };

        let mut labels = self.shared.labels();
        self.shared.store.set_many(&preset_writes(preset));
        labels.preset = PresetLabel::named(preset.name);
        debug!("Applied preset '{}'", preset.name);
        true
    }

    /// Switch between the 5-band and 10-band layouts
    ///
    /// A named preset is re-applied from the new layout's table when it has
    /// one; otherwise band levels keep their index and the label becomes
    /// "Custom".
    pub fn set_eq_layout(&self, layout: EqLayout) {
        if !self.ready("set_eq_layout") || layout == self.eq_layout() {
            return;
        }

        let mut labels = self.shared.labels();
        let mut writes = vec![(ParamId::EqLayout, layout.id() as f32)];
        let preset = match &labels.preset {
            PresetLabel::Named(name) => presets::find(layout, name),
            PresetLabel::Custom => None,
        };
        match preset {
            Some(preset) => writes.extend(preset_writes(preset)),
            None => labels.preset = PresetLabel::Custom,
        }
        self.shared.store.set_many(&writes);
        debug!("EQ layout set to {} bands", layout.count());
    }

    // ===== Enhancement =====

    pub fn set_bass_boost(&self, strength: f32) {
        self.set(ParamId::BassBoost, strength);
    }

    pub fn set_virtualizer(&self, strength: f32) {
        self.set(ParamId::Virtualizer, strength);
    }

    pub fn set_clarity(&self, strength: f32) {
        self.set(ParamId::Clarity, strength);
    }

    pub fn set_spectrum_extension(&self, strength: f32) {
        self.set(ParamId::SpectrumExtension, strength);
    }

    pub fn set_tube_warmth(&self, strength: f32) {
        self.set(ParamId::TubeWarmth, strength);
    }

    pub fn set_treble_boost(&self, strength: f32) {
        self.set(ParamId::TrebleBoost, strength);
    }

    // ===== Dynamics =====

    pub fn set_compressor(&self, strength: f32) {
        self.set(ParamId::Compressor, strength);
    }

    pub fn set_volume_leveler(&self, strength: f32) {
        self.set(ParamId::VolumeLeveler, strength);
    }

    /// Limiter strength; the ceiling is `0.99 - 0.49 * strength`
    pub fn set_limiter(&self, strength: f32) {
        self.set(ParamId::Limiter, strength);
    }

    // ===== Spatial =====

    /// -1.0 = full left, 1.0 = full right
    pub fn set_stereo_balance(&self, balance: f32) {
        self.set(ParamId::StereoBalance, balance);
    }

    /// 0.5 is neutral
    pub fn set_channel_separation(&self, separation: f32) {
        self.set(ParamId::ChannelSeparation, separation);
    }

    pub fn set_surround_level(&self, level: f32) {
        self.set(ParamId::SurroundLevel, level);
    }

    pub fn set_room_size(&self, size: f32) {
        self.set(ParamId::RoomSize, size);
    }

    pub fn set_surround_3d(&self, amount: f32) {
        self.set(ParamId::Surround3D, amount);
    }

    /// Headphone correction profile id (0 Generic .. 4 Earbuds, clamped)
    pub fn set_headphone_type(&self, profile_id: i64) {
        self.set(ParamId::HeadphoneType, profile_id.clamp(0, 4) as f32);
    }

    pub fn set_headphone_surround(&self, enabled: bool) {
        self.set(ParamId::HeadphoneSurround, if enabled { 1.0 } else { 0.0 });
    }

    // ===== Reverb, tempo, transitions =====

    /// Reverb preset id (0 None .. 6 Plate, clamped) and wet mix, as one update
    pub fn set_reverb(&self, preset_id: i64, wetness: f32) {
        if !self.ready("set_reverb") {
            return;
        }
        self.shared.store.set_many(&[
            (ParamId::ReverbPreset, preset_id.clamp(0, 6) as f32),
            (ParamId::ReverbWetness, wetness),
        ]);
    }

    /// Tempo in [0.5, 2.0] and pitch in [-12, 12] semitones, as one update
    pub fn set_playback_tempo_pitch(&self, tempo: f32, pitch_semitones: f32) {
        if !self.ready("set_playback_tempo_pitch") {
            return;
        }
        self.shared.store.set_many(&[
            (ParamId::Tempo, tempo),
            (ParamId::Pitch, pitch_semitones),
        ]);
    }

    /// Crossfade duration in [0, 12000] ms
    pub fn set_crossfade_duration(&self, duration_ms: u32) {
        self.set(ParamId::CrossfadeMs, duration_ms as f32);
    }

    // ===== Master =====

    /// Master switch; off passes audio through untouched
    pub fn set_enabled(&self, enabled: bool) {
        self.set(ParamId::Enabled, if enabled { 1.0 } else { 0.0 });
    }

    /// Output volume in [0, 1], ramped
    pub fn set_volume(&self, volume: f32) {
        self.set(ParamId::Volume, volume);
    }

    // ===== Profiles and snapshots =====

    pub fn active_profile(&self) -> EffectProfile {
        self.shared.labels().profile
    }

    /// Apply a profile's preset and effect levels as one update
    ///
    /// `Custom` leaves everything as it is. A preset the current layout lacks
    /// leaves the bands untouched.
    pub fn apply_profile(&self, profile: EffectProfile) -> bool {
        if !self.ready("apply_profile") {
            return false;
        }

        let mut labels = self.shared.labels();
        labels.profile = profile;
        if profile == EffectProfile::Custom {
            debug!("Profile set to Custom");
            return true;
        }

        let mut writes = profile.levels().to_vec();
        let preset = profile
            .preset()
            .and_then(|name| presets::find(self.eq_layout(), name));
        if let Some(preset) = preset {
            writes.extend(preset_writes(preset));
            labels.preset = PresetLabel::named(preset.name);
        }
        self.shared.store.set_many(&writes);
        debug!("Applied profile '{profile}'");
        true
    }

    /// Restore every parameter default and the "Flat" label
    ///
    /// The band layout is kept.
    pub fn reset_all(&self) {
        if !self.ready("reset_all") {
            return;
        }
        let layout = self.eq_layout();
        let mut labels = self.shared.labels();
        let mut snapshot = ParamSnapshot::defaults();
        snapshot.set(ParamId::EqLayout, layout.id() as f32);
        self.shared.store.store_snapshot(&snapshot);
        *labels = Labels::default();
        debug!("All effects reset");
    }

    /// Serializable copy of every setting
    pub fn settings(&self) -> EffectSettings {
        let labels = self.shared.labels();
        EffectSettings::from_snapshot(
            &self.shared.store.snapshot(),
            labels.preset.clone(),
            labels.profile,
        )
    }

    /// Restore a settings snapshot as one update
    pub fn apply_settings(&self, settings: &EffectSettings) {
        if !self.ready("apply_settings") {
            return;
        }
        let mut labels = self.shared.labels();
        self.shared.store.set_many(&settings.to_writes());
        labels.preset = settings.active_preset.clone();
        labels.profile = settings.profile;
        debug!("Settings restored (preset '{}')", labels.preset);
    }

    // ===== Faults =====

    /// Faults raised since the last `take_faults`
    pub fn faults(&self) -> Faults {
        Faults::from_bits(self.shared.faults.load(Ordering::Acquire))
    }

    /// Clear and return the fault flags, logging each one
    pub fn take_faults(&self) -> Faults {
        let faults = Faults::from_bits(self.shared.faults.swap(0, Ordering::AcqRel));
        if faults.unsupported_format() {
            warn!("Unsupported buffer format, audio passed through unprocessed");
        }
        for stage in faults.stages() {
            warn!("Stage '{}' produced invalid samples and was bypassed", stage.name());
        }
        faults
    }
}

/// Writes for every band: the preset's levels, flat past its length
fn preset_writes(preset: &Preset) -> Vec<(ParamId, f32)> {
    (0..MAX_BANDS)
        .map(|band| {
            let level = preset.levels.get(band).copied().unwrap_or(0.0);
            (ParamId::EQ_BANDS[band], level)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> (AudioEngine, EngineHandle) {
        AudioEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn setters_before_create_are_ignored() {
        let (_engine, handle) = engine();
        handle.set_bass_boost(0.8);
        assert!(!handle.apply_preset("Rock"));
        handle.set_equalizer_band(0, 1.0);
        assert_eq!(handle.param(ParamId::BassBoost), 0.0);
        assert_eq!(handle.equalizer_band(0), Some(0.0));
        assert_eq!(handle.active_preset(), PresetLabel::named("Flat"));
    }

    #[test]
    fn session_zero_is_rejected() {
        let (_engine, handle) = engine();
        assert!(matches!(handle.create(0), Err(EngineError::InvalidSession(0))));
        assert!(!handle.is_initialized());
    }

    #[test]
    fn create_on_active_engine_rebinds() {
        let (_engine, handle) = engine();
        handle.create(7).unwrap();
        handle.create(9).unwrap();
        assert_eq!(handle.session(), Some(9));
        handle.destroy();
        assert_eq!(handle.session(), None);
        handle.destroy();
    }

    #[test]
    fn params_survive_destroy() {
        let (_engine, handle) = engine();
        handle.create(1).unwrap();
        handle.set_limiter(0.5);
        handle.destroy();
        handle.create(2).unwrap();
        assert_eq!(handle.param(ParamId::Limiter), 0.5);
    }

    #[test]
    fn manual_edit_makes_label_custom() {
        let (_engine, handle) = engine();
        handle.create(1).unwrap();
        assert!(handle.apply_preset("Flat"));
        assert_eq!(handle.active_preset().as_str(), "Flat");
        assert!((0..10).all(|band| handle.equalizer_band(band) == Some(0.0)));

        handle.set_equalizer_band(3, 0.25);
        assert_eq!(handle.active_preset(), PresetLabel::Custom);
        handle.set_equalizer_band(10, 0.25);
        assert_eq!(handle.equalizer_band(10), None);
    }

    #[test]
    fn layout_switch_reapplies_named_preset() {
        let (_engine, handle) = engine();
        handle.create(1).unwrap();
        handle.apply_preset("Rock");
        handle.set_eq_layout(EqLayout::FiveBand);
        assert_eq!(handle.band_count(), 5);
        assert_eq!(handle.band_center_frequency(2), Some(910.0));
        assert_eq!(handle.equalizer_band(3), Some(0.4));
        assert_eq!(handle.active_preset().as_str(), "Rock");

        handle.set_eq_layout(EqLayout::TenBand);
        handle.apply_preset("Vocal");
        handle.set_eq_layout(EqLayout::FiveBand);
        assert!(handle.active_preset().is_custom());
    }

    #[test]
    fn profile_is_one_update() {
        let (_engine, handle) = engine();
        handle.create(1).unwrap();
        let before = handle.shared.store.sequence();
        assert!(handle.apply_profile(EffectProfile::Podcast));
        assert_eq!(handle.shared.store.sequence(), before + 2);
        assert_eq!(handle.param(ParamId::Clarity), 0.7);
        assert_eq!(handle.param(ParamId::VolumeLeveler), 0.6);
        assert_eq!(handle.equalizer_band(4), Some(0.5));
        assert_eq!(handle.active_preset().as_str(), "Vocal");
        assert_eq!(handle.active_profile(), EffectProfile::Podcast);
    }

    #[test]
    fn reset_all_restores_defaults() {
        let (_engine, handle) = engine();
        handle.create(1).unwrap();
        handle.apply_profile(EffectProfile::Movie);
        handle.set_reverb(4, 0.6);
        handle.set_volume(0.3);
        handle.reset_all();
        assert_eq!(handle.settings(), EffectSettings::default());
    }

    #[test]
    fn reverb_and_headphone_ids_clamp() {
        let (_engine, handle) = engine();
        handle.create(1).unwrap();
        handle.set_reverb(42, 2.0);
        handle.set_headphone_type(-3);
        assert_eq!(handle.param(ParamId::ReverbPreset), 6.0);
        assert_eq!(handle.param(ParamId::ReverbWetness), 1.0);
        assert_eq!(handle.param(ParamId::HeadphoneType), 0.0);
    }

    #[test]
    fn unbound_engine_passes_through() {
        let (mut engine, handle) = engine();
        handle.set_volume(0.0);
        let mut buffer = AudioBuffer::from_channels(vec![vec![0.5; 64]; 2], 48000).unwrap();
        engine.process(&mut buffer);
        assert!(buffer.channel(1).unwrap().iter().all(|&s| s == 0.5));
        assert!(!engine.is_active());
    }
}
