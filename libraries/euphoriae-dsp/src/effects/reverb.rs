//! Algorithmic reverb
//!
//! Schroeder/Moorer topology in the Freeverb arrangement: eight damped
//! feedback combs in parallel feeding four series all-pass diffusers, one bank
//! per channel with the right bank's delays offset by a fixed stereo spread.
//! An early-reflection section taps the pre-delayed input ahead of the tail.
//!
//! Comb feedback comes from each preset's decay time: a comb of `d` samples
//! needs `g = 10^(-3d / (T60 * sr))` to fall 60 dB in `T60` seconds.
//!
//! Preset [`ReverbPreset::None`] or zero wetness bypasses the module exactly.

use super::effect::AudioEffect;
use crate::filters::DelayLine;

/// Comb lengths in samples at 44.1 kHz
const COMB_TUNING: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// All-pass lengths in samples at 44.1 kHz
const ALLPASS_TUNING: [usize; 4] = [556, 441, 341, 225];

/// Extra delay on the right bank (samples at 44.1 kHz)
const STEREO_SPREAD: usize = 23;

const TUNING_RATE: f32 = 44100.0;
const INPUT_GAIN: f32 = 0.015;
const WET_SCALE: f32 = 3.0;
const ALLPASS_FEEDBACK: f32 = 0.5;

/// Early reflection tap times (ms) before size scaling
const EARLY_TAPS_MS: [f32; 6] = [7.0, 11.0, 17.0, 23.0, 29.0, 37.0];
const EARLY_TAP_GAINS: [f32; 6] = [0.9, 0.75, 0.6, 0.5, 0.4, 0.3];

/// Largest size scale of any preset
const MAX_SIZE_SCALE: f32 = 1.5;
const MAX_PREDELAY_MS: f32 = 30.0;

/// Reverb presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReverbPreset {
    #[default]
    None,
    SmallRoom,
    MediumRoom,
    LargeRoom,
    MediumHall,
    LargeHall,
    Plate,
}

/// Acoustic parameters behind a preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbCharacter {
    /// Multiplier on every delay length
    pub size_scale: f32,
    /// Time for the tail to fall 60 dB (s)
    pub decay_s: f32,
    /// High-frequency damping in the comb loops (0..1)
    pub damping: f32,
    pub predelay_ms: f32,
    /// Early reflection share of the wet signal
    pub early_level: f32,
    /// Tail share of the wet signal
    pub late_level: f32,
}

impl ReverbPreset {
    pub const ALL: [Self; 7] = [
        Self::None,
        Self::SmallRoom,
        Self::MediumRoom,
        Self::LargeRoom,
        Self::MediumHall,
        Self::LargeHall,
        Self::Plate,
    ];

    pub fn id(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::SmallRoom => 1,
            Self::MediumRoom => 2,
            Self::LargeRoom => 3,
            Self::MediumHall => 4,
            Self::LargeHall => 5,
            Self::Plate => 6,
        }
    }

    /// Preset for an id, clamping out-of-range values
    pub fn from_id(id: i64) -> Self {
        Self::ALL[id.clamp(0, 6) as usize]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::SmallRoom => "Small Room",
            Self::MediumRoom => "Medium Room",
            Self::LargeRoom => "Large Room",
            Self::MediumHall => "Medium Hall",
            Self::LargeHall => "Large Hall",
            Self::Plate => "Plate",
        }
    }

    /// `None` has no character: it bypasses
    pub fn character(&self) -> Option<ReverbCharacter> {
        let (size_scale, decay_s, damping, predelay_ms, early_level, late_level) = match self {
            Self::None => return None,
            Self::SmallRoom => (0.6, 0.5, 0.5, 5.0, 0.6, 0.4),
            Self::MediumRoom => (0.8, 0.9, 0.45, 10.0, 0.5, 0.5),
            Self::LargeRoom => (1.0, 1.4, 0.4, 15.0, 0.45, 0.55),
            Self::MediumHall => (1.2, 2.0, 0.35, 20.0, 0.35, 0.65),
            Self::LargeHall => (1.5, 3.2, 0.3, 30.0, 0.3, 0.7),
            Self::Plate => (0.7, 1.8, 0.1, 0.0, 0.1, 0.9),
        };
        Some(ReverbCharacter {
            size_scale,
            decay_s,
            damping,
            predelay_ms,
            early_level,
            late_level,
        })
    }
}

/// Lowpass-feedback comb
#[derive(Debug, Clone)]
struct Comb {
    buffer: Vec<f32>,
    len: usize,
    pos: usize,
    store: f32,
    feedback: f32,
    damping: f32,
}

impl Comb {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            len: 1,
            pos: 0,
            store: 0.0,
            feedback: 0.0,
            damping: 0.0,
        }
    }

    fn configure(&mut self, len: usize, feedback: f32, damping: f32) {
        self.len = len.clamp(1, self.buffer.len());
        self.pos = 0;
        self.feedback = feedback;
        self.damping = damping;
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.pos];
        self.store = output * (1.0 - self.damping) + self.store * self.damping;
        if self.store.abs() < 1e-15 {
            self.store = 0.0;
        }
        self.buffer[self.pos] = input + self.store * self.feedback;
        self.pos += 1;
        if self.pos >= self.len {
            self.pos = 0;
        }
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.store = 0.0;
        self.pos = 0;
    }
}

/// Schroeder all-pass diffuser
#[derive(Debug, Clone)]
struct AllPass {
    buffer: Vec<f32>,
    len: usize,
    pos: usize,
}

impl AllPass {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            len: 1,
            pos: 0,
        }
    }

    fn configure(&mut self, len: usize) {
        self.len = len.clamp(1, self.buffer.len());
        self.pos = 0;
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];
        self.buffer[self.pos] = input + delayed * ALLPASS_FEEDBACK;
        self.pos += 1;
        if self.pos >= self.len {
            self.pos = 0;
        }
        delayed - input
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}

/// One channel's tail
#[derive(Debug, Clone)]
struct Tank {
    combs: Vec<Comb>,
    allpasses: Vec<AllPass>,
}

impl Tank {
    fn new(max_scale: f32) -> Self {
        let capacity = |len: usize| ((len + STEREO_SPREAD) as f32 * max_scale).ceil() as usize + 1;
        Self {
            combs: COMB_TUNING.iter().map(|&len| Comb::new(capacity(len))).collect(),
            allpasses: ALLPASS_TUNING
                .iter()
                .map(|&len| AllPass::new(capacity(len)))
                .collect(),
        }
    }

    fn configure(&mut self, scale: f32, offset: usize, sample_rate: u32, character: &ReverbCharacter) {
        for (comb, &len) in self.combs.iter_mut().zip(&COMB_TUNING) {
            let samples = ((len + offset) as f32 * scale).round().max(1.0);
            let feedback = 10.0_f32.powf(-3.0 * samples / (character.decay_s * sample_rate as f32));
            comb.configure(samples as usize, feedback.min(0.98), character.damping);
        }
        for (allpass, &len) in self.allpasses.iter_mut().zip(&ALLPASS_TUNING) {
            allpass.configure(((len + offset) as f32 * scale).round().max(1.0) as usize);
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut out = 0.0;
        for comb in &mut self.combs {
            out += comb.process(input);
        }
        for allpass in &mut self.allpasses {
            out = allpass.process(out);
        }
        out
    }

    fn clear(&mut self) {
        self.combs.iter_mut().for_each(Comb::clear);
        self.allpasses.iter_mut().for_each(AllPass::clear);
    }
}

/// Preset-driven stereo reverb
pub struct Reverb {
    preset: ReverbPreset,
    character: Option<ReverbCharacter>,
    wetness: f32,

    tank_l: Tank,
    tank_r: Tank,
    predelay: DelayLine,
    predelay_samples: usize,
    early_taps: [usize; 6],

    max_sample_rate: u32,
    enabled: bool,
    sample_rate: u32,
    needs_update: bool,
}

impl Reverb {
    /// Create a reverb whose delay lines fit any rate up to `max_sample_rate`
    pub fn new(max_sample_rate: u32) -> Self {
        let max_sample_rate = max_sample_rate.max(8000);
        let max_scale = MAX_SIZE_SCALE * max_sample_rate as f32 / TUNING_RATE;
        let longest_ms = MAX_PREDELAY_MS + EARLY_TAPS_MS[5] * MAX_SIZE_SCALE;
        Self {
            preset: ReverbPreset::None,
            character: None,
            wetness: 0.0,
            tank_l: Tank::new(max_scale),
            tank_r: Tank::new(max_scale),
            predelay: DelayLine::new(DelayLine::capacity_for(longest_ms, max_sample_rate)),
            predelay_samples: 0,
            early_taps: [0; 6],
            max_sample_rate,
            enabled: true,
            sample_rate: 44100,
            needs_update: true,
        }
    }

    /// Switch preset; every delay line is cleared
    pub fn set_preset(&mut self, preset: ReverbPreset) {
        if preset != self.preset {
            self.preset = preset;
            self.character = preset.character();
            self.needs_update = true;
            self.reset();
        }
    }

    pub fn preset(&self) -> ReverbPreset {
        self.preset
    }

    /// Wet mix in [0, 1]
    pub fn set_wetness(&mut self, wetness: f32) {
        self.wetness = wetness.clamp(0.0, 1.0);
    }

    pub fn wetness(&self) -> f32 {
        self.wetness
    }

    /// Whether processing changes the signal at all
    pub fn is_active(&self) -> bool {
        self.enabled && self.character.is_some() && self.wetness > 0.0
    }

    fn update_parameters(&mut self) {
        if !self.needs_update {
            return;
        }
        let Some(character) = self.character else {
            self.needs_update = false;
            return;
        };
        let sr = self.sample_rate.min(self.max_sample_rate);
        let scale = character.size_scale * sr as f32 / TUNING_RATE;
        self.tank_l.configure(scale, 0, sr, &character);
        self.tank_r.configure(scale, STEREO_SPREAD, sr, &character);

        let per_ms = sr as f32 / 1000.0;
        let max_delay = self.predelay.max_delay();
        self.predelay_samples = ((character.predelay_ms * per_ms) as usize).min(max_delay);
        for (tap, ms) in self.early_taps.iter_mut().zip(EARLY_TAPS_MS) {
            let samples = ((character.predelay_ms + ms * character.size_scale) * per_ms) as usize;
            *tap = samples.min(max_delay);
        }
        self.needs_update = false;
    }
}

impl AudioEffect for Reverb {
    fn process(&mut self, left: &mut [f32], right: &mut [f32], sample_rate: u32) {
        if !self.is_active() {
            return;
        }
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.needs_update = true;
            self.reset();
        }
        self.update_parameters();
        let Some(character) = self.character else {
            return;
        };

        let w = self.wetness;
        let dry_gain = 1.0 - 0.5 * w;
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let input = (*l + *r) * INPUT_GAIN;
            self.predelay.write(input);
            let late_in = self.predelay.read(self.predelay_samples);

            let mut early_l = 0.0;
            let mut early_r = 0.0;
            for (i, (&tap, &gain)) in self.early_taps.iter().zip(&EARLY_TAP_GAINS).enumerate() {
                let value = self.predelay.read(tap) * gain;
                if i % 2 == 0 {
                    early_l += value;
                } else {
                    early_r += value;
                }
            }

            let late_l = self.tank_l.process(late_in);
            let late_r = self.tank_r.process(late_in);

            let wet_l = WET_SCALE * (character.early_level * early_l + character.late_level * late_l);
            let wet_r = WET_SCALE * (character.early_level * early_r + character.late_level * late_r);

            *l = *l * dry_gain + wet_l * w;
            *r = *r * dry_gain + wet_r * w;
        }
    }

    fn reset(&mut self) {
        self.tank_l.clear();
        self.tank_r.clear();
        self.predelay.clear();
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Reverb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::generate_sine;

    const SR: u32 = 48000;

    #[test]
    fn preset_ids_round_trip() {
        for preset in ReverbPreset::ALL {
            assert_eq!(ReverbPreset::from_id(i64::from(preset.id())), preset);
        }
        assert_eq!(ReverbPreset::from_id(42), ReverbPreset::Plate);
        assert!(ReverbPreset::None.character().is_none());
    }

    #[test]
    fn preset_none_bypasses_at_any_wetness() {
        let mut reverb = Reverb::new(SR);
        reverb.set_wetness(1.0);
        let input = generate_sine(440.0, SR, 0.1, 0.5);
        let mut left = input.clone();
        let mut right = input.clone();
        reverb.process(&mut left, &mut right, SR);
        assert_eq!(left, input);
        assert_eq!(right, input);
    }

    #[test]
    fn zero_wetness_bypasses() {
        let mut reverb = Reverb::new(SR);
        reverb.set_preset(ReverbPreset::LargeHall);
        let input = generate_sine(440.0, SR, 0.1, 0.5);
        let mut left = input.clone();
        let mut right = input.clone();
        reverb.process(&mut left, &mut right, SR);
        assert_eq!(left, input);
    }

    #[test]
    fn impulse_produces_decaying_tail() {
        let mut reverb = Reverb::new(SR);
        reverb.set_preset(ReverbPreset::MediumHall);
        reverb.set_wetness(1.0);

        let frames = SR as usize * 2;
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        left[0] = 1.0;
        right[0] = 1.0;
        reverb.process(&mut left, &mut right, SR);

        let energy = |s: &[f32]| s.iter().map(|x| x * x).sum::<f32>();
        let early = energy(&left[1000..10000]);
        let late = energy(&left[80000..89000]);
        assert!(early > 0.0);
        assert!(late < early, "tail should decay: {early} -> {late}");
        assert!(left.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn longer_presets_ring_longer() {
        let tail = |preset: ReverbPreset| {
            let mut reverb = Reverb::new(SR);
            reverb.set_preset(preset);
            reverb.set_wetness(1.0);
            let mut left = vec![0.0; SR as usize];
            let mut right = vec![0.0; SR as usize];
            left[0] = 1.0;
            reverb.process(&mut left, &mut right, SR);
            left[36000..].iter().map(|x| x * x).sum::<f32>()
        };
        assert!(tail(ReverbPreset::LargeHall) > tail(ReverbPreset::SmallRoom));
    }

    #[test]
    fn preset_switch_clears_tail() {
        let mut reverb = Reverb::new(SR);
        reverb.set_preset(ReverbPreset::LargeHall);
        reverb.set_wetness(1.0);
        let mut left = vec![0.5; 4800];
        let mut right = vec![0.5; 4800];
        reverb.process(&mut left, &mut right, SR);

        reverb.set_preset(ReverbPreset::SmallRoom);
        let mut left = vec![0.0; 64];
        let mut right = vec![0.0; 64];
        reverb.process(&mut left, &mut right, SR);
        assert!(left.iter().all(|&s| s == 0.0));
    }
}
