//! Lock-free parameter store
//!
//! One `AtomicU32` per parameter holds the f32 bits, guarded by a sequence
//! counter. Writers are serialized by a mutex that only the control side ever
//! takes. The audio thread reads with a bounded number of attempts and keeps
//! its previous snapshot when a writer is mid-update, so it never blocks.
//!
//! Sequence protocol: the counter is odd while a write is in progress. A read
//! is consistent when it sees the same even value before and after copying.

use std::hint;
use std::sync::atomic::{fence, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::params::{default_values, ParamId, PARAM_COUNT};

/// Attempts before a reader gives up and keeps its previous snapshot
const READ_ATTEMPTS: usize = 4;

/// Consistent copy of every parameter value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    values: [f32; PARAM_COUNT],
}

impl ParamSnapshot {
    pub fn defaults() -> Self {
        Self {
            values: default_values(),
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()]
    }

    /// Switch parameters
    #[inline]
    pub fn flag(&self, id: ParamId) -> bool {
        self.get(id) >= 0.5
    }

    /// Clamped write; NaN is ignored
    pub fn set(&mut self, id: ParamId, value: f32) {
        if let Some(value) = id.spec().clamp(value) {
            self.values[id.index()] = value;
        }
    }

    pub fn values(&self) -> &[f32; PARAM_COUNT] {
        &self.values
    }
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Thread-safe holder of every parameter's target value
pub struct ParamStore {
    values: [AtomicU32; PARAM_COUNT],
    sequence: AtomicU64,
    writer: Mutex<()>,
}

impl ParamStore {
    /// Store holding every default
    pub fn new() -> Self {
        let defaults = default_values();
        Self {
            values: std::array::from_fn(|i| AtomicU32::new(defaults[i].to_bits())),
            sequence: AtomicU64::new(0),
            writer: Mutex::new(()),
        }
    }

    /// Last stored value (the target, not necessarily what is audible)
    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id.index()].load(Ordering::Relaxed))
    }

    /// Clamp and store one value, returning what was stored
    ///
    /// NaN leaves the parameter untouched and returns its current value.
    pub fn set(&self, id: ParamId, value: f32) -> f32 {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        match id.spec().clamp(value) {
            Some(value) => {
                self.write_locked(&[(id, value)]);
                value
            }
            None => self.get(id),
        }
    }

    /// Store several values as one update
    ///
    /// Readers see either none or all of them.
    pub fn set_many(&self, writes: &[(ParamId, f32)]) {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_locked(writes);
    }

    /// Replace every value with the snapshot's, as one update
    pub fn store_snapshot(&self, snapshot: &ParamSnapshot) {
        let writes: Vec<(ParamId, f32)> = ParamId::ALL
            .iter()
            .map(|&id| (id, snapshot.get(id)))
            .collect();
        self.set_many(&writes);
    }

    /// Restore every default, as one update
    pub fn reset(&self) {
        self.store_snapshot(&ParamSnapshot::defaults());
    }

    fn write_locked(&self, writes: &[(ParamId, f32)]) {
        let sequence = self.sequence.load(Ordering::Relaxed);
        self.sequence.store(sequence.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        for &(id, value) in writes {
            if let Some(value) = id.spec().clamp(value) {
                self.values[id.index()].store(value.to_bits(), Ordering::Relaxed);
            }
        }

        self.sequence.store(sequence.wrapping_add(2), Ordering::Release);
    }

    /// Number of completed updates times two
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Copy every value into `snapshot` if the store changed since `seen`
    ///
    /// Never blocks. Returns true when `snapshot` was refreshed; `seen` is then
    /// updated to the sequence the copy belongs to. On contention the snapshot
    /// is left as it was and the read is retried on the next call.
    pub fn read_if_changed(&self, seen: &mut u64, snapshot: &mut ParamSnapshot) -> bool {
        for _ in 0..READ_ATTEMPTS {
            let before = self.sequence.load(Ordering::Acquire);
            if before == *seen {
                return false;
            }
            if before & 1 == 1 {
                hint::spin_loop();
                continue;
            }

            let mut values = [0.0; PARAM_COUNT];
            for (value, atomic) in values.iter_mut().zip(&self.values) {
                *value = f32::from_bits(atomic.load(Ordering::Relaxed));
            }

            fence(Ordering::Acquire);
            if self.sequence.load(Ordering::Relaxed) == before {
                snapshot.values = values;
                *seen = before;
                return true;
            }
        }
        false
    }

    /// Consistent copy of every value, waiting out concurrent writers
    ///
    /// Control side only.
    pub fn snapshot(&self) -> ParamSnapshot {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut snapshot = ParamSnapshot::defaults();
        for (value, atomic) in snapshot.values.iter_mut().zip(&self.values) {
            *value = f32::from_bits(atomic.load(Ordering::Relaxed));
        }
        snapshot
    }
}

impl Default for ParamStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn set_clamps_and_returns_stored_value() {
        let store = ParamStore::new();
        assert_eq!(store.set(ParamId::BassBoost, 1.7), 1.0);
        assert_eq!(store.get(ParamId::BassBoost), 1.0);
        assert_eq!(store.set(ParamId::StereoBalance, -3.0), -1.0);
        assert_eq!(store.set(ParamId::CrossfadeMs, 20000.0), 12000.0);
    }

    #[test]
    fn nan_is_ignored() {
        let store = ParamStore::new();
        store.set(ParamId::Clarity, 0.4);
        assert_eq!(store.set(ParamId::Clarity, f32::NAN), 0.4);
        assert_eq!(store.get(ParamId::Clarity), 0.4);
    }

    #[test]
    fn read_if_changed_tracks_sequence() {
        let store = ParamStore::new();
        let mut seen = store.sequence();
        let mut snapshot = ParamSnapshot::defaults();
        assert!(!store.read_if_changed(&mut seen, &mut snapshot));

        store.set(ParamId::Volume, 0.25);
        assert!(store.read_if_changed(&mut seen, &mut snapshot));
        assert_eq!(snapshot.get(ParamId::Volume), 0.25);
        assert!(!store.read_if_changed(&mut seen, &mut snapshot));
    }

    #[test]
    fn set_many_bumps_sequence_once() {
        let store = ParamStore::new();
        let before = store.sequence();
        store.set_many(&[(ParamId::EqBand0, 0.5), (ParamId::EqBand1, -0.5)]);
        assert_eq!(store.sequence(), before + 2);
    }

    #[test]
    fn reset_restores_defaults() {
        let store = ParamStore::new();
        store.set(ParamId::ChannelSeparation, 1.0);
        store.set(ParamId::Tempo, 2.0);
        store.reset();
        assert_eq!(store.snapshot(), ParamSnapshot::defaults());
    }

    #[test]
    fn readers_never_see_half_a_composite_write() {
        let store = Arc::new(ParamStore::new());
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..2000 {
                    let level = if i % 2 == 0 { 1.0 } else { -1.0 };
                    let writes: Vec<_> = ParamId::EQ_BANDS.iter().map(|&id| (id, level)).collect();
                    store.set_many(&writes);
                }
            })
        };

        let mut seen = store.sequence();
        let mut snapshot = ParamSnapshot::defaults();
        while !writer.is_finished() {
            if store.read_if_changed(&mut seen, &mut snapshot) {
                let first = snapshot.get(ParamId::EqBand0);
                assert!(ParamId::EQ_BANDS.iter().all(|&id| snapshot.get(id) == first));
            }
        }
        writer.join().unwrap();
    }
}
