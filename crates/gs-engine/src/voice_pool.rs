//! VoicePool: the melodic voice set, keyed by pitch.
//!
//! Owned by the render engine. Every mutation arrives through the command
//! queue, so nothing here is shared across threads.

use gs_ir::{EnvelopeMode, PitchKey, SynthParams};
use heapless::Vec;

use crate::voice::Voice;

/// Maximum number of simultaneous synth voices.
pub const MAX_VOICES: usize = 64;

/// What `note_on` does for a key whose voice is still held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RetriggerPolicy {
    /// Leave the sounding voice alone.
    #[default]
    Ignore,
    /// Reset phase and envelope.
    Retrigger,
}

/// Fixed-capacity set of sounding voices, at most one per [`PitchKey`].
pub struct VoicePool {
    voices: Vec<Voice, MAX_VOICES>,
    policy: RetriggerPolicy,
    sample_rate: u32,
    next_age: u64,
}

impl VoicePool {
    pub fn new(sample_rate: u32, policy: RetriggerPolicy) -> Self {
        Self { voices: Vec::new(), policy, sample_rate, next_age: 0 }
    }

    pub fn policy(&self) -> RetriggerPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: RetriggerPolicy) {
        self.policy = policy;
    }

    /// Start (or restart) the voice for `key`.
    ///
    /// A held voice follows the retrigger policy. A voice already releasing
    /// (or finished but not yet reaped) is re-attacked in place, keeping its
    /// phase. A new voice steals a slot when the pool is full.
    pub fn note_on(&mut self, key: PitchKey, frequency: f32, mode: EnvelopeMode, params: &SynthParams) {
        let age = self.bump_age();
        let sample_rate = self.sample_rate;
        if let Some(voice) = self.voices.iter_mut().find(|v| v.key == key) {
            if voice.is_held() {
                match self.policy {
                    RetriggerPolicy::Ignore => return,
                    RetriggerPolicy::Retrigger => voice.retrigger(mode, params, sample_rate),
                }
            } else {
                voice.reattack(mode, params);
            }
            voice.age = age;
            return;
        }

        let voice = Voice::new(key, frequency, mode, params, sample_rate, age);
        if let Err(voice) = self.voices.push(voice) {
            let victim = self.find_steal_candidate();
            self.voices[victim] = voice;
        }
    }

    /// Move the voice for `key` into Release. No-op if it is not held.
    pub fn note_off(&mut self, key: PitchKey) {
        if let Some(voice) = self.voices.iter_mut().find(|v| v.key == key) {
            voice.note_off();
        }
    }

    /// Release every voice, or drop them all at once when `immediate`.
    pub fn all_notes_off(&mut self, immediate: bool) {
        if immediate {
            self.voices.clear();
        } else {
            self.voices.iter_mut().for_each(Voice::note_off);
        }
    }

    /// Oldest releasing voice, else the oldest voice.
    fn find_steal_candidate(&self) -> usize {
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| (v.is_held(), v.age))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn bump_age(&mut self) -> u64 {
        let age = self.next_age;
        self.next_age = self.next_age.wrapping_add(1);
        age
    }

    /// Drop voices whose envelope has finished.
    pub fn reap_finished(&mut self) {
        self.voices.retain(|v| !v.is_done());
    }

    /// Sum of all voices for one frame, before effects.
    #[inline]
    pub fn next_sample(&mut self, params: &SynthParams, dt: f64) -> f32 {
        self.voices.iter_mut().map(|v| v.next_sample(params, dt)).sum()
    }

    pub fn get(&self, key: PitchKey) -> Option<&Voice> {
        self.voices.iter().find(|v| v.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter()
    }

    /// Count of voices in the set, finished ones included until reaped.
    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope_state::EnvelopeStage;
    use gs_ir::Adsr;

    const SR: u32 = 1000;
    const DT: f64 = 1.0 / SR as f64;

    fn params() -> SynthParams {
        SynthParams { envelope: Some(Adsr::new(0.01, 0.0, 1.0, 0.05)), ..SynthParams::default() }
    }

    fn note_on(pool: &mut VoicePool, key: u8) {
        let key = PitchKey(key);
        pool.note_on(key, key.frequency(), EnvelopeMode::Hold, &params());
    }

    fn run(pool: &mut VoicePool, frames: usize) {
        let p = params();
        for _ in 0..frames {
            pool.next_sample(&p, DT);
        }
    }

    #[test]
    fn note_on_allocates_once_per_key() {
        let mut pool = VoicePool::new(SR, RetriggerPolicy::Ignore);
        note_on(&mut pool, 12);
        note_on(&mut pool, 12);
        assert_eq!(pool.active_count(), 1);
        note_on(&mut pool, 13);
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn ignore_policy_keeps_phase() {
        let mut pool = VoicePool::new(SR, RetriggerPolicy::Ignore);
        note_on(&mut pool, 12);
        run(&mut pool, 7);
        let phase = pool.get(PitchKey(12)).unwrap().primary.phase;
        note_on(&mut pool, 12);
        assert_eq!(pool.get(PitchKey(12)).unwrap().primary.phase, phase);
    }

    #[test]
    fn retrigger_policy_resets_phase() {
        let mut pool = VoicePool::new(SR, RetriggerPolicy::Retrigger);
        note_on(&mut pool, 12);
        run(&mut pool, 7);
        note_on(&mut pool, 12);
        let voice = pool.get(PitchKey(12)).unwrap();
        assert_eq!(voice.primary.phase, 0.0);
        assert_eq!(voice.envelope.stage(), EnvelopeStage::Attack);
    }

    #[test]
    fn note_off_releases_then_reaps() {
        let mut pool = VoicePool::new(SR, RetriggerPolicy::Ignore);
        note_on(&mut pool, 5);
        run(&mut pool, 20);
        pool.note_off(PitchKey(5));
        assert_eq!(pool.get(PitchKey(5)).unwrap().envelope.stage(), EnvelopeStage::Release);
        run(&mut pool, 60);
        assert_eq!(pool.active_count(), 1);
        pool.reap_finished();
        assert!(pool.is_empty());
    }

    #[test]
    fn note_off_unknown_key_is_noop() {
        let mut pool = VoicePool::new(SR, RetriggerPolicy::Ignore);
        note_on(&mut pool, 5);
        pool.note_off(PitchKey(6));
        assert!(pool.get(PitchKey(5)).unwrap().is_held());
    }

    #[test]
    fn note_on_while_releasing_reattacks() {
        let mut pool = VoicePool::new(SR, RetriggerPolicy::Ignore);
        note_on(&mut pool, 5);
        run(&mut pool, 20);
        pool.note_off(PitchKey(5));
        run(&mut pool, 10);
        note_on(&mut pool, 5);
        assert_eq!(pool.active_count(), 1);
        assert!(pool.get(PitchKey(5)).unwrap().is_held());
    }

    #[test]
    fn all_notes_off_immediate_empties_pool() {
        let mut pool = VoicePool::new(SR, RetriggerPolicy::Ignore);
        for k in 0..10 {
            note_on(&mut pool, k);
        }
        pool.all_notes_off(true);
        assert!(pool.is_empty());
    }

    #[test]
    fn all_notes_off_releases_everything() {
        let mut pool = VoicePool::new(SR, RetriggerPolicy::Ignore);
        for k in 0..4 {
            note_on(&mut pool, k);
        }
        pool.all_notes_off(false);
        assert!(pool.iter().all(|v| !v.is_held()));
    }

    #[test]
    fn full_pool_steals_oldest_releasing_voice() {
        let mut pool = VoicePool::new(SR, RetriggerPolicy::Ignore);
        for k in 0..MAX_VOICES as u8 {
            note_on(&mut pool, k);
        }
        pool.note_off(PitchKey(40));
        pool.note_off(PitchKey(41));
        note_on(&mut pool, 100);
        assert_eq!(pool.active_count(), MAX_VOICES);
        assert!(pool.get(PitchKey(40)).is_none());
        assert!(pool.get(PitchKey(41)).is_some());
        assert!(pool.get(PitchKey(100)).is_some());
    }

    #[test]
    fn full_pool_steals_oldest_when_all_held() {
        let mut pool = VoicePool::new(SR, RetriggerPolicy::Ignore);
        for k in 0..MAX_VOICES as u8 {
            note_on(&mut pool, k);
        }
        note_on(&mut pool, 100);
        assert!(pool.get(PitchKey(0)).is_none());
        assert!(pool.get(PitchKey(1)).is_some());
    }
}
