//! Drum voice bank: one preallocated one-shot player per lane.

use std::sync::Arc;

use gs_ir::{DrumPatch, EnvelopeMode};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::envelope_state::EnvelopeState;
use crate::oscillator::Oscillator;

/// Default drum bus gain.
pub const DEFAULT_DRUM_VOLUME: f32 = 0.5;

/// Noise generator seed; fixed so offline renders are reproducible.
const NOISE_SEED: u64 = 0x6772_6964;

/// What a lane plays when triggered.
#[derive(Clone, Debug, PartialEq)]
pub enum DrumSound {
    /// `(tone + noise * white) * one-shot envelope`.
    Synth(DrumPatch),
    /// Mono sample frames at engine rate, played once from the start.
    Sample(Arc<[f32]>),
    /// Placeholder for a lane whose asset failed to load.
    Silent,
}

#[derive(Clone, Debug)]
struct Lane {
    sound: DrumSound,
    osc: Oscillator,
    envelope: EnvelopeState,
    position: usize,
    playing: bool,
}

impl Lane {
    fn new(sound: DrumSound, sample_rate: u32) -> Self {
        let (osc, envelope) = match &sound {
            DrumSound::Synth(patch) => (
                Oscillator::new(patch.frequency, sample_rate),
                EnvelopeState::new(patch.envelope, EnvelopeMode::OneShot),
            ),
            _ => (Oscillator::default(), EnvelopeState::new(Default::default(), EnvelopeMode::OneShot)),
        };
        Self { sound, osc, envelope, position: 0, playing: false }
    }

    fn restart(&mut self) {
        self.osc.phase = 0.0;
        self.envelope.retrigger();
        self.position = 0;
        self.playing = !matches!(self.sound, DrumSound::Silent);
    }

    #[inline]
    fn next_sample(&mut self, rng: &mut SmallRng, dt: f64) -> f32 {
        if !self.playing {
            return 0.0;
        }
        match &self.sound {
            DrumSound::Synth(patch) => {
                let tone = self.osc.next_sample(patch.waveform);
                let noise = rng.gen_range(-1.0f32..1.0) * patch.noise;
                let gain = self.envelope.level();
                self.envelope.advance(dt);
                if self.envelope.is_done() {
                    self.playing = false;
                }
                (tone + noise) * gain
            }
            DrumSound::Sample(frames) => match frames.get(self.position) {
                Some(&s) => {
                    self.position += 1;
                    s
                }
                None => {
                    self.playing = false;
                    0.0
                }
            },
            DrumSound::Silent => {
                self.playing = false;
                0.0
            }
        }
    }
}

/// Fixed set of drum lanes, one sound each.
///
/// Triggering restarts the lane; hits on the same lane never stack.
pub struct DrumBank {
    lanes: Vec<Lane>,
    volume: f32,
    rng: SmallRng,
}

impl DrumBank {
    /// Build the bank. All allocation happens here, never on the render path.
    pub fn new(sounds: impl IntoIterator<Item = DrumSound>, sample_rate: u32) -> Self {
        Self {
            lanes: sounds.into_iter().map(|s| Lane::new(s, sample_rate)).collect(),
            volume: DEFAULT_DRUM_VOLUME,
            rng: SmallRng::seed_from_u64(NOISE_SEED),
        }
    }

    /// The built-in five-piece synth kit.
    pub fn builtin(sample_rate: u32) -> Self {
        Self::new(DrumPatch::BUILTIN.iter().map(|&(_, p)| DrumSound::Synth(p)), sample_rate)
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Restart `lane` from the top. Returns false for an unknown lane.
    pub fn trigger(&mut self, lane: usize) -> bool {
        match self.lanes.get_mut(lane) {
            Some(l) => {
                l.restart();
                true
            }
            None => false,
        }
    }

    /// Cut every lane.
    pub fn stop_all(&mut self) {
        for lane in &mut self.lanes {
            lane.playing = false;
        }
    }

    pub fn is_playing(&self, lane: usize) -> bool {
        self.lanes.get(lane).is_some_and(|l| l.playing)
    }

    pub fn any_playing(&self) -> bool {
        self.lanes.iter().any(|l| l.playing)
    }

    pub fn sound(&self, lane: usize) -> Option<&DrumSound> {
        self.lanes.get(lane).map(|l| &l.sound)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_finite() {
            self.volume = volume.clamp(0.0, 1.0);
        }
    }

    /// Sum of all lanes for one frame, scaled by the bus volume.
    #[inline]
    pub fn next_sample(&mut self, dt: f64) -> f32 {
        let rng = &mut self.rng;
        let sum: f32 = self.lanes.iter_mut().map(|l| l.next_sample(rng, dt)).sum();
        sum * self.volume
    }
}
