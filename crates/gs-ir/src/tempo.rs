//! Tempo and step timing.
//!
//! One step is a sixteenth note: the grid advances four steps per beat.

/// Steps per beat (sixteenth-note grid).
pub const STEPS_PER_BEAT: f32 = 4.0;

/// Tempo used when nothing else is known.
pub const DEFAULT_BPM: f32 = 120.0;

/// Seconds between two step boundaries: `60 / (bpm * 4)`.
pub fn step_interval_secs(bpm: f32) -> f32 {
    60.0 / (bpm * STEPS_PER_BEAT)
}

/// A validated tempo: finite and strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Bpm(f32);

impl Bpm {
    /// Validate a raw tempo value.
    pub fn new(bpm: f32) -> Option<Self> {
        if bpm.is_finite() && bpm > 0.0 {
            Some(Self(bpm))
        } else {
            None
        }
    }

    /// The raw value in beats per minute.
    pub const fn get(self) -> f32 {
        self.0
    }

    /// Seconds per step at this tempo.
    pub fn step_interval_secs(self) -> f32 {
        step_interval_secs(self.0)
    }

    /// Step length in whole frames at `sample_rate`, at least one frame.
    pub fn frames_per_step(self, sample_rate: u32) -> u32 {
        let frames = libm::roundf(self.step_interval_secs() * sample_rate as f32);
        (frames as u32).max(1)
    }
}

impl Default for Bpm {
    fn default() -> Self {
        Self(DEFAULT_BPM)
    }
}
