//! ADSR envelope parameters.

use serde::{Deserialize, Serialize};

/// Attack/decay/release times in seconds plus a sustain level in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    /// Short gate used by presets that do not define their own envelope.
    /// Long enough to avoid clicks on note boundaries, short enough to feel instant.
    pub const GATE: Adsr = Adsr {
        attack: 0.005,
        decay: 0.0,
        sustain: 1.0,
        release: 0.02,
    };

    /// Build an envelope, sanitising every field.
    ///
    /// Negative or non-finite times become 0 and the sustain level is
    /// clamped to `[0, 1]`.
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: sanitize_time(attack),
            decay: sanitize_time(decay),
            sustain: if sustain.is_nan() { 0.0 } else { sustain.clamp(0.0, 1.0) },
            release: sanitize_time(release),
        }
    }

    /// Re-run the field checks of [`Adsr::new`] (for values read from config).
    pub fn sanitized(self) -> Self {
        Self::new(self.attack, self.decay, self.sustain, self.release)
    }

    /// Total length of a one-shot envelope: attack + decay + release.
    pub fn one_shot_duration(&self) -> f32 {
        self.attack + self.decay + self.release
    }
}

impl Default for Adsr {
    fn default() -> Self {
        Self::GATE
    }
}

fn sanitize_time(t: f32) -> f32 {
    if t.is_finite() && t > 0.0 {
        t
    } else {
        0.0
    }
}

/// How a voice's envelope ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeMode {
    /// Holds at the sustain level until note-off.
    #[default]
    Hold,
    /// Releases automatically after attack + decay; no sustain plateau.
    OneShot,
}
