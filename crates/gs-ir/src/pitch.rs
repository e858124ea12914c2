//! Pitch identifiers and the row-to-frequency mapping.
//!
//! Voices are keyed by an integer semitone offset from C1, never by
//! frequency. Frequency is derived from the key only when a voice is
//! synthesized.

use core::fmt;

/// Frequency of C1 in Hz, the base of every pitch key.
pub const C1_FREQUENCY: f32 = 32.703;

/// Octave number of pitch key 0.
const BASE_OCTAVE: u8 = 1;

const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Semitone offset from C1 (0 = C1, 12 = C2, ...).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PitchKey(pub u8);

impl PitchKey {
    /// Create a key from octave (1 = C1 octave) and semitone (0-11).
    ///
    /// Returns `None` for octaves below 1 or keys that would not fit in a `u8`.
    pub fn from_octave_semitone(octave: u8, semitone: u8) -> Option<Self> {
        if octave < BASE_OCTAVE || semitone > 11 {
            return None;
        }
        let index = (octave - BASE_OCTAVE) as u16 * 12 + semitone as u16;
        u8::try_from(index).ok().map(PitchKey)
    }

    /// Semitone offset from C1.
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Frequency in Hz: `32.703 * 2^(index / 12)`.
    pub fn frequency(self) -> f32 {
        frequency_for_index(self.0 as f32)
    }

    /// Octave number in scientific notation (key 0 is octave 1).
    pub const fn octave(self) -> u8 {
        self.0 / 12 + BASE_OCTAVE
    }

    /// Semitone within the octave (0 = C).
    pub const fn semitone(self) -> u8 {
        self.0 % 12
    }

    /// Whether this pitch falls on a black piano key.
    pub const fn is_black_key(self) -> bool {
        matches!(self.semitone(), 1 | 3 | 6 | 8 | 10)
    }

    /// Shift by a signed number of semitones, `None` when out of range.
    pub fn transpose(self, semitones: i16) -> Option<Self> {
        let shifted = self.0 as i16 + semitones;
        u8::try_from(shifted).ok().map(PitchKey)
    }
}

impl fmt::Display for PitchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PITCH_NAMES[self.semitone() as usize], self.octave())
    }
}

/// `32.703 * 2^(index / 12)` for a (possibly fractional) semitone index.
pub fn frequency_for_index(index: f32) -> f32 {
    C1_FREQUENCY * libm::powf(2.0, index / 12.0)
}
