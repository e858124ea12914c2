//! Oscillator waveform selector.

use serde::{Deserialize, Serialize};

/// Which shape an oscillator produces.
///
/// Unknown names resolve to [`Waveform::Silent`], which renders zeros.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    #[default]
    Triangle,
    Sawtooth,
    /// Anything unrecognised. Produces silence.
    #[serde(other)]
    Silent,
}

impl Waveform {
    /// Resolve a waveform by (case-insensitive) name.
    ///
    /// Returns [`Waveform::Silent`] for unknown names, including `"noise"`:
    /// noise is mixed separately by drum patches, not by the oscillator.
    pub fn from_name(name: &str) -> Self {
        const NAMES: [(&str, Waveform); 5] = [
            ("sine", Waveform::Sine),
            ("square", Waveform::Square),
            ("triangle", Waveform::Triangle),
            ("sawtooth", Waveform::Sawtooth),
            ("saw", Waveform::Sawtooth),
        ];
        NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
            .map_or(Waveform::Silent, |&(_, w)| w)
    }

    /// True if `name` maps to an audible waveform.
    pub fn is_known(name: &str) -> bool {
        Self::from_name(name) != Waveform::Silent
    }

    /// Lowercase display name.
    pub const fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Silent => "silent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(Waveform::from_name("Sine"), Waveform::Sine);
        assert_eq!(Waveform::from_name("SQUARE"), Waveform::Square);
        assert_eq!(Waveform::from_name(" triangle "), Waveform::Triangle);
        assert_eq!(Waveform::from_name("saw"), Waveform::Sawtooth);
    }

    #[test]
    fn unknown_is_silent() {
        assert_eq!(Waveform::from_name("noise"), Waveform::Silent);
        assert_eq!(Waveform::from_name(""), Waveform::Silent);
        assert!(!Waveform::is_known("wobble"));
    }

    #[cfg(feature = "std")]
    #[test]
    fn serde_unknown_falls_back_to_silent() {
        let w: Waveform = serde_json::from_str("\"sawtooth\"").unwrap();
        assert_eq!(w, Waveform::Sawtooth);
        let w: Waveform = serde_json::from_str("\"noise\"").unwrap();
        assert_eq!(w, Waveform::Silent);
    }
}
