//! Synthesized drum patches.

use serde::{Deserialize, Serialize};

use crate::adsr::Adsr;
use crate::waveform::Waveform;

/// Parameters of one synthesized drum hit.
///
/// A hit is `(oscillator + noise * white) * envelope`, where the envelope
/// always runs in one-shot mode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrumPatch {
    /// Oscillator frequency in Hz.
    pub frequency: f32,
    pub waveform: Waveform,
    /// White-noise mix in `[0, 1]`.
    pub noise: f32,
    pub envelope: Adsr,
}

impl DrumPatch {
    pub const KICK: DrumPatch = DrumPatch {
        frequency: 120.0,
        waveform: Waveform::Square,
        noise: 0.1,
        envelope: Adsr { attack: 0.01, decay: 0.1, sustain: 0.8, release: 0.1 },
    };

    /// Tone selector is `"noise"`, which resolves to silence: the hit is pure noise.
    pub const SNARE: DrumPatch = DrumPatch {
        frequency: 300.0,
        waveform: Waveform::Silent,
        noise: 0.6,
        envelope: Adsr { attack: 0.005, decay: 0.1, sustain: 0.4, release: 0.05 },
    };

    pub const HI_HAT: DrumPatch = DrumPatch {
        frequency: 8000.0,
        waveform: Waveform::Square,
        noise: 0.9,
        envelope: Adsr { attack: 0.001, decay: 0.05, sustain: 0.3, release: 0.02 },
    };

    pub const CLAP: DrumPatch = DrumPatch {
        frequency: 600.0,
        waveform: Waveform::Silent,
        noise: 1.0,
        envelope: Adsr { attack: 0.005, decay: 0.08, sustain: 0.3, release: 0.1 },
    };

    pub const PERCUSSION: DrumPatch = DrumPatch {
        frequency: 200.0,
        waveform: Waveform::Triangle,
        noise: 0.2,
        envelope: Adsr { attack: 0.01, decay: 0.15, sustain: 0.5, release: 0.1 },
    };

    /// Built-in patches by name, in default kit order.
    pub const BUILTIN: [(&'static str, DrumPatch); 5] = [
        ("kick", Self::KICK),
        ("snare", Self::SNARE),
        ("hihat", Self::HI_HAT),
        ("clap", Self::CLAP),
        ("percussion", Self::PERCUSSION),
    ];

    /// Look up a built-in patch (case-insensitive).
    pub fn by_name(name: &str) -> Option<Self> {
        Self::BUILTIN
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, p)| p)
    }

    /// Length of the hit in seconds.
    pub fn duration(&self) -> f32 {
        self.envelope.one_shot_duration()
    }
}
