//! Synth parameter sets and the built-in preset library.

use serde::{Deserialize, Serialize};

use crate::adsr::Adsr;
use crate::waveform::Waveform;

/// Everything the render engine needs to shape the melodic synth.
///
/// `Copy` so it can travel through the real-time command queue.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    /// Overall synth gain.
    pub master_volume: f32,
    /// Weight of the primary oscillator.
    pub osc1_volume: f32,
    /// Weight of the detuned secondary oscillator.
    pub osc2_volume: f32,
    /// Secondary oscillator runs at `frequency * (1 + detune)`.
    pub detune: f32,
    /// Pre-gain of the `tan` distortion stage.
    pub distortion: f32,
    /// One-pole low-pass coefficient in `(0, 1]`.
    pub cutoff: f32,
    /// Stored with the preset; the one-pole filter does not use it.
    pub resonance: f32,
    pub waveform: Waveform,
    /// Envelope override. `None` uses [`Adsr::GATE`].
    pub envelope: Option<Adsr>,
}

impl SynthParams {
    /// The envelope voices should use.
    pub fn adsr(&self) -> Adsr {
        self.envelope.unwrap_or(Adsr::GATE)
    }
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            master_volume: 0.5,
            osc1_volume: 0.7,
            osc2_volume: 0.3,
            detune: 0.05,
            distortion: 2.0,
            cutoff: 0.9,
            resonance: 0.5,
            waveform: Waveform::Triangle,
            envelope: None,
        }
    }
}

/// A named, immutable parameter set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub params: SynthParams,
}

/// Index into [`PRESETS`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PresetId(pub usize);

impl PresetId {
    /// Look a preset up by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<Self> {
        PRESETS
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
            .map(PresetId)
    }

    /// The preset this id refers to, if in range.
    pub fn preset(self) -> Option<&'static Preset> {
        PRESETS.get(self.0)
    }

    /// Next preset, wrapping at the end of the library.
    pub fn next(self) -> Self {
        PresetId((self.0 + 1) % PRESETS.len())
    }

    /// Previous preset, wrapping at the start of the library.
    pub fn previous(self) -> Self {
        PresetId((self.0 % PRESETS.len() + PRESETS.len() - 1) % PRESETS.len())
    }
}

const fn params(
    master_volume: f32,
    osc1_volume: f32,
    osc2_volume: f32,
    detune: f32,
    distortion: f32,
    cutoff: f32,
    resonance: f32,
    waveform: Waveform,
    envelope: Option<Adsr>,
) -> SynthParams {
    SynthParams {
        master_volume,
        osc1_volume,
        osc2_volume,
        detune,
        distortion,
        cutoff,
        resonance,
        waveform,
        envelope,
    }
}

const PLUCK: Adsr = Adsr { attack: 0.01, decay: 0.15, sustain: 0.2, release: 0.1 };
const BLIP: Adsr = Adsr { attack: 0.002, decay: 0.06, sustain: 0.0, release: 0.03 };
const SOFT: Adsr = Adsr { attack: 0.02, decay: 0.1, sustain: 0.8, release: 0.15 };

/// The built-in library, in selection order.
pub static PRESETS: [Preset; 11] = [
    Preset { name: "DistortedSaw", params: params(0.8, 0.7, 0.5, 0.02, 2.5, 0.7, 0.5, Waveform::Sawtooth, None) },
    Preset { name: "CrunchySquare", params: params(0.7, 0.6, 0.4, 0.01, 1.8, 0.5, 0.7, Waveform::Square, None) },
    Preset { name: "FrenchHouseBass", params: params(0.85, 0.8, 0.4, 0.01, 1.5, 0.3, 0.6, Waveform::Sawtooth, None) },
    Preset { name: "TechnoBass", params: params(0.9, 0.7, 0.5, 0.03, 3.0, 0.4, 0.4, Waveform::Sawtooth, None) },
    Preset { name: "DeepSubBass", params: params(0.6, 0.5, 0.2, 0.0, 1.0, 0.2, 0.3, Waveform::Sine, None) },
    Preset { name: "PiercingLead", params: params(0.75, 0.7, 0.5, 0.015, 2.0, 0.85, 0.6, Waveform::Square, None) },
    Preset { name: "PunchyBass", params: params(0.85, 0.8, 0.3, 0.01, 2.2, 0.35, 0.5, Waveform::Triangle, Some(PLUCK)) },
    Preset { name: "MetallicPluck", params: params(0.7, 0.6, 0.6, 0.07, 1.6, 0.65, 0.8, Waveform::Triangle, Some(PLUCK)) },
    Preset { name: "DistortedSquareBass", params: params(0.8, 0.7, 0.4, 0.02, 3.5, 0.45, 0.5, Waveform::Square, None) },
    Preset { name: "PercussiveBlip", params: params(0.7, 0.7, 0.2, 0.0, 1.2, 0.8, 0.3, Waveform::Sine, Some(BLIP)) },
    Preset { name: "SmoothHouseBass", params: params(0.75, 0.7, 0.3, 0.005, 1.1, 0.3, 0.4, Waveform::Triangle, Some(SOFT)) },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        let id = PresetId::by_name("technobass").unwrap();
        assert_eq!(id.preset().unwrap().name, "TechnoBass");
        assert_eq!(PresetId::by_name("NoSuchPatch"), None);
    }

    #[test]
    fn next_and_previous_wrap() {
        let last = PresetId(PRESETS.len() - 1);
        assert_eq!(last.next(), PresetId(0));
        assert_eq!(PresetId(0).previous(), last);
        assert_eq!(PresetId(3).previous(), PresetId(2));
    }

    #[test]
    fn library_is_well_formed() {
        for preset in &PRESETS {
            let p = preset.params;
            assert!(p.cutoff > 0.0 && p.cutoff <= 1.0, "{}", preset.name);
            assert!((0.0..=1.0).contains(&p.master_volume), "{}", preset.name);
            assert_eq!(p.adsr(), p.adsr().sanitized(), "{}", preset.name);
        }
    }

    #[test]
    fn saw_presets_keep_sawtooth() {
        for name in ["DistortedSaw", "FrenchHouseBass", "TechnoBass"] {
            let preset = PresetId::by_name(name).unwrap().preset().unwrap();
            assert_eq!(preset.params.waveform, Waveform::Sawtooth, "{name}");
        }
        assert_eq!(PresetId::by_name("DeepSubBass").unwrap().preset().unwrap().params.waveform, Waveform::Sine);
    }

    #[test]
    fn missing_envelope_uses_gate() {
        assert_eq!(PRESETS[0].params.adsr(), Adsr::GATE);
        assert_eq!(PRESETS[6].params.adsr(), PLUCK);
    }
}
