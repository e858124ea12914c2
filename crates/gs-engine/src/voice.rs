//! Voice: one sounding pitch of the melodic synth.

use gs_ir::{EnvelopeMode, PitchKey, SynthParams, Waveform};

use crate::envelope_state::EnvelopeState;
use crate::oscillator::Oscillator;

/// A synth voice: primary + detuned secondary oscillator under one envelope.
///
/// Waveform and detune are latched at note-on so a preset change never
/// reshapes a note that is already sounding; the oscillator volumes are
/// read live from the engine parameters.
#[derive(Clone, Copy, Debug)]
pub struct Voice {
    /// Identity in the voice set.
    pub key: PitchKey,
    /// Fundamental in Hz.
    pub frequency: f32,
    pub primary: Oscillator,
    /// Runs at `frequency * (1 + detune)`.
    pub secondary: Oscillator,
    pub waveform: Waveform,
    pub envelope: EnvelopeState,
    /// Allocation order; larger is newer. Used for stealing.
    pub age: u64,
}

impl Voice {
    /// Allocate a voice at phase 0 entering Attack.
    pub fn new(
        key: PitchKey,
        frequency: f32,
        mode: EnvelopeMode,
        params: &SynthParams,
        sample_rate: u32,
        age: u64,
    ) -> Self {
        Self {
            key,
            frequency,
            primary: Oscillator::new(frequency, sample_rate),
            secondary: Oscillator::new(frequency * (1.0 + params.detune), sample_rate),
            waveform: params.waveform,
            envelope: EnvelopeState::new(params.adsr(), mode),
            age,
        }
    }

    /// Reset phase and envelope, as if freshly allocated.
    pub fn retrigger(&mut self, mode: EnvelopeMode, params: &SynthParams, sample_rate: u32) {
        *self = Self::new(self.key, self.frequency, mode, params, sample_rate, self.age);
    }

    /// Restart the envelope from Attack but keep the running phase, so a
    /// releasing voice picks back up without a click.
    pub fn reattack(&mut self, mode: EnvelopeMode, params: &SynthParams) {
        self.waveform = params.waveform;
        self.envelope = EnvelopeState::new(params.adsr(), mode);
    }

    pub fn note_off(&mut self) {
        self.envelope.note_off();
    }

    pub fn is_held(&self) -> bool {
        self.envelope.is_held()
    }

    pub fn is_done(&self) -> bool {
        self.envelope.is_done()
    }

    /// Produce one sample (pre-effects) and step oscillators and envelope.
    #[inline]
    pub fn next_sample(&mut self, params: &SynthParams, dt: f64) -> f32 {
        if self.is_done() {
            return 0.0;
        }
        let tone = self.primary.next_sample(self.waveform) * params.osc1_volume
            + self.secondary.next_sample(self.waveform) * params.osc2_volume;
        let gain = self.envelope.level();
        self.envelope.advance(dt);
        tone * gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope_state::EnvelopeStage;
    use gs_ir::Adsr;

    const SR: u32 = 48_000;
    const DT: f64 = 1.0 / SR as f64;

    fn params() -> SynthParams {
        SynthParams {
            waveform: Waveform::Square,
            envelope: Some(Adsr::new(0.01, 0.0, 1.0, 0.01)),
            ..SynthParams::default()
        }
    }

    #[test]
    fn secondary_is_detuned() {
        let p = params();
        let v = Voice::new(PitchKey(33), 440.0, EnvelopeMode::Hold, &p, SR, 0);
        let ratio = v.secondary.increment / v.primary.increment;
        assert!((ratio - (1.0 + p.detune)).abs() < 1e-5);
    }

    #[test]
    fn first_sample_is_silent() {
        let p = params();
        let mut v = Voice::new(PitchKey(33), 440.0, EnvelopeMode::Hold, &p, SR, 0);
        assert_eq!(v.next_sample(&p, DT), 0.0);
    }

    #[test]
    fn sustained_square_reaches_summed_volume() {
        let p = params();
        let mut v = Voice::new(PitchKey(33), 40.0, EnvelopeMode::Hold, &p, SR, 0);
        // past the 10 ms attack, still inside the first positive half-cycle
        let mut last = 0.0;
        for _ in 0..(SR / 100 + 10) {
            last = v.next_sample(&p, DT);
        }
        assert!((last - (p.osc1_volume + p.osc2_volume)).abs() < 1e-4);
    }

    #[test]
    fn note_off_runs_to_done() {
        let p = params();
        let mut v = Voice::new(PitchKey(0), 220.0, EnvelopeMode::Hold, &p, SR, 0);
        for _ in 0..1000 {
            v.next_sample(&p, DT);
        }
        v.note_off();
        assert_eq!(v.envelope.stage(), EnvelopeStage::Release);
        for _ in 0..(SR / 100 + 1) {
            v.next_sample(&p, DT);
        }
        assert!(v.is_done());
        assert_eq!(v.next_sample(&p, DT), 0.0);
    }

    #[test]
    fn reattack_keeps_phase() {
        let p = params();
        let mut v = Voice::new(PitchKey(0), 220.0, EnvelopeMode::Hold, &p, SR, 0);
        for _ in 0..777 {
            v.next_sample(&p, DT);
        }
        v.note_off();
        let phase = v.primary.phase;
        v.reattack(EnvelopeMode::Hold, &p);
        assert_eq!(v.primary.phase, phase);
        assert_eq!(v.envelope.stage(), EnvelopeStage::Attack);
    }

    #[test]
    fn retrigger_resets_phase() {
        let p = params();
        let mut v = Voice::new(PitchKey(0), 220.0, EnvelopeMode::Hold, &p, SR, 3);
        for _ in 0..777 {
            v.next_sample(&p, DT);
        }
        v.retrigger(EnvelopeMode::Hold, &p, SR);
        assert_eq!(v.primary.phase, 0.0);
        assert_eq!(v.age, 3);
    }
}
