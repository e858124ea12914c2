//! Phase-accumulator oscillators.

use core::f32::consts::TAU;
use gs_ir::Waveform;

/// Evaluate `waveform` at `phase` in `[0, 1)`. Output is in `[-1, 1]`.
#[inline]
pub fn waveform_sample(waveform: Waveform, phase: f32) -> f32 {
    match waveform {
        Waveform::Sine => (TAU * phase).sin(),
        Waveform::Square => {
            if (TAU * phase).sin() >= 0.0 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Triangle => ping_pong(2.0 * phase, 1.0) * 2.0 - 1.0,
        Waveform::Sawtooth => 2.0 * (phase - (phase + 0.5).floor()),
        Waveform::Silent => 0.0,
    }
}

/// Fold `t` back and forth over `[0, length]`.
#[inline]
fn ping_pong(t: f32, length: f32) -> f32 {
    let period = length * 2.0;
    let folded = t - (t / period).floor() * period;
    length - (folded - length).abs()
}

/// Advance `phase` by `increment` and wrap into `[0, 1)`.
#[inline]
pub fn advance_phase(phase: f32, increment: f32) -> f32 {
    let next = phase + increment;
    let wrapped = next - next.floor();
    // `x - floor(x)` can round up to exactly 1.0 for tiny negative x.
    if wrapped >= 1.0 || !wrapped.is_finite() {
        0.0
    } else {
        wrapped
    }
}

/// A single phase accumulator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Oscillator {
    /// Current phase in `[0, 1)`.
    pub phase: f32,
    /// Phase step per sample: `frequency / sample_rate`.
    pub increment: f32,
}

impl Oscillator {
    /// Create an oscillator at phase 0 for `frequency` Hz.
    pub fn new(frequency: f32, sample_rate: u32) -> Self {
        let mut osc = Self::default();
        osc.set_frequency(frequency, sample_rate);
        osc
    }

    /// Change pitch without touching phase.
    pub fn set_frequency(&mut self, frequency: f32, sample_rate: u32) {
        self.increment = if sample_rate == 0 || !frequency.is_finite() {
            0.0
        } else {
            frequency / sample_rate as f32
        };
    }

    /// Produce one sample and step the phase.
    #[inline]
    pub fn next_sample(&mut self, waveform: Waveform) -> f32 {
        let out = waveform_sample(waveform, self.phase);
        self.phase = advance_phase(self.phase, self.increment);
        out
    }
}
