//! Post-mix effects: `tan` distortion into a one-pole low-pass.

/// Smallest usable filter coefficient. Zero would freeze the filter.
pub const MIN_CUTOFF: f32 = 1e-4;

/// Replace NaN/Inf with silence and hard-clip to `[-1, 1]`.
#[inline]
pub fn sanitize(x: f32) -> f32 {
    if x.is_finite() {
        x.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// `tan(x * amount)`, already sanitized. `tan` has poles, so the raw curve
/// can be arbitrarily large; the clamp keeps the filter state bounded.
#[inline]
pub fn distort(x: f32, amount: f32) -> f32 {
    sanitize((x * amount).tan())
}

/// Clamp a cutoff coefficient into `[MIN_CUTOFF, 1]`. NaN opens the filter.
pub fn clamp_cutoff(cutoff: f32) -> f32 {
    if cutoff.is_nan() {
        1.0
    } else {
        cutoff.clamp(MIN_CUTOFF, 1.0)
    }
}

/// Single-pole IIR: `y += (x - y) * cutoff`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OnePole {
    state: f32,
}

impl OnePole {
    #[inline]
    pub fn process(&mut self, x: f32, cutoff: f32) -> f32 {
        self.state += (x - self.state) * cutoff;
        self.state
    }

    pub fn state(&self) -> f32 {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// Distortion and filter applied to the summed synth signal.
///
/// One instance per engine; the filter memory persists across buffers.
#[derive(Clone, Copy, Debug)]
pub struct EffectsChain {
    distortion: f32,
    cutoff: f32,
    filter: OnePole,
}

impl EffectsChain {
    pub fn new(distortion: f32, cutoff: f32) -> Self {
        let mut chain = Self { distortion: 0.0, cutoff: 1.0, filter: OnePole::default() };
        chain.set_params(distortion, cutoff);
        chain
    }

    /// Swap parameters without resetting the filter memory.
    pub fn set_params(&mut self, distortion: f32, cutoff: f32) {
        self.distortion = if distortion.is_finite() { distortion } else { 0.0 };
        self.cutoff = clamp_cutoff(cutoff);
    }

    pub fn distortion(&self) -> f32 {
        self.distortion
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Run one sample through distortion then the filter.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let driven = distort(x, self.distortion);
        sanitize(self.filter.process(driven, self.cutoff))
    }

    pub fn reset(&mut self) {
        self.filter.reset();
    }
}

impl Default for EffectsChain {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}
