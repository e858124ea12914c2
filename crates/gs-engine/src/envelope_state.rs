//! Runtime ADSR evaluator.
//!
//! Level is a pure function of time since note-on (and, once released,
//! time since note-off). The state only tracks those clocks, so there is
//! no accumulated per-sample gain error.

use gs_ir::{Adsr, EnvelopeMode};

/// Stage of an envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Sustain,
    Release,
    Done,
}

/// Level of a not-yet-released envelope at `t` seconds after note-on.
///
/// In [`EnvelopeMode::OneShot`] the release starts by itself at
/// `attack + decay` and there is no sustain plateau.
pub fn level_at(adsr: &Adsr, mode: EnvelopeMode, t: f32) -> (EnvelopeStage, f32) {
    let (stage, level) = if t < adsr.attack {
        (EnvelopeStage::Attack, t / adsr.attack)
    } else if t < adsr.attack + adsr.decay {
        let x = (t - adsr.attack) / adsr.decay;
        (EnvelopeStage::Decay, lerp(1.0, adsr.sustain, x))
    } else {
        match mode {
            EnvelopeMode::Hold => (EnvelopeStage::Sustain, adsr.sustain),
            EnvelopeMode::OneShot => {
                let tr = t - adsr.attack - adsr.decay;
                release_level(adsr.sustain, adsr.release, tr)
            }
        }
    };
    (stage, level.clamp(0.0, 1.0))
}

/// Level `tr` seconds into a release that started at `from`.
pub fn release_level(from: f32, release: f32, tr: f32) -> (EnvelopeStage, f32) {
    if tr < release {
        (EnvelopeStage::Release, lerp(from, 0.0, tr / release).clamp(0.0, 1.0))
    } else {
        (EnvelopeStage::Done, 0.0)
    }
}

#[inline]
fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Per-voice envelope clock.
#[derive(Clone, Copy, Debug)]
pub struct EnvelopeState {
    adsr: Adsr,
    mode: EnvelopeMode,
    /// Seconds since note-on.
    elapsed: f64,
    /// `elapsed` at note-off, and the level the release starts from.
    released: Option<(f64, f32)>,
    stage: EnvelopeStage,
    level: f32,
}

impl EnvelopeState {
    /// Start a new envelope at t = 0 (level 0, Attack).
    pub fn new(adsr: Adsr, mode: EnvelopeMode) -> Self {
        let adsr = adsr.sanitized();
        let (stage, level) = level_at(&adsr, mode, 0.0);
        Self { adsr, mode, elapsed: 0.0, released: None, stage, level }
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Current gain in `[0, 1]`.
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn mode(&self) -> EnvelopeMode {
        self.mode
    }

    pub fn is_done(&self) -> bool {
        self.stage == EnvelopeStage::Done
    }

    /// True until note-off (explicit or automatic) has begun the release.
    pub fn is_held(&self) -> bool {
        matches!(
            self.stage,
            EnvelopeStage::Attack | EnvelopeStage::Decay | EnvelopeStage::Sustain
        )
    }

    /// Begin the release from the current level. No-op once releasing.
    pub fn note_off(&mut self) {
        if self.is_held() {
            self.released = Some((self.elapsed, self.level));
            self.refresh();
        }
    }

    /// Jump straight to Done.
    pub fn kill(&mut self) {
        self.stage = EnvelopeStage::Done;
        self.level = 0.0;
    }

    /// Restart from Attack, keeping the timing parameters.
    pub fn retrigger(&mut self) {
        *self = Self::new(self.adsr, self.mode);
    }

    /// Advance by `dt` seconds and return the new level.
    #[inline]
    pub fn advance(&mut self, dt: f64) -> f32 {
        if self.stage != EnvelopeStage::Done {
            self.elapsed += dt;
            self.refresh();
        }
        self.level
    }

    fn refresh(&mut self) {
        let (stage, level) = match self.released {
            Some((at, from)) => release_level(from, self.adsr.release, (self.elapsed - at) as f32),
            None => level_at(&self.adsr, self.mode, self.elapsed as f32),
        };
        self.stage = stage;
        self.level = level;
    }
}
