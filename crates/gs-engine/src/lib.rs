//! Real-time synthesis engine and step sequencer for gridsynth.
//!
//! The [`Engine`] renders the melodic synth and the drum bank on the audio
//! thread. Everything else talks to it through a [`CommandSender`]; the
//! [`StepSequencer`] is one such talker, driven by a clock that lives
//! outside this crate.

mod command;
mod drum_bank;
mod effects;
mod envelope_state;
mod oscillator;
mod render;
pub mod scheduler;
mod voice;
mod voice_pool;

pub use command::{
    command_queue, CommandReceiver, CommandSender, VoiceCommand, VoiceSink,
    DEFAULT_COMMAND_CAPACITY,
};
pub use drum_bank::{DrumBank, DrumSound, DEFAULT_DRUM_VOLUME};
pub use effects::{clamp_cutoff, distort, sanitize, EffectsChain, OnePole};
pub use envelope_state::{level_at, release_level, EnvelopeStage, EnvelopeState};
pub use oscillator::{advance_phase, waveform_sample, Oscillator};
pub use render::{AudioRender, Engine, EngineSettings};
pub use scheduler::{
    read_grid, shared_grid, SequencerError, SharedGrid, StepSequencer, Track, TrackKind,
    TransportState,
};
pub use voice::Voice;
pub use voice_pool::{RetriggerPolicy, VoicePool, MAX_VOICES};
