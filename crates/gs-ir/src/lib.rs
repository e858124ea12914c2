//! Core data model for the gridsynth step workstation.
//!
//! Defines the pattern grid, pitch keys, tempo math, waveform and
//! envelope parameters, presets, drum patches, and the persisted
//! pattern snapshot. The engine and controller crates consume these types.
//!
//! Designed to be `no_std` compatible with the `alloc` crate; the
//! JSON snapshot needs the `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod adsr;
mod drum;
mod grid;
mod pitch;
mod preset;
#[cfg(feature = "std")]
mod snapshot;
mod tempo;
mod waveform;

pub use adsr::{Adsr, EnvelopeMode};
pub use drum::DrumPatch;
pub use grid::PatternGrid;
pub use pitch::{frequency_for_index, PitchKey, C1_FREQUENCY};
pub use preset::{Preset, PresetId, SynthParams, PRESETS};
#[cfg(feature = "std")]
pub use snapshot::{DecodedSnapshot, PatternSnapshot, SnapshotError};
pub use tempo::{step_interval_secs, Bpm, DEFAULT_BPM, STEPS_PER_BEAT};
pub use waveform::Waveform;
