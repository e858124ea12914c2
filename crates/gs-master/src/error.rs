//! Error types for the workstation controller.

use std::path::PathBuf;

use gs_audio::AudioError;
use gs_engine::SequencerError;
use gs_ir::SnapshotError;

use crate::config::ConfigError;

/// Rejected Trigger API call. Nothing changed when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
    #[error("drum lane {lane} out of range ({lanes} lanes)")]
    InvalidLane { lane: usize, lanes: usize },
    #[error("invalid frequency {0}")]
    InvalidFrequency(f32),
    #[error("invalid master volume {0}")]
    InvalidVolume(f32),
    #[error("unknown preset {0}")]
    UnknownPreset(String),
    #[error("command queue full")]
    QueueFull,
}

/// Failure while assembling a [`Workstation`](crate::Workstation).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
    #[error("failed to start audio output: {0}")]
    Audio(#[from] AudioError),
}

/// Reading or writing a snapshot file.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("snapshot file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Offline render to a WAV file.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Render(#[from] TransportError),
    #[error("cannot write {0} channels to wav")]
    Channels(usize),
    #[error("failed to write wav: {0}")]
    Wav(#[from] hound::Error),
}
