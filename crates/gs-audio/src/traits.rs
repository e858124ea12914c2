//! Audio output trait and error types.

use gs_engine::AudioRender;

/// Error type for audio operations.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// Failed to initialize audio device
    #[error("device init error: {0}")]
    DeviceInit(String),
    /// Failed to create audio stream
    #[error("stream create error: {0}")]
    StreamCreate(String),
    /// Playback error
    #[error("playback error: {0}")]
    Playback(String),
    /// No audio device available
    #[error("no audio device available")]
    NoDevice,
    /// `start` called while a renderer is already attached
    #[error("audio output already running")]
    AlreadyRunning,
}

/// Trait for audio output backends.
///
/// The backend pulls audio: it hands each device buffer to the renderer
/// given to [`start`](AudioOutput::start), on whatever thread the device
/// callback runs.
pub trait AudioOutput {
    /// Get the sample rate.
    fn sample_rate(&self) -> u32;

    /// Interleaved channels per frame.
    fn channels(&self) -> usize;

    /// Attach a renderer and begin pulling buffers from it.
    fn start(&mut self, renderer: Box<dyn AudioRender>) -> Result<(), AudioError>;

    /// Stop pulling and release the renderer.
    fn stop(&mut self) -> Result<(), AudioError>;

    fn is_running(&self) -> bool;
}
