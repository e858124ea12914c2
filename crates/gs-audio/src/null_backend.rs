//! Device-less output: renders on demand. Used by tests and headless runs.

use gs_engine::AudioRender;

use crate::traits::{AudioError, AudioOutput};

/// An output with no device behind it. Call [`NullOutput::render_pass`] to
/// pull one buffer from the attached renderer.
pub struct NullOutput {
    sample_rate: u32,
    channels: usize,
    renderer: Option<Box<dyn AudioRender>>,
}

impl NullOutput {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        Self { sample_rate, channels, renderer: None }
    }

    /// Pull `frames` frames. Silence when stopped.
    pub fn render_pass(&mut self, frames: usize) -> Vec<f32> {
        let mut buffer = vec![0.0; frames * self.channels];
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render(&mut buffer, self.channels);
        }
        buffer
    }
}

impl AudioOutput for NullOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn start(&mut self, renderer: Box<dyn AudioRender>) -> Result<(), AudioError> {
        if self.renderer.is_some() {
            return Err(AudioError::AlreadyRunning);
        }
        self.renderer = Some(renderer);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.renderer = None;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.renderer.is_some()
    }
}
