//! Audio output backends for gridsynth.
//!
//! A backend owns a device (or nothing, for tests) and calls an
//! [`AudioRender`](gs_engine::AudioRender) once per buffer.

mod cpal_backend;
mod null_backend;
mod traits;

pub use cpal_backend::CpalOutput;
pub use null_backend::NullOutput;
pub use traits::{AudioError, AudioOutput};
