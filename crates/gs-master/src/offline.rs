//! Deterministic offline rendering and WAV export.

use std::path::Path;

use gs_engine::{CommandSender, Engine, SequencerError, StepSequencer};
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::info;

/// Run `steps` sequencer steps through `engine`, ticking every
/// `round(step_interval * sample_rate)` frames. Returns interleaved samples.
pub fn render_steps(
    engine: &mut Engine,
    sequencer: &mut StepSequencer,
    sink: &mut CommandSender,
    steps: usize,
    channels: usize,
) -> Result<Vec<f32>, SequencerError> {
    sequencer.play()?;
    let sample_rate = engine.sample_rate();
    let mut out = Vec::new();
    for _ in 0..steps {
        sequencer.tick(sink);
        let frames = sequencer.bpm().frames_per_step(sample_rate) as usize;
        out.extend(engine.render_frames(frames, channels));
    }
    sequencer.stop(sink);
    Ok(out)
}

/// Store interleaved `f32` samples as 16-bit PCM.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(to_i16(s))?;
    }
    writer.finalize()?;
    info!(path = %path.display(), frames = samples.len() / usize::from(channels.max(1)), "wav written");
    Ok(())
}

fn to_i16(s: f32) -> i16 {
    (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
