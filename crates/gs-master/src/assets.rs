//! Drum kit assembly: built-in patches and WAV samples.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gs_engine::DrumSound;
use gs_ir::DrumPatch;
use hound::SampleFormat;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{KitLane, WorkstationConfig};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read sample '{path}': {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("sample '{0}' has no audio")]
    Empty(PathBuf),
    #[error("unknown drum patch: {0}")]
    UnknownPatch(String),
    #[error("kit lane '{0}' names neither a patch nor a sample")]
    NoSound(String),
}

/// Decode a WAV file to mono `f32` frames.
///
/// Multi-channel files are averaged down. No resampling is done: a file
/// at another rate plays at the wrong pitch, which is reported.
pub fn load_sample(path: &Path, sample_rate: u32) -> Result<Arc<[f32]>, AssetError> {
    let wav_err = |source| AssetError::Wav { path: path.to_path_buf(), source };
    let mut reader = hound::WavReader::open(path).map_err(wav_err)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>().map_err(wav_err)?,
        SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|x| x as f32 / max))
                .collect::<Result<_, _>>()
                .map_err(wav_err)?
        }
    };

    let channels = usize::from(spec.channels.max(1));
    let mono: Vec<f32> = samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    if mono.is_empty() {
        return Err(AssetError::Empty(path.to_path_buf()));
    }
    if spec.sample_rate != sample_rate {
        warn!(
            path = %path.display(),
            file_rate = spec.sample_rate,
            engine_rate = sample_rate,
            "sample rate differs from engine; playing without resampling"
        );
    }
    Ok(mono.into())
}

/// Resolve one kit lane to a sound. A sample path wins over a patch name.
pub fn lane_sound(lane: &KitLane, config: &WorkstationConfig, sample_rate: u32) -> Result<DrumSound, AssetError> {
    if let Some(sample) = &lane.sample {
        return load_sample(&config.resolve(sample), sample_rate).map(DrumSound::Sample);
    }
    match &lane.patch {
        Some(name) => DrumPatch::by_name(name)
            .map(DrumSound::Synth)
            .ok_or_else(|| AssetError::UnknownPatch(name.clone())),
        None => Err(AssetError::NoSound(lane.name.clone())),
    }
}

/// Build exactly `config.drum_rows` lane sounds.
///
/// Any lane that fails to load, and any row without a kit entry, becomes
/// [`DrumSound::Silent`]; each problem is logged once here.
pub fn build_kit(config: &WorkstationConfig, sample_rate: u32) -> Vec<DrumSound> {
    let rows = config.drum_rows;
    if config.kit.len() != rows {
        warn!(lanes = config.kit.len(), rows, "kit lane count does not match drum rows");
    }

    let mut sounds: Vec<DrumSound> = config
        .kit
        .iter()
        .take(rows)
        .enumerate()
        .map(|(i, lane)| match lane_sound(lane, config, sample_rate) {
            Ok(sound) => sound,
            Err(err) => {
                warn!(lane = i, name = %lane.name, %err, "drum lane falls back to silence");
                DrumSound::Silent
            }
        })
        .collect();
    sounds.resize(rows, DrumSound::Silent);

    let silent = sounds.iter().filter(|s| **s == DrumSound::Silent).count();
    info!(lanes = rows, silent, "drum kit ready");
    sounds
}
