//! Workstation configuration, stored as TOML.
//!
//! ```toml
//! sample_rate = 48000
//! default_bpm = 128.0
//! preset = "TechnoBass"
//! retrigger = "ignore"
//!
//! [[kit]]
//! name = "Kick"
//! patch = "kick"
//!
//! [[kit]]
//! name = "Snare"
//! sample = "samples/snare.wav"
//! ```

use std::path::{Path, PathBuf};

use gs_engine::{RetriggerPolicy, DEFAULT_COMMAND_CAPACITY, DEFAULT_DRUM_VOLUME};
use gs_ir::{Bpm, DrumPatch, PitchKey, PresetId, DEFAULT_BPM};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("preset not found: {0}")]
    PresetNotFound(String),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Retrigger setting as written in the file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retrigger {
    #[default]
    Ignore,
    Retrigger,
}

impl From<Retrigger> for RetriggerPolicy {
    fn from(r: Retrigger) -> Self {
        match r {
            Retrigger::Ignore => RetriggerPolicy::Ignore,
            Retrigger::Retrigger => RetriggerPolicy::Retrigger,
        }
    }
}

/// One drum lane: a built-in patch or a WAV file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KitLane {
    pub name: String,
    /// Built-in patch name (`kick`, `snare`, `hihat`, `clap`, `percussion`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    /// WAV path, relative to the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<PathBuf>,
}

impl KitLane {
    pub fn patch(name: impl Into<String>, patch: impl Into<String>) -> Self {
        Self { name: name.into(), patch: Some(patch.into()), sample: None }
    }

    pub fn sample(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), patch: None, sample: Some(path.into()) }
    }
}

/// Everything needed to build a [`Workstation`](crate::Workstation).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkstationConfig {
    /// Used when the output does not dictate a rate (offline, null output).
    pub sample_rate: u32,
    pub channels: usize,
    /// Depth of the command queue into the render thread.
    pub command_capacity: usize,
    pub default_bpm: f32,
    /// Melodic grid rows, top row highest.
    pub synth_rows: usize,
    /// Drum grid rows, one per kit lane.
    pub drum_rows: usize,
    /// Steps per pattern, shared by both grids.
    pub columns: usize,
    /// Semitone offset from C1 of the bottom melodic row.
    pub base_pitch: u8,
    pub retrigger: Retrigger,
    /// Initial preset name.
    pub preset: String,
    pub drum_volume: f32,
    pub kit: Vec<KitLane>,
    /// Directory relative sample paths resolve against. Set by [`load`](Self::load).
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Default for WorkstationConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            default_bpm: DEFAULT_BPM,
            synth_rows: 36,
            drum_rows: DrumPatch::BUILTIN.len(),
            columns: 16,
            base_pitch: 0,
            retrigger: Retrigger::default(),
            preset: "DistortedSaw".to_string(),
            drum_volume: DEFAULT_DRUM_VOLUME,
            kit: DrumPatch::BUILTIN
                .iter()
                .map(|(name, _)| KitLane::patch(*name, *name))
                .collect(),
            base_dir: None,
        }
    }
}

impl WorkstationConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::from_toml(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field the workstation cannot recover from.
    ///
    /// A kit whose lane count differs from `drum_rows` is not an error here;
    /// the kit builder pads or truncates it with a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(invalid("sample_rate", "must be positive"));
        }
        if self.channels == 0 {
            return Err(invalid("channels", "must be positive"));
        }
        if self.command_capacity == 0 {
            return Err(invalid("command_capacity", "must be positive"));
        }
        if self.columns == 0 {
            return Err(invalid("columns", "must be positive"));
        }
        if Bpm::new(self.default_bpm).is_none() {
            return Err(invalid("default_bpm", format!("{} is not a valid tempo", self.default_bpm)));
        }
        if self.synth_rows > 0 && self.top_pitch().is_none() {
            return Err(invalid(
                "synth_rows",
                format!("{} rows above base pitch {} exceed the pitch range", self.synth_rows, self.base_pitch),
            ));
        }
        self.preset_id()?;
        Ok(())
    }

    /// Initial preset, resolved by name.
    pub fn preset_id(&self) -> Result<PresetId, ConfigError> {
        PresetId::by_name(&self.preset).ok_or_else(|| ConfigError::PresetNotFound(self.preset.clone()))
    }

    pub fn bpm(&self) -> Bpm {
        Bpm::new(self.default_bpm).unwrap_or_default()
    }

    pub fn base_pitch(&self) -> PitchKey {
        PitchKey(self.base_pitch)
    }

    fn top_pitch(&self) -> Option<PitchKey> {
        let span = i16::try_from(self.synth_rows.saturating_sub(1)).ok()?;
        self.base_pitch().transpose(span)
    }

    /// Resolve a sample path against the config file's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}
