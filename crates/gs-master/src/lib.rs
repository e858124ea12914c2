//! Headless controller for the gridsynth workstation.
//!
//! Owns the pattern grids, the step sequencer and its clock thread, and
//! the audio output the render engine runs on. Both the CLI and any UI go
//! through the Trigger API on [`Workstation`].

mod assets;
mod clock;
mod config;
mod error;
mod offline;
mod persistence;

use std::path::Path;
use std::sync::{Arc, PoisonError};

use gs_engine::{
    shared_grid, CommandSender, DrumBank, Engine, EngineSettings, StepSequencer, Track,
    VoiceCommand,
};
use tracing::{info, warn};

use crate::clock::{Clock, Shared};

// Re-export common types so callers don't need gs-ir/gs-engine directly.
pub use gs_audio::{AudioError, AudioOutput, CpalOutput, NullOutput};
pub use gs_engine::{read_grid, DrumSound, SequencerError, SharedGrid, TransportState};
pub use gs_ir::{
    Bpm, EnvelopeMode, PatternGrid, PatternSnapshot, PitchKey, Preset, PresetId, SynthParams,
    PRESETS,
};

pub use assets::{build_kit, lane_sound, load_sample, AssetError};
pub use config::{ConfigError, KitLane, Retrigger, WorkstationConfig};
pub use error::{BuildError, ExportError, PersistError, TransportError};
pub use offline::{render_steps, write_wav};
pub use persistence::{load_snapshot_or_default, read_snapshot, save_snapshot};

/// Which grid a snapshot refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GridTarget {
    Synth,
    #[default]
    Drums,
}

/// Two-phase construction: configure, then [`build`](Self::build) starts audio.
pub struct WorkstationBuilder<O: AudioOutput> {
    config: WorkstationConfig,
    output: O,
    kit: Option<Vec<DrumSound>>,
}

impl WorkstationBuilder<NullOutput> {
    /// Builder with a device-less output at the configured rate.
    pub fn headless(config: WorkstationConfig) -> Self {
        let output = NullOutput::new(config.sample_rate, config.channels);
        Self { config, output, kit: None }
    }
}

impl<O: AudioOutput> WorkstationBuilder<O> {
    pub fn new(config: WorkstationConfig, output: O) -> Self {
        Self { config, output, kit: None }
    }

    /// Use these lane sounds instead of loading the configured kit.
    pub fn kit(mut self, kit: Vec<DrumSound>) -> Self {
        self.kit = Some(kit);
        self
    }

    /// Validate, build the engine and sequencer, and start the output.
    ///
    /// The workstation accepts Trigger API calls only once this returns.
    pub fn build(self) -> Result<Workstation<O>, BuildError> {
        let Self { config, mut output, kit } = self;
        config.validate()?;

        let sample_rate = output.sample_rate();
        if sample_rate != config.sample_rate {
            info!(configured = config.sample_rate, device = sample_rate, "using output sample rate");
        }

        let mut kit = kit.unwrap_or_else(|| build_kit(&config, sample_rate));
        if kit.len() != config.drum_rows {
            warn!(lanes = kit.len(), rows = config.drum_rows, "kit resized to drum rows");
            kit.resize(config.drum_rows, DrumSound::Silent);
        }

        let preset = config.preset_id()?;
        let params = preset.preset().map(|p| p.params).unwrap_or_default();
        let synth_grid = shared_grid(PatternGrid::new(config.synth_rows, config.columns));
        let drum_grid = shared_grid(PatternGrid::new(config.drum_rows, config.columns));

        let (engine, sender) = new_engine(&config, sample_rate, params, &kit);
        let sequencer = new_sequencer(&config, config.bpm(), &synth_grid, &drum_grid)?;

        output.start(Box::new(engine))?;
        info!(
            sample_rate,
            channels = output.channels(),
            preset = preset.preset().map_or("", |p| p.name),
            "workstation ready"
        );

        Ok(Workstation {
            config,
            shared: Arc::new(Shared::new(sequencer)),
            sender,
            synth_grid,
            drum_grid,
            kit,
            preset,
            params,
            scroll_position: 0.0,
            output,
            clock: None,
        })
    }
}

fn new_engine(
    config: &WorkstationConfig,
    sample_rate: u32,
    params: SynthParams,
    kit: &[DrumSound],
) -> (Engine, CommandSender) {
    let mut drums = DrumBank::new(kit.iter().cloned(), sample_rate);
    drums.set_volume(config.drum_volume);
    let settings = EngineSettings {
        sample_rate,
        params,
        retrigger: config.retrigger.into(),
        command_capacity: config.command_capacity,
    };
    Engine::new(settings, drums)
}

fn new_sequencer(
    config: &WorkstationConfig,
    bpm: Bpm,
    synth_grid: &SharedGrid,
    drum_grid: &SharedGrid,
) -> Result<StepSequencer, SequencerError> {
    let mut sequencer = StepSequencer::new(bpm);
    if config.synth_rows > 0 {
        sequencer.add_track(Track::melodic(synth_grid.clone(), config.base_pitch(), EnvelopeMode::Hold))?;
    }
    if config.drum_rows > 0 {
        sequencer.add_track(Track::drums(drum_grid.clone()))?;
    }
    Ok(sequencer)
}

/// The running workstation.
pub struct Workstation<O: AudioOutput = CpalOutput> {
    config: WorkstationConfig,
    shared: Arc<Shared>,
    sender: CommandSender,
    synth_grid: SharedGrid,
    drum_grid: SharedGrid,
    kit: Vec<DrumSound>,
    preset: PresetId,
    params: SynthParams,
    scroll_position: f32,
    output: O,
    clock: Option<Clock>,
}

impl<O: AudioOutput> Workstation<O> {
    pub fn config(&self) -> &WorkstationConfig {
        &self.config
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    // --- Transport ---

    /// Start from column 0. Already playing is reported and ignored.
    pub fn play(&mut self) -> Result<(), TransportError> {
        self.shared.sequencer().play()?;
        self.ensure_clock();
        Ok(())
    }

    /// Stop ticking but leave sounding voices and the cursor alone.
    pub fn pause(&mut self) {
        self.halt_clock();
        self.shared.sequencer().pause();
    }

    /// Continue from where [`pause`](Self::pause) left off.
    pub fn resume(&mut self) {
        self.shared.sequencer().resume();
        self.ensure_clock();
    }

    /// Silence everything, rewind and clear the highlight.
    pub fn stop(&mut self) {
        self.halt_clock();
        let mut sink = self.sender.clone();
        self.shared.sequencer().stop(&mut sink);
        self.shared.publish(None);
    }

    pub fn transport_state(&self) -> TransportState {
        self.shared.sequencer().state()
    }

    pub fn cursor(&self) -> usize {
        self.shared.sequencer().cursor()
    }

    /// Column last played, for the UI highlight. Lock-free.
    pub fn highlighted_column(&self) -> Option<usize> {
        self.shared.highlighted()
    }

    /// Change tempo from the next step boundary.
    pub fn set_bpm(&mut self, bpm: f32) -> Result<(), TransportError> {
        self.shared.sequencer().set_bpm(bpm)?;
        Ok(())
    }

    pub fn bpm(&self) -> Bpm {
        self.shared.sequencer().bpm()
    }

    fn ensure_clock(&mut self) {
        if self.shared.sequencer().state() != TransportState::Playing {
            return;
        }
        if self.clock.as_ref().is_some_and(|c| !c.is_finished()) {
            return;
        }
        match Clock::start(self.shared.clone(), self.sender.clone()) {
            Ok(clock) => self.clock = Some(clock),
            Err(err) => warn!(%err, "failed to start clock thread"),
        }
    }

    fn halt_clock(&mut self) {
        if let Some(mut clock) = self.clock.take() {
            clock.stop();
        }
    }

    // --- Voices ---

    /// Hold a note until [`note_off`](Self::note_off).
    pub fn note_on(&mut self, key: PitchKey, frequency: f32) -> Result<(), TransportError> {
        self.note_on_with(key, frequency, EnvelopeMode::Hold)
    }

    /// Start a note with an explicit envelope mode. `OneShot` releases by
    /// itself, for key presses that never send a note-off.
    pub fn note_on_with(&mut self, key: PitchKey, frequency: f32, mode: EnvelopeMode) -> Result<(), TransportError> {
        if !(frequency.is_finite() && frequency > 0.0) {
            warn!(frequency, "note-on ignored: invalid frequency");
            return Err(TransportError::InvalidFrequency(frequency));
        }
        self.send(VoiceCommand::NoteOn { key, frequency, mode })
    }

    pub fn note_off(&mut self, key: PitchKey) -> Result<(), TransportError> {
        self.send(VoiceCommand::NoteOff { key })
    }

    pub fn trigger_drum(&mut self, lane: usize) -> Result<(), TransportError> {
        let lanes = self.sender.drum_lanes();
        if lane >= lanes {
            warn!(lane, lanes, "drum trigger ignored: lane out of range");
            return Err(TransportError::InvalidLane { lane, lanes });
        }
        self.send(VoiceCommand::TriggerDrum { lane })
    }

    fn send(&self, command: VoiceCommand) -> Result<(), TransportError> {
        if self.sender.send(command) {
            Ok(())
        } else {
            Err(TransportError::QueueFull)
        }
    }

    // --- Presets and volume ---

    /// Swap the synth parameter set from the next render pass.
    pub fn load_preset(&mut self, id: PresetId) -> Result<(), TransportError> {
        let Some(preset) = id.preset() else {
            warn!(id = id.0, "unknown preset");
            return Err(TransportError::UnknownPreset(id.0.to_string()));
        };
        self.send(VoiceCommand::SetParams(preset.params))?;
        self.preset = id;
        self.params = preset.params;
        info!(preset = preset.name, "preset loaded");
        Ok(())
    }

    pub fn load_preset_by_name(&mut self, name: &str) -> Result<(), TransportError> {
        match PresetId::by_name(name) {
            Some(id) => self.load_preset(id),
            None => {
                warn!(name, "unknown preset");
                Err(TransportError::UnknownPreset(name.to_string()))
            }
        }
    }

    pub fn next_preset(&mut self) -> Result<(), TransportError> {
        self.load_preset(self.preset.next())
    }

    pub fn previous_preset(&mut self) -> Result<(), TransportError> {
        self.load_preset(self.preset.previous())
    }

    pub fn current_preset(&self) -> PresetId {
        self.preset
    }

    /// Parameters the engine is running with (or will be, after the next pass).
    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    pub fn set_master_volume(&mut self, volume: f32) -> Result<(), TransportError> {
        if !volume.is_finite() {
            warn!(volume, "master volume ignored: not a finite number");
            return Err(TransportError::InvalidVolume(volume));
        }
        let volume = volume.clamp(0.0, 1.0);
        self.send(VoiceCommand::SetMasterVolume(volume))?;
        self.params.master_volume = volume;
        Ok(())
    }

    // --- Grids ---

    pub fn synth_grid(&self) -> &SharedGrid {
        &self.synth_grid
    }

    pub fn drum_grid(&self) -> &SharedGrid {
        &self.drum_grid
    }

    fn grid(&self, target: GridTarget) -> &SharedGrid {
        match target {
            GridTarget::Synth => &self.synth_grid,
            GridTarget::Drums => &self.drum_grid,
        }
    }

    /// Turn every cell off in both grids.
    pub fn clear_grids(&self) {
        for grid in [&self.synth_grid, &self.drum_grid] {
            grid.write().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    pub fn scroll_position(&self) -> f32 {
        self.scroll_position
    }

    pub fn set_scroll_position(&mut self, position: f32) {
        self.scroll_position = position;
    }

    // --- Snapshots ---

    /// Capture one grid with the current tempo and scroll position.
    pub fn snapshot(&self, target: GridTarget) -> PatternSnapshot {
        // sequencer before grid, the order the clock thread takes them in
        let bpm = self.bpm();
        let grid = read_grid(self.grid(target));
        PatternSnapshot::encode(&grid, bpm, self.scroll_position)
    }

    /// Replace one grid, the tempo and the scroll position from a snapshot.
    pub fn apply_snapshot(&mut self, target: GridTarget, snapshot: &PatternSnapshot) {
        let (rows, columns) = {
            let grid = read_grid(self.grid(target));
            (grid.rows(), grid.columns())
        };
        if !snapshot.matches_dimensions(rows, columns) {
            warn!(
                expected = rows * columns,
                found = snapshot.grid_state.chars().count(),
                "snapshot size differs from grid"
            );
        }
        let decoded = snapshot.decode(rows, columns);
        if decoded.bpm_defaulted {
            warn!(bpm = snapshot.bpm, "snapshot tempo invalid, using default");
        }
        *self.grid(target).write().unwrap_or_else(PoisonError::into_inner) = decoded.grid;
        self.shared.sequencer().set_tempo(decoded.bpm);
        self.scroll_position = decoded.scroll_position;
    }

    pub fn save_snapshot(&self, path: &Path, target: GridTarget) -> Result<(), PersistError> {
        save_snapshot(path, &self.snapshot(target))
    }

    /// Load a snapshot file. A missing or malformed file resets to the
    /// default (120 BPM, empty grid).
    pub fn load_snapshot(&mut self, path: &Path, target: GridTarget) {
        let snapshot = load_snapshot_or_default(path);
        self.apply_snapshot(target, &snapshot);
    }

    // --- Offline rendering ---

    /// Render `steps` steps of the current patterns, tempo and preset with
    /// a private engine. The live output is not affected.
    pub fn render_offline(&self, steps: usize) -> Result<Vec<f32>, TransportError> {
        let sample_rate = self.output.sample_rate();
        let (mut engine, mut sender) = new_engine(&self.config, sample_rate, self.params, &self.kit);
        let mut sequencer = new_sequencer(&self.config, self.bpm(), &self.synth_grid, &self.drum_grid)?;
        Ok(render_steps(&mut engine, &mut sequencer, &mut sender, steps, self.output.channels())?)
    }

    /// Render offline and store the result as a WAV file.
    pub fn render_to_wav(&self, path: &Path, steps: usize) -> Result<(), ExportError> {
        let samples = self.render_offline(steps)?;
        let channels = self.output.channels();
        let channels = u16::try_from(channels).map_err(|_| ExportError::Channels(channels))?;
        write_wav(path, &samples, self.output.sample_rate(), channels)?;
        Ok(())
    }
}

impl<O: AudioOutput> Drop for Workstation<O> {
    fn drop(&mut self) {
        self.halt_clock();
        if let Err(err) = self.output.stop() {
            warn!(%err, "failed to stop audio output");
        }
    }
}
