//! Render engine: the per-buffer synthesis routine.

use gs_ir::SynthParams;

use crate::command::{command_queue, CommandReceiver, CommandSender, VoiceCommand};
use crate::drum_bank::DrumBank;
use crate::effects::{sanitize, EffectsChain};
use crate::voice_pool::{RetriggerPolicy, VoicePool};

/// Fills interleaved output buffers. Implemented by the engine and driven
/// by whatever audio backend is in use.
pub trait AudioRender: Send {
    /// Overwrite `output` (interleaved, `channels` per frame).
    fn render(&mut self, output: &mut [f32], channels: usize);
}

/// Construction parameters for [`Engine`].
#[derive(Clone, Copy, Debug)]
pub struct EngineSettings {
    pub sample_rate: u32,
    pub params: SynthParams,
    pub retrigger: RetriggerPolicy,
    pub command_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            params: SynthParams::default(),
            retrigger: RetriggerPolicy::default(),
            command_capacity: crate::command::DEFAULT_COMMAND_CAPACITY,
        }
    }
}

/// The synthesis engine.
///
/// Each pass: drop voices that finished last pass, apply queued commands,
/// then synthesize. Everything it touches is preallocated, so a pass never
/// allocates, blocks or takes a lock.
pub struct Engine {
    sample_rate: u32,
    /// Seconds per frame.
    dt: f64,
    params: SynthParams,
    voices: VoicePool,
    drums: DrumBank,
    effects: EffectsChain,
    commands: CommandReceiver,
}

impl Engine {
    /// Build an engine and the sender that feeds it.
    pub fn new(settings: EngineSettings, drums: DrumBank) -> (Self, CommandSender) {
        let (sender, commands) = command_queue(settings.command_capacity, drums.lane_count());
        let params = settings.params;
        let engine = Self {
            sample_rate: settings.sample_rate,
            dt: if settings.sample_rate > 0 { 1.0 / settings.sample_rate as f64 } else { 0.0 },
            params,
            voices: VoicePool::new(settings.sample_rate, settings.retrigger),
            drums,
            effects: EffectsChain::new(params.distortion, params.cutoff),
            commands,
        };
        (engine, sender)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    pub fn voices(&self) -> &VoicePool {
        &self.voices
    }

    pub fn drums(&self) -> &DrumBank {
        &self.drums
    }

    /// Reap finished voices, then apply every queued command.
    fn begin_pass(&mut self) {
        self.voices.reap_finished();
        while let Some(command) = self.commands.pop() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: VoiceCommand) {
        match command {
            VoiceCommand::NoteOn { key, frequency, mode } => {
                self.voices.note_on(key, frequency, mode, &self.params)
            }
            VoiceCommand::NoteOff { key } => self.voices.note_off(key),
            VoiceCommand::AllNotesOff { immediate } => {
                self.voices.all_notes_off(immediate);
                if immediate {
                    self.drums.stop_all();
                    self.effects.reset();
                }
            }
            // Lanes were range-checked by the sender.
            VoiceCommand::TriggerDrum { lane } => {
                self.drums.trigger(lane);
            }
            VoiceCommand::SetParams(params) => {
                self.params = params;
                self.effects.set_params(params.distortion, params.cutoff);
            }
            VoiceCommand::SetMasterVolume(volume) => self.params.master_volume = volume,
        }
    }

    /// One output frame, already clamped.
    #[inline]
    fn next_frame(&mut self) -> f32 {
        let synth = self.voices.next_sample(&self.params, self.dt) * self.params.master_volume;
        let wet = self.effects.process(synth);
        sanitize(wet + self.drums.next_sample(self.dt))
    }

    fn render_pass(&mut self, output: &mut [f32], channels: usize) {
        self.begin_pass();
        if channels == 0 {
            return;
        }
        for frame in output.chunks_mut(channels) {
            let sample = self.next_frame();
            frame.fill(sample);
        }
    }

    /// Render `frames` frames into a fresh interleaved buffer. For offline
    /// use only; this allocates.
    pub fn render_frames(&mut self, frames: usize, channels: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * channels];
        self.render(&mut out, channels);
        out
    }
}

impl AudioRender for Engine {
    fn render(&mut self, output: &mut [f32], channels: usize) {
        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.render_pass(output, channels));
        #[cfg(not(feature = "alloc_check"))]
        self.render_pass(output, channels);
    }
}
