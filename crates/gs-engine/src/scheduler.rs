//! Step sequencer: walks pattern grids one column per tick and turns
//! active cells into voice commands.
//!
//! This is the pure half of the scheduler. It knows nothing about wall
//! time; a clock (thread or offline loop) calls [`StepSequencer::tick`] at
//! every step boundary and asks [`StepSequencer::bpm`] for the next interval.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

use gs_ir::{Bpm, EnvelopeMode, PatternGrid, PitchKey};
use tracing::{debug, warn};

use crate::command::VoiceSink;

/// Grid handle shared between the editor and the sequencer. The render
/// thread never touches it.
pub type SharedGrid = Arc<RwLock<PatternGrid>>;

/// Wrap a grid for sharing.
pub fn shared_grid(grid: PatternGrid) -> SharedGrid {
    Arc::new(RwLock::new(grid))
}

/// Read a shared grid, recovering from a poisoned lock.
pub fn read_grid(grid: &SharedGrid) -> RwLockReadGuard<'_, PatternGrid> {
    grid.read().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SequencerError {
    #[error("sequencer not ready: no tracks or an empty grid")]
    NotReady,
    #[error("invalid tempo {0}: must be finite and positive")]
    InvalidBpm(f32),
    #[error("track has {found} columns, sequencer has {expected}")]
    ColumnMismatch { expected: usize, found: usize },
}

/// Transport state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// How a track's rows map to sound.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrackKind {
    /// Row `r` plays pitch `base + (rows - 1 - r)`: the top row is highest.
    Melodic { base: PitchKey, mode: EnvelopeMode },
    /// Row `r` triggers drum lane `r`.
    Drums,
}

/// One grid bound to one sound source.
#[derive(Debug)]
pub struct Track {
    kind: TrackKind,
    grid: SharedGrid,
    /// Rows that issued a note-on at the previous tick.
    sounding: Vec<bool>,
}

impl Track {
    pub fn melodic(grid: SharedGrid, base: PitchKey, mode: EnvelopeMode) -> Self {
        Self::new(TrackKind::Melodic { base, mode }, grid)
    }

    pub fn drums(grid: SharedGrid) -> Self {
        Self::new(TrackKind::Drums, grid)
    }

    fn new(kind: TrackKind, grid: SharedGrid) -> Self {
        let rows = read_grid(&grid).rows();
        Self { kind, grid, sounding: vec![false; rows] }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn grid(&self) -> &SharedGrid {
        &self.grid
    }

    /// Pitch played by `row`, if it is representable.
    pub fn pitch_for_row(&self, row: usize) -> Option<PitchKey> {
        let TrackKind::Melodic { base, .. } = self.kind else {
            return None;
        };
        let rows = self.sounding.len();
        let offset = rows.checked_sub(row + 1)?;
        base.transpose(i16::try_from(offset).ok()?)
    }

    fn columns(&self) -> usize {
        read_grid(&self.grid).columns()
    }

    fn tick(&mut self, column: usize, sink: &mut impl VoiceSink) {
        let grid = read_grid(&self.grid);
        match self.kind {
            TrackKind::Melodic { mode, .. } => {
                for row in 0..self.sounding.len() {
                    let active = grid.get(row, column);
                    let was_sounding = self.sounding[row];
                    let Some(key) = self.pitch_for_row(row) else { continue };
                    if active {
                        sink.note_on(key, key.frequency(), mode);
                    } else if was_sounding {
                        sink.note_off(key);
                    }
                    self.sounding[row] = active;
                }
            }
            TrackKind::Drums => {
                for row in 0..grid.rows() {
                    if grid.get(row, column) {
                        sink.trigger_drum(row);
                    }
                }
            }
        }
    }

    fn silence(&mut self) {
        self.sounding.fill(false);
    }
}

/// Cursor, tempo and transport for a set of tracks sharing one column count.
#[derive(Debug)]
pub struct StepSequencer {
    state: TransportState,
    cursor: usize,
    columns: usize,
    bpm: Bpm,
    tracks: Vec<Track>,
    /// Column of the most recent tick, for the UI highlight.
    last_column: Option<usize>,
}

impl StepSequencer {
    pub fn new(bpm: Bpm) -> Self {
        Self {
            state: TransportState::Stopped,
            cursor: 0,
            columns: 0,
            bpm,
            tracks: Vec::new(),
            last_column: None,
        }
    }

    /// Attach a track. The first track fixes the column count; later tracks
    /// must match it.
    pub fn add_track(&mut self, track: Track) -> Result<(), SequencerError> {
        let found = track.columns();
        if self.tracks.is_empty() {
            self.columns = found;
        } else if found != self.columns {
            return Err(SequencerError::ColumnMismatch { expected: self.columns, found });
        }
        self.tracks.push(track);
        Ok(())
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn bpm(&self) -> Bpm {
        self.bpm
    }

    /// Wall-clock length of the next step at the current tempo.
    pub fn step_interval(&self) -> Duration {
        Duration::from_secs_f64(f64::from(self.bpm.step_interval_secs()))
    }

    /// Column shown as active, if any.
    pub fn highlighted_column(&self) -> Option<usize> {
        self.last_column
    }

    /// At least one track and no empty grid.
    pub fn is_ready(&self) -> bool {
        self.columns > 0
            && !self.tracks.is_empty()
            && self.tracks.iter().all(|t| !t.sounding.is_empty())
    }

    /// Start from column 0. Already playing is reported and ignored.
    pub fn play(&mut self) -> Result<(), SequencerError> {
        if !self.is_ready() {
            warn!(tracks = self.tracks.len(), columns = self.columns, "play rejected: sequencer not ready");
            return Err(SequencerError::NotReady);
        }
        if self.state == TransportState::Playing {
            warn!("play ignored: already playing");
            return Ok(());
        }
        self.cursor = 0;
        self.state = TransportState::Playing;
        debug!(bpm = self.bpm.get(), "transport playing");
        Ok(())
    }

    /// Freeze the cursor. Sounding voices are left alone.
    pub fn pause(&mut self) {
        if self.state != TransportState::Playing {
            warn!(state = ?self.state, "pause ignored: not playing");
            return;
        }
        self.state = TransportState::Paused;
        debug!(cursor = self.cursor, "transport paused");
    }

    /// Continue from the frozen cursor.
    pub fn resume(&mut self) {
        if self.state != TransportState::Paused {
            warn!(state = ?self.state, "resume ignored: not paused");
            return;
        }
        self.state = TransportState::Playing;
        debug!(cursor = self.cursor, "transport resumed");
    }

    /// Silence everything at once, rewind and clear the highlight.
    pub fn stop(&mut self, sink: &mut impl VoiceSink) {
        if self.state == TransportState::Stopped {
            warn!("stop ignored: already stopped");
            return;
        }
        sink.all_notes_off(true);
        self.tracks.iter_mut().for_each(Track::silence);
        self.cursor = 0;
        self.last_column = None;
        self.state = TransportState::Stopped;
        debug!("transport stopped");
    }

    /// Change tempo. Takes effect from the next step boundary.
    pub fn set_bpm(&mut self, bpm: f32) -> Result<(), SequencerError> {
        match Bpm::new(bpm) {
            Some(valid) => {
                self.set_tempo(valid);
                Ok(())
            }
            None => {
                warn!(bpm, "tempo change rejected");
                Err(SequencerError::InvalidBpm(bpm))
            }
        }
    }

    /// Change to an already validated tempo, from the next step boundary.
    pub fn set_tempo(&mut self, bpm: Bpm) {
        self.bpm = bpm;
    }

    /// Play the column under the cursor, then advance it. Returns the column
    /// played, or `None` when not playing.
    pub fn tick(&mut self, sink: &mut impl VoiceSink) -> Option<usize> {
        if self.state != TransportState::Playing || self.columns == 0 {
            return None;
        }
        let column = self.cursor;
        for track in &mut self.tracks {
            track.tick(column, sink);
        }
        self.last_column = Some(column);
        self.cursor = (self.cursor + 1) % self.columns;
        Some(column)
    }
}
