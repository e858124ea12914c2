//! Flat pattern + tempo snapshot exchanged with the persistence layer.
//!
//! Wire form (JSON):
//!
//! ```json
//! { "bpm": 120.0, "gridState": "1000...", "scrollPosition": 0.0 }
//! ```

use alloc::string::String;
use serde::{Deserialize, Serialize};

use crate::grid::PatternGrid;
use crate::tempo::{Bpm, DEFAULT_BPM};

/// Errors reading or writing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The text is not valid snapshot JSON.
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Serialized playback state: tempo, grid bits, and a UI scroll offset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSnapshot {
    pub bpm: f32,
    /// `'0'`/`'1'` per cell, row-major, `rows * columns` long.
    #[serde(default)]
    pub grid_state: String,
    /// Passed through untouched for the UI.
    #[serde(default)]
    pub scroll_position: f32,
}

/// A snapshot applied to a grid of known dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedSnapshot {
    pub grid: PatternGrid,
    pub bpm: Bpm,
    pub scroll_position: f32,
    /// True if the stored BPM was invalid and the default was used.
    pub bpm_defaulted: bool,
}

impl Default for PatternSnapshot {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            grid_state: String::new(),
            scroll_position: 0.0,
        }
    }
}

impl PatternSnapshot {
    /// Capture a grid and tempo.
    pub fn encode(grid: &PatternGrid, bpm: Bpm, scroll_position: f32) -> Self {
        Self {
            bpm: bpm.get(),
            grid_state: grid.to_bit_string(),
            scroll_position,
        }
    }

    /// Parse the JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the JSON wire form (pretty-printed).
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(SnapshotError::Encode)
    }

    /// Apply this snapshot to a grid of `rows x columns`.
    ///
    /// An invalid BPM falls back to the default tempo. See
    /// [`PatternGrid::from_bit_str`] for how mismatched lengths are handled.
    pub fn decode(&self, rows: usize, columns: usize) -> DecodedSnapshot {
        let parsed = Bpm::new(self.bpm);
        DecodedSnapshot {
            grid: PatternGrid::from_bit_str(rows, columns, &self.grid_state),
            bpm: parsed.unwrap_or_default(),
            scroll_position: if self.scroll_position.is_finite() { self.scroll_position } else { 0.0 },
            bpm_defaulted: parsed.is_none(),
        }
    }

    /// True if `grid_state` has exactly `rows * columns` characters.
    pub fn matches_dimensions(&self, rows: usize, columns: usize) -> bool {
        self.grid_state.chars().count() == rows * columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_single_cell() {
        let snap = PatternSnapshot::from_json(
            r#"{"bpm":140,"gridState":"1000","scrollPosition":0}"#,
        )
        .unwrap();
        let decoded = snap.decode(1, 1);
        assert_eq!(decoded.bpm.get(), 140.0);
        assert_eq!(decoded.grid.rows(), 1);
        assert_eq!(decoded.grid.columns(), 1);
        assert!(decoded.grid.get(0, 0));
        assert!(!decoded.bpm_defaulted);
    }

    #[test]
    fn round_trip_reproduces_grid_and_bpm() {
        let mut grid = PatternGrid::new(4, 4);
        grid.set(0, 0, true);
        grid.set(3, 2, true);
        let bpm = Bpm::new(97.5).unwrap();

        let json = PatternSnapshot::encode(&grid, bpm, 0.25).to_json().unwrap();
        let decoded = PatternSnapshot::from_json(&json).unwrap().decode(4, 4);

        assert_eq!(decoded.grid, grid);
        assert_eq!(decoded.bpm, bpm);
        assert_eq!(decoded.scroll_position, 0.25);
    }

    #[test]
    fn uses_camel_case_field_names() {
        let json = PatternSnapshot::default().to_json().unwrap();
        assert!(json.contains("\"gridState\""));
        assert!(json.contains("\"scrollPosition\""));
    }

    #[test]
    fn invalid_bpm_falls_back_to_default() {
        let snap = PatternSnapshot { bpm: 0.0, grid_state: "1".into(), scroll_position: 0.0 };
        let decoded = snap.decode(1, 1);
        assert_eq!(decoded.bpm.get(), DEFAULT_BPM);
        assert!(decoded.bpm_defaulted);
    }

    #[test]
    fn missing_grid_state_is_empty_grid() {
        let snap = PatternSnapshot::from_json(r#"{"bpm":128}"#).unwrap();
        let decoded = snap.decode(2, 4);
        assert_eq!(decoded.grid.active_count(), 0);
        assert!(!snap.matches_dimensions(2, 4));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(PatternSnapshot::from_json("{not json").is_err());
        assert!(PatternSnapshot::from_json(r#"{"gridState":"1"}"#).is_err());
    }

    #[test]
    fn default_snapshot() {
        let decoded = PatternSnapshot::default().decode(5, 16);
        assert_eq!(decoded.bpm.get(), 120.0);
        assert_eq!(decoded.grid, PatternGrid::new(5, 16));
    }
}
