//! Snapshot files on disk.

use std::path::Path;

use gs_ir::PatternSnapshot;
use tracing::{info, warn};

use crate::error::PersistError;

/// Write `snapshot` as pretty JSON.
pub fn save_snapshot(path: &Path, snapshot: &PatternSnapshot) -> Result<(), PersistError> {
    let json = snapshot.to_json()?;
    std::fs::write(path, json).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "snapshot saved");
    Ok(())
}

/// Read and parse a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<PatternSnapshot, PersistError> {
    let json = std::fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PatternSnapshot::from_json(&json)?)
}

/// Read a snapshot, falling back to the default (120 BPM, empty grid) when
/// the file is missing or malformed.
pub fn load_snapshot_or_default(path: &Path) -> PatternSnapshot {
    match read_snapshot(path) {
        Ok(snapshot) => {
            info!(path = %path.display(), "snapshot loaded");
            snapshot
        }
        Err(err) => {
            warn!(%err, "snapshot unavailable, using defaults");
            PatternSnapshot::default()
        }
    }
}
