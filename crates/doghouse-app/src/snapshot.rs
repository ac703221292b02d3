//! Crash-safe snapshot codec.
//!
//! The whole live state -- every session's dogs (with their tokens) and every
//! session's loot store -- is serialized to JSON and written to a temp file
//! in the destination directory, then renamed over the destination so readers
//! only ever observe a complete file. The payload carries a BLAKE3 hex digest
//! of the serialized state; a file that is missing, empty, unparsable, or has
//! a digest mismatch is treated as "no state".

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use doghouse_model::geom::{Direction, Vec2};
use doghouse_model::loot::LootStore;
use doghouse_model::map::MapId;

use crate::registry::Token;

/// Errors produced while writing or reading the state file.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("state file i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("state serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Everything needed to rebuild one player and their dog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DogRecord {
    pub id: u64,
    pub name: String,
    pub token: Token,
    pub map_id: MapId,
    pub position: Vec2,
    pub speed: Vec2,
    pub direction: Direction,
    pub bag_capacity: usize,
    pub bag: Vec<u64>,
    pub score: u64,
    pub game_time_ms: u64,
    pub standing_time_ms: u64,
    pub retired: bool,
}

/// One session's loot store, restored wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootRecord {
    pub map_id: MapId,
    pub store: LootStore,
}

/// The full persisted state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub players: Vec<DogRecord>,
    pub loot: Vec<LootRecord>,
}

/// On-disk wrapper: the state plus its integrity digest.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    /// BLAKE3 hex digest (64 lowercase hex chars) of the serialized state.
    hash: String,
    state: StateSnapshot,
}

fn digest(state: &StateSnapshot) -> Result<String, SnapshotError> {
    let bytes = serde_json::to_vec(state)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Serialize `state` next to `path` and atomically rename it into place.
pub fn write_atomic(path: &Path, state: &StateSnapshot) -> Result<(), SnapshotError> {
    let file = SnapshotFile { hash: digest(state)?, state: state.clone() };
    let bytes = serde_json::to_vec(&file)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), players = file.state.players.len(), "state saved");
    Ok(())
}

/// Read the state file. `Ok(None)` covers every "no usable state" case:
/// missing file, empty file, malformed JSON, digest mismatch.
pub fn read(path: &Path) -> Result<Option<StateSnapshot>, SnapshotError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let file: SnapshotFile = match serde_json::from_slice(&bytes) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "state file unreadable, ignoring");
            return Ok(None);
        }
    };
    if digest(&file.state)? != file.hash {
        tracing::warn!(path = %path.display(), "state file digest mismatch, ignoring");
        return Ok(None);
    }
    Ok(Some(file.state))
}
