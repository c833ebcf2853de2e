//! On-disk cache of the mirror and its cursor between runs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::store::EntityStore;

/// File name of the snapshot inside the data directory.
pub const SNAPSHOT_FILE: &str = "snapshot.json";

/// The mirror at a given cursor, including unsaved local edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cursor: u64,
    pub store: EntityStore,
}

impl Snapshot {
    pub fn new(cursor: u64, store: EntityStore) -> Self {
        Self { cursor, store }
    }
}

/// Storage for the snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotStorage {
    data_dir: PathBuf,
}

impl SnapshotStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// Loads the snapshot.
    ///
    /// Returns `Ok(None)` if the file doesn't exist.
    pub fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let path = self.path();

        match fs::read(&path) {
            Ok(bytes) => {
                let snapshot = serde_json::from_slice(&bytes)
                    .map_err(|e| SnapshotError::Parse(path, e))?;
                Ok(Some(snapshot))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapshotError::Io(path, e)),
        }
    }

    /// Saves the snapshot, creating the data directory if needed.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| SnapshotError::Io(self.data_dir.clone(), e))?;

        let path = self.path();
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| SnapshotError::Parse(path.clone(), e))?;

        fs::write(&path, json).map_err(|e| SnapshotError::Io(path, e))?;
        Ok(())
    }

    /// Removes the snapshot so the next run replays the whole log.
    pub fn clear(&self) -> Result<(), SnapshotError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SnapshotError::Io(path, e)),
        }
    }
}

/// Errors that can occur while reading or writing the snapshot.
#[derive(Debug)]
pub enum SnapshotError {
    Io(PathBuf, io::Error),
    Parse(PathBuf, serde_json::Error),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            SnapshotError::Parse(path, e) => {
                write!(f, "Invalid snapshot {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Io(_, e) => Some(e),
            SnapshotError::Parse(_, e) => Some(e),
        }
    }
}
