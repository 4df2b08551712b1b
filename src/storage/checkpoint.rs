//! Frontier checkpoint persistence
//!
//! The checkpoint is a JSON record with the waiting queue in dispatch order and the
//! seen set as a map from URL to `true`. It is written only at shutdown and read
//! only at startup.

use crate::state::FrontierState;
use crate::storage::traits::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// On-disk layout of a checkpoint
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointRecord {
    waiting: Vec<String>,
    seen: BTreeMap<String, bool>,
}

impl From<&FrontierState> for CheckpointRecord {
    fn from(state: &FrontierState) -> Self {
        Self {
            waiting: state.waiting().map(str::to_string).collect(),
            seen: state.seen().map(|url| (url.to_string(), true)).collect(),
        }
    }
}

/// Reads and writes the frontier checkpoint file
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the checkpoint file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the checkpoint, if there is a usable one
    ///
    /// A missing or unreadable file yields `Ok(None)`, meaning the crawl starts
    /// fresh from its seed. A file that can be read but not decoded, or whose
    /// waiting queue is not contained in its seen set, is reported as
    /// `StorageError::CorruptCheckpoint`.
    pub fn load(&self) -> StorageResult<Option<FrontierState>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("No checkpoint at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(
                    "Checkpoint {} is unreadable, ignoring it: {}",
                    self.path.display(),
                    e
                );
                return Ok(None);
            }
        };

        let record: CheckpointRecord =
            serde_json::from_slice(&bytes).map_err(|e| StorageError::CorruptCheckpoint {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let waiting: VecDeque<String> = record.waiting.into_iter().collect();
        let seen: HashSet<String> = record
            .seen
            .into_iter()
            .filter_map(|(url, present)| present.then_some(url))
            .collect();

        let state = FrontierState::from_parts(waiting, seen).ok_or_else(|| {
            StorageError::CorruptCheckpoint {
                path: self.path.clone(),
                reason: "waiting queue contains URLs missing from the seen set".to_string(),
            }
        })?;

        tracing::info!(
            "Loaded checkpoint {}: {} waiting, {} seen",
            self.path.display(),
            state.waiting_len(),
            state.seen_len()
        );

        Ok(Some(state))
    }

    /// Saves the full frontier, atomically replacing any previous checkpoint
    ///
    /// The record is written to a temporary file next to the checkpoint, synced,
    /// and renamed over the old file, so readers see either the old or the new
    /// checkpoint in full.
    pub fn save(&self, state: &FrontierState) -> StorageResult<()> {
        let record = CheckpointRecord::from(state);
        let json = serde_json::to_vec(&record)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| StorageError::io(&dir, e))?;
        tmp.write_all(&json)
            .and_then(|()| tmp.flush())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StorageError::io(&self.path, e.error))?;

        tracing::info!(
            "Saved checkpoint {}: {} waiting, {} seen",
            self.path.display(),
            state.waiting_len(),
            state.seen_len()
        );

        Ok(())
    }
}
