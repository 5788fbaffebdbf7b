//! Checkpoint persistence.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use tenk_core::{Checkpoint, CheckpointStore, Result, TenkError};

/// Current time in Unix milliseconds.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Checkpoint stored as a JSON file.
///
/// Saves go to a temporary sibling first and are renamed into place, so a
/// crash mid-save leaves the previous checkpoint intact.
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&mut self) -> Result<Checkpoint> {
        if !self.path.exists() {
            debug!("No checkpoint at {}, starting fresh", self.path.display());
            return Ok(Checkpoint::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            TenkError::checkpoint(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let checkpoint: Checkpoint = serde_json::from_str(&content).map_err(|e| {
            TenkError::checkpoint(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;

        debug!(
            "Loaded checkpoint with {} processed ids from {}",
            checkpoint.len(),
            self.path.display()
        );
        Ok(checkpoint)
    }

    fn save(&mut self, checkpoint: &mut Checkpoint) -> Result<()> {
        checkpoint.last_updated = now_millis();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TenkError::checkpoint(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(checkpoint)?;
        let temp = self.temp_path();
        std::fs::write(&temp, json)
            .and_then(|_| std::fs::rename(&temp, &self.path))
            .map_err(|e| {
                TenkError::checkpoint(format!("Failed to write {}: {}", self.path.display(), e))
            })?;

        debug!("Saved checkpoint with {} processed ids", checkpoint.len());
        Ok(())
    }
}

/// In-memory checkpoint store. Clones share state, which lets a test
/// resume a batch against what an earlier run saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    state: Arc<Mutex<Checkpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved checkpoint.
    pub fn snapshot(&self) -> Checkpoint {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&mut self) -> Result<Checkpoint> {
        self.state
            .lock()
            .map(|state| state.clone())
            .map_err(|_| TenkError::checkpoint("memory checkpoint poisoned"))
    }

    fn save(&mut self, checkpoint: &mut Checkpoint) -> Result<()> {
        checkpoint.last_updated = now_millis();
        let mut state = self
            .state
            .lock()
            .map_err(|_| TenkError::checkpoint("memory checkpoint poisoned"))?;
        *state = checkpoint.clone();
        Ok(())
    }
}
