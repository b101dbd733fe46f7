use crate::dlog;
use crate::types::{StoredWorkout, WorkoutRecord};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Name of the slot holding the whole workout list.
pub const STORAGE_KEY: &str = "workout";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("sqlite storage: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("encoding workouts: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StorageError {
    fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A durable named string slot, in the manner of browser local storage.
pub trait StorageSlot {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key` as a whole.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Non-durable slot, mostly for tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySlot {
    items: HashMap<String, String>,
    writes: usize,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let mut items = HashMap::new();
        items.insert(key.to_string(), value.to_string());
        Self { items, writes: 0 }
    }

    /// Number of successful `set_item` calls.
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl StorageSlot for MemorySlot {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// One `<key>.json` file per slot inside `dir`.
///
/// Writes go to a temp file in the same directory which is then renamed over
/// the target, so a reader sees either the old or the new list.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageSlot for FileSlot {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io("reading", &path, e)),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir)
            .map_err(|e| StorageError::io("creating dir", &self.dir, e))?;

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| StorageError::io("creating temp file in", &self.dir, e))?;
        tmp.write_all(value.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StorageError::io("writing", tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| StorageError::io("replacing", &path, e.error))?;
        Ok(())
    }
}

/// Saves and restores the workout list through a [`StorageSlot`].
#[derive(Debug)]
pub struct PersistenceGateway<S> {
    slot: S,
    key: String,
}

impl<S: StorageSlot> PersistenceGateway<S> {
    pub fn new(slot: S) -> Self {
        Self::with_key(slot, STORAGE_KEY)
    }

    pub fn with_key(slot: S, key: &str) -> Self {
        Self {
            slot,
            key: key.to_string(),
        }
    }

    pub const fn slot(&self) -> &S {
        &self.slot
    }

    pub fn into_slot(self) -> S {
        self.slot
    }

    /// Overwrite the slot with the full list.
    pub fn save(&mut self, records: &[WorkoutRecord]) -> Result<(), StorageError> {
        let stored: Vec<StoredWorkout> = records.iter().map(WorkoutRecord::to_stored).collect();
        let blob = serde_json::to_string(&stored)?;
        self.slot.set_item(&self.key, &blob)?;
        dlog!("saved workouts={} bytes={}", stored.len(), blob.len());
        Ok(())
    }

    /// Read back whatever was saved last.
    ///
    /// Never fails: a missing, unreadable or corrupt slot yields an empty list,
    /// and individual entries that do not decode are skipped.
    pub fn load(&self) -> Vec<StoredWorkout> {
        let blob = match self.slot.get_item(&self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                dlog!("no saved workouts under key={}", self.key);
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(err = %e, key = %self.key, "could not read saved workouts");
                return Vec::new();
            }
        };

        // `null` is what an empty history looked like in older blobs.
        let entries = match serde_json::from_str::<Option<Vec<JsonValue>>>(&blob) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(err = %e, key = %self.key, "discarding unparsable workout history");
                return Vec::new();
            }
        };

        let total = entries.len();
        let out: Vec<StoredWorkout> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| match serde_json::from_value::<StoredWorkout>(v) {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::warn!(index = i, err = %e, "skipping unreadable saved workout");
                    None
                }
            })
            .collect();

        tracing::info!(restored = out.len(), skipped = total - out.len(), "loaded workouts");
        out
    }
}
