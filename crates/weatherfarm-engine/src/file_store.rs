//! File-backed preference store.
//!
//! Values live in memory and are written as one JSON object on `flush`,
//! using a temp file + rename so a crash never leaves a half-written store.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use weatherfarm_common::{StoreError, StoreResult};
use weatherfarm_gameplay::{PrefStore, PrefValue};

/// Preference store persisted to a JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, PrefValue>,
    dirty: bool,
}

impl FileStore {
    /// Opens the store at `path`.
    ///
    /// A missing file opens empty. A corrupt file is logged and also opens
    /// empty; it is replaced on the next flush.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match Self::read(&path) {
            Ok(Some(values)) => {
                info!("Loaded {} preferences from {}", values.len(), path.display());
                values
            },
            Ok(None) => {
                info!("No preference file at {}, starting empty", path.display());
                BTreeMap::new()
            },
            Err(e) => {
                warn!("Ignoring unreadable preference file {}: {e}", path.display());
                BTreeMap::new()
            },
        };
        Self {
            path,
            values,
            dirty: false,
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> StoreResult<Option<BTreeMap<String, PrefValue>>> {
        if !path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader)
            .map(Some)
            .map_err(|e| StoreError::Corrupted(e.to_string()))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn atomic_write(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.temp_path();
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &self.values)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            writer.flush()?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StoreError::Io(e)
        })
    }
}

impl PrefStore for FileStore {
    fn get(&self, key: &str) -> Option<&PrefValue> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: PrefValue) {
        self.values.insert(key.to_string(), value);
        self.dirty = true;
    }

    fn delete(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.dirty = true;
        }
    }

    fn flush(&mut self) -> StoreResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.atomic_write()?;
        self.dirty = false;
        debug!("Flushed {} preferences to {}", self.values.len(), self.path.display());
        Ok(())
    }
}
