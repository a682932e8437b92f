//! JSON file [`ThresholdStore`].
//!
//! The file holds one object mapping threshold keys to records. Writes go to
//! a temp file in the same directory and are renamed into place.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use super::{AlertError, AlertResult, AlertThreshold, ThresholdStore};

/// Maximum accepted state file size (1 MiB)
const MAX_STATE_FILE_SIZE: u64 = 1024 * 1024;

/// Thresholds persisted in a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Store backed by `path`; the file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> AlertResult<BTreeMap<String, AlertThreshold>> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(AlertError::File(e.to_string())),
        };
        if metadata.len() > MAX_STATE_FILE_SIZE {
            return Err(AlertError::File(format!(
                "state file is {} bytes, limit is {MAX_STATE_FILE_SIZE}",
                metadata.len()
            )));
        }

        let bytes = std::fs::read(&self.path).map_err(|e| AlertError::File(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| AlertError::File(format!("corrupt state file: {e}")))
    }

    fn write_all(&self, records: &BTreeMap<String, AlertThreshold>) -> AlertResult<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| AlertError::File(e.to_string()))?;

        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| AlertError::File(format!("failed to encode thresholds: {e}")))?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| AlertError::File(format!("failed to create temp file: {e}")))?;
        temp_file
            .write_all(&json)
            .and_then(|_| temp_file.flush())
            .and_then(|_| temp_file.as_file().sync_all())
            .map_err(|e| AlertError::File(format!("failed to write temp file: {e}")))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| AlertError::File(format!("failed to persist state file: {e}")))?;

        debug!(path = %self.path.display(), records = records.len(), "threshold file written");
        Ok(())
    }
}

impl ThresholdStore for JsonFileStore {
    fn load(&self, key: &str) -> AlertResult<Option<AlertThreshold>> {
        Ok(self.read_all()?.remove(key))
    }

    fn save(&self, key: &str, threshold: &AlertThreshold) -> AlertResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut records = self.read_all()?;
        records.insert(key.to_string(), threshold.clone());
        self.write_all(&records)?;
        info!(path = %self.path.display(), key, "threshold persisted");
        Ok(())
    }
}
