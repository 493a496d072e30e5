//! Result store: the single "last result" slot the display surface reads.
//!
//! The slot is last-writer-wins. Two overlapping attempts (only possible with
//! [`crate::config::AttemptPolicy::Allow`]) both write, and whichever finishes
//! second is what the display shows. Each record carries the attempt id that
//! wrote it, so a reader can tell which attempt it is looking at.

use crate::error::AutoPdfError;
use crate::output::PersistedResult;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

/// Persistence for the most recent result.
pub trait ResultStore: Send + Sync {
    /// Overwrite the slot.
    fn save(&self, record: &PersistedResult) -> Result<(), AutoPdfError>;

    /// Read the slot; `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<PersistedResult>, AutoPdfError>;
}

/// JSON file on disk, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data-local-dir>/autopdf/last_result.json`, falling back to the
    /// working directory on platforms without one.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("autopdf"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("last_result.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_err(&self, source: std::io::Error) -> AutoPdfError {
        AutoPdfError::StoreWrite {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResultStore for JsonFileStore {
    fn save(&self, record: &PersistedResult) -> Result<(), AutoPdfError> {
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| AutoPdfError::Internal(format!("serialising result: {e}")))?;

        // Temp file in the target directory so the rename stays on one filesystem.
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.write_err(e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.write_err(e))?;
        tmp.write_all(&json).map_err(|e| self.write_err(e))?;
        tmp.persist(&self.path).map_err(|e| self.write_err(e.error))?;

        debug!("Stored result for '{}' in {}", record.last_key, self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedResult>, AutoPdfError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AutoPdfError::StoreRead {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| AutoPdfError::StoreCorrupt {
                path: self.path.clone(),
                detail: e.to_string(),
            })
    }
}

/// In-process store, for tests and embedders that keep results in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<PersistedResult>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ResultStore for MemoryStore {
    fn save(&self, record: &PersistedResult) -> Result<(), AutoPdfError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| AutoPdfError::Internal("result store lock poisoned".into()))?;
        *slot = Some(record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedResult>, AutoPdfError> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| AutoPdfError::Internal("result store lock poisoned".into()))?;
        Ok(slot.clone())
    }
}
