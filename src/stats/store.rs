//! Key/value persistence for the session counters.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::StoreError;

/// File name of the counter store inside the data directory.
pub const COUNTER_FILE_NAME: &str = "counters.json";

/// Persistent storage for named counters.
pub trait CounterStore: Send {
    /// Returns the stored value, 0 when the key was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self, key: &str) -> Result<u64, StoreError>;

    /// Persists `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn store(&mut self, key: &str, value: u64) -> Result<(), StoreError>;
}

// ============================================================================
// JsonFileStore
// ============================================================================

/// Counters kept in a single JSON object on disk.
///
/// Each write replaces the file through a temporary file and a rename, so a
/// crash mid-write leaves the previous contents intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at `~/.focustimer/counters.json`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoHomeDirectory` if the home directory is unknown.
    pub fn at_default_path() -> Result<Self, StoreError> {
        let dir = crate::data_dir().ok_or(StoreError::NoHomeDirectory)?;
        Ok(Self::new(dir.join(COUNTER_FILE_NAME)))
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, values: &BTreeMap<String, u64>) -> Result<(), StoreError> {
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_vec_pretty(values).map_err(|e| write_err(e.into()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }
}

impl CounterStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<u64, StoreError> {
        Ok(self.read_all()?.get(key).copied().unwrap_or(0))
    }

    fn store(&mut self, key: &str, value: u64) -> Result<(), StoreError> {
        // A corrupt file is replaced rather than blocking every later write.
        let mut values = match self.read_all() {
            Ok(values) => values,
            Err(e) if e.is_corrupt() => {
                tracing::warn!("{}", e);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        values.insert(key.to_string(), value);
        self.write_all(&values)
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory store for tests and `--no-persist` runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, u64>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `values`.
    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, u64)>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        }
    }
}

impl CounterStore for MemoryStore {
    fn load(&self, key: &str) -> Result<u64, StoreError> {
        Ok(self.values.get(key).copied().unwrap_or(0))
    }

    fn store(&mut self, key: &str, value: u64) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
