#![forbid(unsafe_code)]

//! External collaborator contracts: the Lead Store and the persisted
//! key-value store.
//!
//! The board consumes these through narrow traits so hosts can plug in
//! their REST client and preference storage. [`MemoryStore`] backs tests
//! and ephemeral sessions; [`FileStore`] is a JSON-map-on-disk store for
//! hosts without their own preference backend.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use leadboard_core::{Lead, LeadId, Stage};

/// Error at the host storage boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// HTTP status, when the failure came from the Lead Store.
    pub status: Option<u16>,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "store error ({status}): {}", self.message),
            None => write!(f, "store error: {}", self.message),
        }
    }
}

impl std::error::Error for StoreError {}

/// The lead CRUD backend, consumed as an interface only.
pub trait LeadStore {
    /// Full refresh source for the working set.
    fn list_leads(&self, filter: &str) -> Result<Vec<Lead>, StoreError>;

    /// The confirmation call. Idempotent server-side: re-issuing the same
    /// target stage is a no-op.
    fn patch_lead_stage(&mut self, lead_id: LeadId, stage: Stage) -> Result<(), StoreError>;
}

/// Persisted key-value store for view preferences (collapse state).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory key-value store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON-map-on-disk key-value store: loaded once on open, written through
/// on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    /// Open (or create) a store at `path`. A missing file starts empty; a
    /// malformed file is an error rather than silent data loss.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| StoreError::new(format!("malformed store file: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::new(format!("read {}: {e}", path.display()))),
        };
        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.entries)
            .map_err(|e| StoreError::new(format!("serialize store: {e}")))?;
        fs::write(&self.path, raw)
            .map_err(|e| StoreError::new(format!("write {}: {e}", self.path.display())))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}
