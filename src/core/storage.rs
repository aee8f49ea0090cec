//! # Durable Storage
//!
//! A string-valued key-value store, standing in for the browser's local
//! storage. Two keys are used:
//!
//! - `conversations`: the full ordered conversation list as a JSON array
//! - `userPreferences`: an opaque JSON object, read at start-up only
//!
//! `FileStore` keeps one file per key under `~/.confab/storage/`. All writes
//! use atomic rename (write `.tmp`, then `rename()`) for crash safety.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::core::conversation::Conversation;

pub const CONVERSATIONS_KEY: &str = "conversations";
pub const PREFERENCES_KEY: &str = "userPreferences";

/// Opaque user preferences. Nothing in this version writes them.
pub type Preferences = Map<String, Value>;

#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Serialize(serde_json::Error),
    /// Backing store is unusable (poisoned lock, invalid key).
    Corrupt(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage I/O error: {e}"),
            StorageError::Serialize(e) => write!(f, "storage encoding error: {e}"),
            StorageError::Corrupt(msg) => write!(f, "storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialize(e)
    }
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ============================================================================
// File-backed store
// ============================================================================

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::Corrupt(format!("invalid key {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

/// Atomically write `contents` to `path` (via `.tmp` + rename).
fn atomic_write(path: &Path, contents: &str) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        atomic_write(&path, value)?;
        debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store. Used in tests and when the storage directory is unusable.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Corrupt("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ============================================================================
// Typed accessors
// ============================================================================

/// Load the conversation list. A missing or unreadable value yields an empty list.
pub fn load_conversations(store: &dyn KeyValueStore) -> Vec<Conversation> {
    let raw = match store.get(CONVERSATIONS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!("Failed to read conversations: {}", e);
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(conversations) => conversations,
        Err(e) => {
            warn!("Stored conversations are corrupt, starting empty: {}", e);
            Vec::new()
        }
    }
}

/// Serialize the whole list and overwrite the stored value.
pub fn save_conversations(
    store: &dyn KeyValueStore,
    conversations: &[Conversation],
) -> Result<(), StorageError> {
    let json = serde_json::to_string(conversations)?;
    store.set(CONVERSATIONS_KEY, &json)
}

/// Load user preferences. Anything that isn't a JSON object reads as empty.
pub fn load_preferences(store: &dyn KeyValueStore) -> Preferences {
    match store.get(PREFERENCES_KEY) {
        Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!("Stored preferences are not an object, ignoring");
                Preferences::new()
            }
            Err(e) => {
                warn!("Stored preferences are corrupt, ignoring: {}", e);
                Preferences::new()
            }
        },
        Ok(None) => Preferences::new(),
        Err(e) => {
            warn!("Failed to read preferences: {}", e);
            Preferences::new()
        }
    }
}
