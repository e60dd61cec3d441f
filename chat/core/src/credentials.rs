//! Credential Storage
//!
//! A small local key/value store holding the completion credential. Its
//! presence or absence is the only signal used to pick a transport; the
//! value's shape is never validated.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use thiserror::Error;

/// Key the completion credential is stored under
pub const DEFAULT_CREDENTIAL_KEY: &str = "openrouter_api_key";

/// Errors writing or reading a credential store
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The backing file could not be read or written
    #[error("Credential file {path:?}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a TOML table of strings
    #[error("Credential file {path:?} is malformed: {reason}")]
    Malformed {
        /// File that failed
        path: PathBuf,
        /// Parse or encode error
        reason: String,
    },
}

/// Local key/value store for credentials
pub trait CredentialStore: Send + Sync {
    /// Read a value; `None` when absent
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] if the backing storage cannot be read
    /// or written.
    fn set(&self, key: &str, value: &str) -> Result<(), CredentialError>;

    /// Remove a value (absent keys are fine)
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] if the backing storage cannot be read
    /// or written.
    fn remove(&self, key: &str) -> Result<(), CredentialError>;
}

/// In-memory credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one value
    #[must_use]
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.values.write().insert(key.into(), value.into());
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CredentialError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CredentialError> {
        self.values.write().remove(key);
        Ok(())
    }
}

/// Credential store backed by a TOML file of string keys
///
/// The file is read on every lookup so external edits are picked up by the
/// next submission. A missing file is an empty store.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store over the given file
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(CredentialError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        toml::from_str(&text).map_err(|e| CredentialError::Malformed {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        let io_err = |source| CredentialError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let text = toml::to_string(values).map_err(|e| CredentialError::Malformed {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        std::fs::write(&self.path, text).map_err(io_err)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.load() {
            Ok(mut values) => values.remove(key),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable credential store");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CredentialError> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> Result<(), CredentialError> {
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}
