//! Persisted client-side credentials.
//!
//! The token and the last-known session snapshot are stored under
//! independent keys so either can be present without the other after a
//! partial restore, survive process restart, and are cleared together on
//! logout. [`FileCredentialStore`] keeps them as JSON files in a
//! caller-chosen directory; [`MemoryCredentialStore`] backs tests.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::warn;

use crate::error::{Result, TrackerError};
use crate::model::Session;

const TOKEN_FILE: &str = "token.json";
const SESSION_FILE: &str = "session.json";

/// Storage for the bearer token and session snapshot.
pub trait CredentialStore: Send + Sync {
    /// Returns the persisted token, if any.
    fn load_token(&self) -> Result<Option<String>>;

    /// Persists the token.
    fn save_token(&self, token: &str) -> Result<()>;

    /// Returns the persisted session snapshot, if any.
    fn load_session(&self) -> Result<Option<Session>>;

    /// Persists the session snapshot.
    fn save_session(&self, session: &Session) -> Result<()>;

    /// Removes both the token and the session snapshot.
    fn clear(&self) -> Result<()>;
}

/// File-backed credential store.
///
/// A corrupt file is treated the same as an absent one (logged, then
/// ignored) so a damaged snapshot degrades to a fresh fetch instead of
/// wedging startup.
#[derive(Debug)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Storage`] if the directory cannot be
    /// created.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            TrackerError::Storage(format!("cannot create {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        let path = self.dir.join(file);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(TrackerError::Storage(format!("cannot read {}: {e}", path.display())));
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "discarding corrupt credential file");
                Ok(None)
            }
        }
    }

    fn write_json<T: serde::Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        let bytes = serde_json::to_vec(value)
            .map_err(|e| TrackerError::Storage(format!("cannot serialize {file}: {e}")))?;
        fs::write(&path, bytes)
            .map_err(|e| TrackerError::Storage(format!("cannot write {}: {e}", path.display())))
    }

    fn remove(&self, file: &str) -> Result<()> {
        let path = self.dir.join(file);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(TrackerError::Storage(format!("cannot remove {}: {e}", path.display())))
            }
        }
    }

    /// Returns the directory backing this store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CredentialStore for FileCredentialStore {
    fn load_token(&self) -> Result<Option<String>> {
        self.read_json(TOKEN_FILE)
    }

    fn save_token(&self, token: &str) -> Result<()> {
        self.write_json(TOKEN_FILE, &token)
    }

    fn load_session(&self) -> Result<Option<Session>> {
        self.read_json(SESSION_FILE)
    }

    fn save_session(&self, session: &Session) -> Result<()> {
        self.write_json(SESSION_FILE, session)
    }

    fn clear(&self) -> Result<()> {
        self.remove(TOKEN_FILE)?;
        self.remove(SESSION_FILE)
    }
}

/// In-memory credential store for tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
    session: RwLock<Option<Session>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn locked<T: Clone>(cell: &RwLock<Option<T>>) -> Result<Option<T>> {
        cell.read()
            .map(|guard| guard.clone())
            .map_err(|_| TrackerError::Storage("credential lock poisoned".into()))
    }

    fn store<T>(cell: &RwLock<Option<T>>, value: Option<T>) -> Result<()> {
        let mut guard =
            cell.write().map_err(|_| TrackerError::Storage("credential lock poisoned".into()))?;
        *guard = value;
        Ok(())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load_token(&self) -> Result<Option<String>> {
        Self::locked(&self.token)
    }

    fn save_token(&self, token: &str) -> Result<()> {
        Self::store(&self.token, Some(token.to_owned()))
    }

    fn load_session(&self) -> Result<Option<Session>> {
        Self::locked(&self.session)
    }

    fn save_session(&self, session: &Session) -> Result<()> {
        Self::store(&self.session, Some(session.clone()))
    }

    fn clear(&self) -> Result<()> {
        Self::store(&self.token, None)?;
        Self::store(&self.session, None)
    }
}
