use crate::session::Session;
use std::collections::HashMap;
use std::fs;
use std::io::{self, ErrorKind as IoErrorKind};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Persistence backend for server-store session mode (spec.md §4.5).
/// Implementors are responsible for their own internal synchronization;
/// the manager calls these methods directly from request-handling code.
pub trait Store: std::fmt::Debug + Send + Sync {
    fn init(&self) -> Result<(), StoreError>;
    fn read(&self, id: &str) -> Result<Option<Session>, StoreError>;
    fn save(&self, session: &Session) -> Result<(), StoreError>;
    fn delete(&self, id: &str) -> Result<(), StoreError>;
    fn is_exists(&self, id: &str) -> Result<bool, StoreError>;
    /// Removes every session that is past its expiry. Hosts typically
    /// call this from a periodic background task rather than per-request.
    fn cleanup(&self) -> Result<usize, StoreError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("session store io error: {0}")]
    Io(String),
    #[error("stored session data could not be deserialized: {0}")]
    Corrupt(String),
}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// A filesystem-backed [`Store`] that keeps one file per session,
/// named `{prefix}_{id}`, guarded by a single mutex so concurrent
/// requests serialize their reads/writes rather than racing on the
/// filesystem (spec.md §4.5's reference store). The in-memory lock
/// does not span multiple processes; a multi-process deployment needs
/// a different `Store` implementation (e.g. backed by a database).
#[derive(Debug)]
pub struct FilesystemStore {
    dir: PathBuf,
    prefix: String,
    ttl: Duration,
    lock: parking_lot::Mutex<()>,
}

impl FilesystemStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            ttl,
            lock: parking_lot::Mutex::new(()),
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}_{}", self.prefix, id))
    }

    fn is_stale(&self, path: &Path) -> io::Result<bool> {
        let metadata = fs::metadata(path)?;
        let modified = metadata.modified()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        Ok(age > self.ttl)
    }
}

impl Store for FilesystemStore {
    fn init(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    fn read(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let _guard = self.lock.lock();
        let path = self.path_for(id);
        match fs::read(&path) {
            Ok(bytes) => {
                let session: Session = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                if session.is_expired() {
                    let _ = fs::remove_file(&path);
                    Ok(None)
                } else {
                    Ok(Some(session))
                }
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let path = self.path_for(session.id());
        let bytes = serde_json::to_vec(session).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn is_exists(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.path_for(id).exists())
    }

    fn cleanup(&self) -> Result<usize, StoreError> {
        let _guard = self.lock.lock();
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(&format!("{}_", self.prefix)) {
                continue;
            }
            if self.is_stale(&path).unwrap_or(false) {
                if fs::remove_file(&path).is_ok() {
                    removed += 1;
                }
            }
        }
        log::debug!("session cleanup removed {removed} expired file(s) from {:?}", self.dir);
        Ok(removed)
    }
}

/// An in-process [`Store`] useful for tests and single-instance
/// deployments that don't need sessions to survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: parking_lot::Mutex<HashMap<String, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn read(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.lock();
        Ok(sessions.get(id).filter(|s| !s.is_expired()).cloned())
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .insert(session.id().to_string(), session.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.sessions.lock().remove(id);
        Ok(())
    }

    fn is_exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.lock().contains_key(id))
    }

    fn cleanup(&self) -> Result<usize, StoreError> {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok(before - sessions.len())
    }
}
