//! Named persistence regions for ledger state
//!
//! The ledger keeps two slots with different lifetimes: stock levels live
//! as long as the user's data directory, the production queue only as long
//! as the login session. Both are plain string slots holding JSON, so the
//! ledger stays storage-agnostic and tests can use [`MemoryRegion`].

use crate::error::{SpoolError, SpoolResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// How long a region's contents are retained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Survives restarts
    LongLived,
    /// Cleared when the session ends
    Session,
}

/// A single key-value slot with a retention policy
pub trait PersistenceRegion: Send + Sync {
    /// Region name used in logs and errors
    fn name(&self) -> &str;

    /// Retention policy of this region
    fn retention(&self) -> Retention;

    /// Read the stored value, if any
    fn load(&self) -> SpoolResult<Option<String>>;

    /// Replace the stored value
    fn store(&self, value: &str) -> SpoolResult<()>;

    /// Remove the stored value
    fn clear(&self) -> SpoolResult<()>;
}

/// Unique temp path next to `path`, for write-then-rename
pub(crate) fn temp_sibling(path: &Path) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), n))
}

/// Replace `path` in one step so readers never see a partial file
fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let temp = temp_sibling(path);
    fs::write(&temp, contents)?;
    fs::rename(&temp, path).inspect_err(|_| {
        let _ = fs::remove_file(&temp);
    })
}

/// On-disk form of a session-scoped value
#[derive(Serialize, Deserialize)]
struct SessionSlot {
    session: String,
    data: String,
}

/// Region backed by a single JSON file
///
/// A session region stamps its file with the session that wrote it and
/// reads back empty from any other session, wherever the file lives.
#[derive(Debug, Clone)]
pub struct FileRegion {
    name: String,
    path: PathBuf,
    retention: Retention,
    session: Option<String>,
}

impl FileRegion {
    /// Create a file region
    pub fn new(name: impl Into<String>, path: PathBuf, retention: Retention) -> Self {
        Self {
            name: name.into(),
            path,
            retention,
            session: None,
        }
    }

    /// Long-lived region for stock levels
    pub fn long_lived(path: PathBuf) -> Self {
        Self::new("inventory", path, Retention::LongLived)
    }

    /// Session-scoped region for the production queue, owned by `session_id`
    pub fn session(path: PathBuf, session_id: impl Into<String>) -> Self {
        let mut region = Self::new("queue", path, Retention::Session);
        region.session = Some(session_id.into());
        region
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceRegion for FileRegion {
    fn name(&self) -> &str {
        &self.name
    }

    fn retention(&self) -> Retention {
        self.retention
    }

    fn load(&self) -> SpoolResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)
            .map_err(|e| SpoolError::io(format!("reading {}", self.path.display()), e))?;

        let Some(session) = &self.session else {
            return Ok(Some(raw));
        };

        match serde_json::from_str::<SessionSlot>(&raw) {
            Ok(slot) if slot.session == *session => Ok(Some(slot.data)),
            _ => {
                debug!(
                    "Ignoring {} left by another session at {}",
                    self.name,
                    self.path.display()
                );
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn store(&self, value: &str) -> SpoolResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SpoolError::persist(&self.name, e))?;
        }

        let contents = match &self.session {
            Some(session) => serde_json::to_string(&SessionSlot {
                session: session.clone(),
                data: value.to_string(),
            })?,
            None => value.to_string(),
        };

        write_atomic(&self.path, contents.as_bytes())
            .map_err(|e| SpoolError::persist(&self.name, e))?;
        debug!("Wrote {} bytes to {}", contents.len(), self.path.display());
        Ok(())
    }

    fn clear(&self) -> SpoolResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| SpoolError::persist(&self.name, e))?;
        }
        Ok(())
    }
}

/// In-memory region; clones share the same slot
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    name: String,
    retention: Retention,
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryRegion {
    /// Create an empty memory region
    pub fn new(name: impl Into<String>, retention: Retention) -> Self {
        Self {
            name: name.into(),
            retention,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Current contents, for inspection
    pub fn contents(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl PersistenceRegion for MemoryRegion {
    fn name(&self) -> &str {
        &self.name
    }

    fn retention(&self) -> Retention {
        self.retention
    }

    fn load(&self) -> SpoolResult<Option<String>> {
        Ok(self.contents())
    }

    fn store(&self, value: &str) -> SpoolResult<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(value.to_string());
        Ok(())
    }

    fn clear(&self) -> SpoolResult<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
