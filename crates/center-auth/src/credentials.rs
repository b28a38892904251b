//! Session storage for the admin credential
//!
//! Holds at most one credential (username + bearer token). The file-backed
//! store keeps it in a small JSON document under the two well-known keys
//! `admin_token` and `admin_username`, so a session survives restarts.
//! All writes use atomic temp-file + rename and 0600 permissions.
//!
//! The token is stored unencrypted; anything that can read the file as this
//! user can replay the session until the backend expires it.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use common::Secret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// The authenticated admin: canonical username plus an opaque bearer token.
///
/// The token is never inspected by the client, only forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub token: Secret<String>,
}

impl Credential {
    pub fn new(username: impl Into<String>, token: impl Into<Secret<String>>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }
}

/// Single-slot credential storage.
///
/// `load` never fails: an absent or unreadable slot is simply `None`.
/// `save` overwrites and `clear` is safe on an empty slot.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<Credential>;

    fn save(&self, credential: &Credential) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// On-disk layout: the two keys the browser client used in local storage.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    admin_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    admin_username: Option<String>,
}

impl StoredSession {
    fn into_credential(self) -> Option<Credential> {
        match (self.admin_token, self.admin_username) {
            (Some(token), Some(username)) if !token.is_empty() && !username.is_empty() => {
                Some(Credential::new(username, token))
            }
            _ => None,
        }
    }
}

/// File-backed session store.
///
/// The file is read once at `open`; afterwards the in-memory copy is
/// authoritative and every mutation is written through.
pub struct FileSessionStore {
    path: PathBuf,
    slot: Mutex<Option<Credential>>,
}

impl FileSessionStore {
    /// Open the store at `path`, restoring any persisted credential.
    ///
    /// A missing file is a cold start. A corrupt or half-written record is
    /// logged and treated as absent; it is overwritten by the next `save`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let slot = read_slot(&path);
        Self {
            path,
            slot: Mutex::new(slot),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Credential>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_slot(path: &Path) -> Option<Credential> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no persisted session");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "session file unreadable, starting signed out");
            return None;
        }
    };

    match serde_json::from_str::<StoredSession>(&contents) {
        Ok(stored) => {
            let credential = stored.into_credential();
            match &credential {
                Some(c) => info!(path = %path.display(), username = %c.username, "restored persisted session"),
                None => warn!(path = %path.display(), "session file incomplete, ignoring"),
            }
            credential
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "session file corrupt, ignoring");
            None
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Credential> {
        self.lock().clone()
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        let mut slot = self.lock();
        let stored = StoredSession {
            admin_token: Some(credential.token.expose().clone()),
            admin_username: Some(credential.username.clone()),
        };
        write_atomic(&self.path, &stored)?;
        *slot = Some(credential.clone());
        debug!(username = %credential.username, "saved session");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self.lock();
        *slot = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "cleared session");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not remove session file, blanking it");
                blank_in_place(&self.path).map_err(|blank_err| {
                    Error::Storage(format!(
                        "removing session file {}: {e}; blanking it: {blank_err}",
                        self.path.display()
                    ))
                })
            }
        }
    }
}

/// Non-durable store; the session ends with the process.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Credential>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a credential, as if persisted by an earlier run.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Credential>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Credential> {
        self.lock().clone()
    }

    fn save(&self, credential: &Credential) -> Result<()> {
        *self.lock() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock() = None;
        Ok(())
    }
}

/// Overwrite the record with an empty one so it loads as absent.
///
/// Truncating in place needs write access to the file only, not to its
/// directory, so it still works where unlink and rename are refused.
fn blank_in_place(path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string(&StoredSession::default())?;
    std::fs::write(path, json.as_bytes())
}

/// Write the session record atomically.
///
/// Writes a temp file next to the target and renames it over, so a crash
/// mid-write never leaves a truncated token behind. Permissions are 0600
/// since the file holds a bearer token.
fn write_atomic(path: &Path, stored: &StoredSession) -> Result<()> {
    let json = serde_json::to_string_pretty(stored)
        .map_err(|e| Error::Storage(format!("serializing session: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Storage("session path has no parent directory".into()))?;
    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Storage(format!("creating {}: {e}", dir.display())))?;
    }

    let tmp_path = dir.join(format!(".session.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, json.as_bytes())
        .map_err(|e| Error::Storage(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&tmp_path, perms)
            .map_err(|e| Error::Storage(format!("setting session file permissions: {e}")))?;
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::Storage(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted session");
    Ok(())
}
