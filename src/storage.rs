use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::api::models::BearerToken;
use crate::error::Error;

/// The only session data that outlives the process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub token: Option<BearerToken>,
}

/// Durable slot for a single bearer token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<BearerToken>, Error>;
    fn save(&self, token: &BearerToken) -> Result<(), Error>;
    fn clear(&self) -> Result<(), Error>;
}

pub fn config_dir() -> Option<PathBuf> {
    let proj = ProjectDirs::from("com", "example", "Phonebook")?;
    Some(proj.config_dir().to_path_buf())
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

// Owner-only on Unix: the file may hold a bearer token.
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

/// Writes through a sibling temp file so a crash never leaves a torn record.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), Error> {
    ensure_dir(path).map_err(|e| Error::Storage(e.to_string()))?;
    let tmp = path.with_extension("toml.tmp");
    write_private(&tmp, contents).map_err(|e| Error::Storage(format!("tmp write failed: {e}")))?;
    fs::rename(&tmp, path).map_err(|e| Error::Storage(format!("rename failed: {e}")))
}

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Option<PathBuf> {
        Some(config_dir()?.join("session.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<PersistedSession, Error> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PersistedSession::default()),
            Err(e) => return Err(Error::Storage(e.to_string())),
        };
        match toml::from_str::<PersistedSession>(&text) {
            Ok(record) => Ok(record),
            Err(e) => {
                // A corrupt record is equivalent to no record: the user logs in again.
                warn!("ignoring unreadable session file {}: {e}", self.path.display());
                Ok(PersistedSession::default())
            }
        }
    }

    fn write(&self, record: &PersistedSession) -> Result<(), Error> {
        let text = toml::to_string_pretty(record).map_err(|e| Error::Storage(e.to_string()))?;
        write_atomic(&self.path, &text)
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<BearerToken>, Error> {
        Ok(self.read()?.token)
    }

    fn save(&self, token: &BearerToken) -> Result<(), Error> {
        self.write(&PersistedSession {
            token: Some(token.clone()),
        })
    }

    fn clear(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(e.to_string())),
        }
    }
}

/// Process-local store, used when no config directory is available and in tests.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<BearerToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: BearerToken) -> Self {
        Self {
            slot: Mutex::new(Some(token)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<BearerToken>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<BearerToken>, Error> {
        Ok(self.slot().clone())
    }

    fn save(&self, token: &BearerToken) -> Result<(), Error> {
        *self.slot() = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.slot() = None;
        Ok(())
    }
}
