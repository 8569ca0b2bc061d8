use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::{Result, ScrobbleError};
use super::service::SessionKey;

/// TOML file with the Last.fm session key and user name.
#[derive(Clone, Debug)]
pub struct SessionKeyStore {
    path: PathBuf,
}

impl SessionKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing is stored.
    pub fn load(&self) -> Result<Option<SessionKey>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ScrobbleError::store(&self.path, e)),
        };
        let session: SessionKey =
            toml::from_str(&text).map_err(|e| ScrobbleError::store(&self.path, e))?;
        if session.key.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub fn save(&self, session: &SessionKey) -> Result<()> {
        let text = toml::to_string(session).map_err(|e| ScrobbleError::store(&self.path, e))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ScrobbleError::store(parent, e))?;
        }
        fs::write(&self.path, text).map_err(|e| ScrobbleError::store(&self.path, e))?;
        debug!(path = %self.path.display(), user = %session.name, "stored Last.fm session");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ScrobbleError::store(&self.path, e)),
        }
    }
}
