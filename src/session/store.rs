use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use super::model::SessionState;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot write session file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode session: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// TOML file holding one [`SessionState`].
#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved session. Never fails: a missing file gives defaults, and
    /// so does a broken one (with a warning).
    ///
    /// Values are parsed leniently, so `last_position = "42"` and
    /// `was_playing = "false"` are accepted alongside native TOML types. Each
    /// key stands alone: a bad value defaults that key only, and an
    /// out-of-range volume is clamped.
    pub fn load(&self) -> SessionState {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no saved session");
            return SessionState::default();
        }

        let built = ::config::Config::builder()
            .add_source(
                ::config::File::from(self.path.as_path())
                    .format(::config::FileFormat::Toml)
                    .required(false),
            )
            .build();
        let cfg = match built {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable session, using defaults");
                return SessionState::default();
            }
        };

        let defaults = SessionState::default();
        SessionState {
            volume: self
                .field::<i64>(&cfg, "volume")
                .map_or(defaults.volume, |v| v.clamp(0, 100) as u8),
            folder_path: self.field(&cfg, "folder_path").unwrap_or(defaults.folder_path),
            current_song: self.field(&cfg, "current_song").unwrap_or(defaults.current_song),
            last_position: self
                .field::<f64>(&cfg, "last_position")
                .filter(|p| p.is_finite() && *p >= 0.0)
                .unwrap_or(defaults.last_position),
            was_playing: self.field(&cfg, "was_playing").unwrap_or(defaults.was_playing),
        }
    }

    fn field<T: DeserializeOwned>(&self, cfg: &::config::Config, key: &str) -> Option<T> {
        match cfg.get::<T>(key) {
            Ok(value) => Some(value),
            Err(::config::ConfigError::NotFound(_)) => None,
            Err(e) => {
                warn!(path = %self.path.display(), key, error = %e, "bad session value, using default");
                None
            }
        }
    }

    pub fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        let text = toml::to_string(state)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SessionError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, text).map_err(|source| SessionError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }
}
