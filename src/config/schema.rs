use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/allegro/config.toml` or `~/.config/allegro/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `ALLEGRO__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub library: LibrarySettings,
    pub session: SessionSettings,
    pub scrobble: ScrobbleSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Interval of the playback tick (engine poll + seek bar refresh), in milliseconds.
    pub poll_interval_ms: u64,
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Volume change applied by `+` / `-` (percent points).
    pub volume_step: u8,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            scrub_seconds: 5,
            volume_step: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Folder opened when neither the command line nor the saved session names one.
    /// Defaults to `~/Music`.
    pub music_dir: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to list hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether symlinked folders and files are resolved while listing.
    pub follow_links: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            music_dir: None,
            extensions: ["wav", "ogg", "mp3", "mid", "midi", "flac", "aif", "aiff", "mp2"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            include_hidden: false,
            follow_links: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Where the playback session is remembered between runs.
    /// Defaults to `session.toml` next to the config file.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrobbleSettings {
    /// Master switch for Last.fm integration.
    pub enabled: bool,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Last.fm web service root.
    pub api_root: String,
    /// Page the user visits to approve the auth token.
    pub auth_url: String,
    /// Delay between `auth.getSession` polls while waiting for approval.
    pub retry_interval_ms: u64,
    /// Give up waiting for approval after this many seconds.
    pub auth_timeout_secs: u64,
    /// Where the session key is stored. Defaults to `lastfm.toml` next to the config file.
    pub store_path: Option<PathBuf>,
}

impl Default for ScrobbleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            api_secret: None,
            api_root: "https://ws.audioscrobbler.com/2.0/".to_string(),
            auth_url: "https://www.last.fm/api/auth/".to_string(),
            retry_interval_ms: 1000,
            auth_timeout_secs: 300,
            store_path: None,
        }
    }
}

impl ScrobbleSettings {
    /// Both halves of the API credentials, when configured and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let key = self.api_key.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let secret = self
            .api_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        Some((key, secret))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
    /// Directory for the rolling log file. Defaults to the XDG state dir.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
        }
    }
}
