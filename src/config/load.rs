use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `ALLEGRO__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("ALLEGRO")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.audio.poll_interval_ms == 0 {
            return Err("audio.poll_interval_ms must be >= 1".to_string());
        }
        if self.audio.volume_step == 0 || self.audio.volume_step > 100 {
            return Err("audio.volume_step must be within 1..=100".to_string());
        }
        if self.scrobble.retry_interval_ms == 0 {
            return Err("scrobble.retry_interval_ms must be >= 1".to_string());
        }
        if self.scrobble.auth_timeout_secs == 0 {
            return Err("scrobble.auth_timeout_secs must be >= 1".to_string());
        }
        Ok(())
    }

    /// Path of the remembered playback session.
    pub fn session_path(&self) -> Option<PathBuf> {
        self.session
            .path
            .clone()
            .or_else(|| config_dir().map(|d| d.join("session.toml")))
    }

    /// Path of the stored Last.fm session key.
    pub fn scrobble_store_path(&self) -> Option<PathBuf> {
        self.scrobble
            .store_path
            .clone()
            .or_else(|| config_dir().map(|d| d.join("lastfm.toml")))
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.logging.directory.clone().or_else(state_dir)
    }

    /// Folder opened when nothing else names one.
    pub fn music_dir(&self) -> PathBuf {
        if let Some(dir) = &self.library.music_dir {
            return dir.clone();
        }
        env::var_os("HOME")
            .map(|home| PathBuf::from(home).join("Music"))
            .unwrap_or_else(|| PathBuf::from("Music"))
    }
}

/// Resolve the config path from `ALLEGRO_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("ALLEGRO_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/allegro/config.toml`
/// or `~/.config/allegro/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// `$XDG_CONFIG_HOME/allegro` or `~/.config/allegro`.
pub fn config_dir() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// `$XDG_STATE_HOME/allegro/logs` or `~/.local/state/allegro/logs`.
pub fn state_dir() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("logs"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    let base = if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(home_fallback))
    } else {
        None
    };

    base.map(|d| d.join("allegro"))
}
