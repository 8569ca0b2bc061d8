//! Error types for the player core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by listing, navigation and the transport.
///
/// None of these are fatal: callers log them, surface a status message and
/// keep the previous UI state.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Missing file or folder, permission denied, unreadable directory.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The audio engine could not open, decode or start the file.
    #[error("audio engine: {0}")]
    Engine(String),

    /// The entry exists but cannot be played (e.g. it is a folder).
    #[error("not playable: {0}")]
    NotPlayable(String),

    /// A remembered track is not part of the current snapshot.
    #[error("track not found in current folder: {0}")]
    TrackNotFound(String),

    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(usize),
}

impl PlayerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
