use std::path::PathBuf;

use crate::library::TrackEntry;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "stopped",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
        }
    }
}

/// What one tick found the engine doing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PollStatus {
    Active,
    /// The engine went quiet while the transport believes it is playing.
    Ended,
    Inactive,
}

/// The loaded track. Identity is the file name; `path` pins it to its folder
/// so navigating elsewhere does not confuse it with a namesake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentTrack {
    pub entry: TrackEntry,
    pub path: PathBuf,
}
