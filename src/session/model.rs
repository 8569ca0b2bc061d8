use serde::Serialize;

use crate::transport::DEFAULT_VOLUME;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionState {
    pub volume: u8,
    pub folder_path: String,
    pub current_song: String,
    /// Seconds into `current_song`.
    pub last_position: f64,
    pub was_playing: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            folder_path: String::new(),
            current_song: String::new(),
            last_position: 0.0,
            was_playing: false,
        }
    }
}
