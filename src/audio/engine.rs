use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// What the transport needs from an audio backend.
///
/// One track is loaded at a time. `elapsed_millis` counts playback time since
/// the last [`play`](AudioEngine::play) call only, not including its start
/// offset; the transport adds the offset itself.
pub trait AudioEngine {
    /// Open and decode `path`, replacing whatever was loaded. Does not start output.
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Start the loaded track at `start`. Restarting while playing acts as a seek.
    ///
    /// With `paused` the output is positioned but stays silent until
    /// [`unpause`](AudioEngine::unpause).
    fn play(&mut self, start: Duration, paused: bool) -> Result<()>;

    fn pause(&mut self);

    fn unpause(&mut self);

    /// Stop output and forget the loaded track.
    fn stop(&mut self);

    /// Linear gain, `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);

    fn elapsed_millis(&self) -> u64;

    /// True while audio is being produced: loaded, not paused, not drained.
    fn is_active(&self) -> bool;

    /// Total length of `path`. Zero when it cannot be determined.
    fn track_length(&self, path: &Path) -> Result<Duration>;
}
