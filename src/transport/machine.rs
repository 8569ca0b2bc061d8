use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::audio::AudioEngine;
use crate::error::{PlayerError, Result};
use crate::library::{DirectorySnapshot, TrackEntry};
use crate::navigator;

use super::state::{CurrentTrack, PlaybackState, PollStatus};

pub const DEFAULT_VOLUME: u8 = 50;

/// Owns the engine and the snapshot it plays from.
///
/// `elapsed()` is the last seek offset plus what the engine reports since the
/// last `play`, so a seek never has to wait for the engine to catch up.
pub struct Transport<E> {
    engine: E,
    snapshot: DirectorySnapshot,
    state: PlaybackState,
    current: Option<CurrentTrack>,
    seek_offset: f64,
    length: f64,
    volume: u8,
    generation: u64,
}

impl<E: AudioEngine> Transport<E> {
    pub fn new(mut engine: E) -> Self {
        engine.set_volume(f32::from(DEFAULT_VOLUME) / 100.0);
        Self {
            engine,
            snapshot: DirectorySnapshot::default(),
            state: PlaybackState::Idle,
            current: None,
            seek_offset: 0.0,
            length: 0.0,
            volume: DEFAULT_VOLUME,
            generation: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current(&self) -> Option<&CurrentTrack> {
        self.current.as_ref()
    }

    /// Index of the current track in the snapshot, if it belongs to this folder.
    pub fn current_index(&self) -> Option<usize> {
        let current = self.current.as_ref()?;
        if current.path.parent() != Some(self.snapshot.dir.as_path()) {
            return None;
        }
        self.snapshot.position_of(&current.entry.name)
    }

    pub fn snapshot(&self) -> &DirectorySnapshot {
        &self.snapshot
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Length of the current track in seconds; zero when unknown or idle.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Bumped every time a track starts from the top. Seeks do not count.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[cfg(test)]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[cfg(test)]
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn elapsed(&self) -> f64 {
        if self.current.is_none() {
            return 0.0;
        }
        self.seek_offset + self.engine.elapsed_millis() as f64 / 1000.0
    }

    pub fn replace_snapshot(&mut self, snapshot: DirectorySnapshot) {
        self.snapshot = snapshot;
    }

    /// Shuffle the snapshot's audio entries. The current track keeps playing.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.snapshot.entries = navigator::shuffle(&self.snapshot.entries, rng);
    }

    pub fn play(&mut self, index: usize) -> Result<()> {
        let (entry, path) = self.playable_at(index)?;
        self.start(entry, &path, false)
    }

    fn playable_at(&self, index: usize) -> Result<(TrackEntry, PathBuf)> {
        let entry = self
            .snapshot
            .get(index)
            .cloned()
            .ok_or(PlayerError::IndexOutOfBounds(index))?;
        if !entry.is_playable() {
            return Err(PlayerError::NotPlayable(entry.name));
        }
        let path = self.snapshot.path_of(&entry);
        Ok((entry, path))
    }

    /// Load and start `entry` from zero. `paused` starts it silent, in `Paused`.
    fn start(&mut self, entry: TrackEntry, path: &Path, paused: bool) -> Result<()> {
        match self.engine.load(path) {
            Ok(()) => {}
            // File vanished: leave everything as it was.
            Err(err @ PlayerError::Io { .. }) => {
                warn!(error = %err, "cannot open track");
                return Err(err);
            }
            Err(err) => return Err(self.fail(err)),
        }

        let length = match self.engine.track_length(path) {
            Ok(d) => d.as_secs_f64(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no length");
                0.0
            }
        };

        self.engine.set_volume(f32::from(self.volume) / 100.0);
        if let Err(err) = self.engine.play(Duration::ZERO, paused) {
            return Err(self.fail(err));
        }

        info!(track = %entry.name, length, paused, "playing");
        self.current = Some(CurrentTrack {
            entry,
            path: path.to_path_buf(),
        });
        self.state = if paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        };
        self.seek_offset = 0.0;
        self.length = length;
        self.generation += 1;
        Ok(())
    }

    fn fail(&mut self, err: PlayerError) -> PlayerError {
        warn!(error = %err, "engine failure, stopping");
        self.stop();
        err
    }

    /// Idle: start the selection if playable, else the first playable entry.
    /// Playing and Paused flip between each other without unloading.
    pub fn toggle(&mut self, selection: Option<usize>) -> Result<()> {
        match self.state {
            PlaybackState::Idle => {
                let target = selection
                    .filter(|&i| self.snapshot.get(i).is_some_and(TrackEntry::is_playable))
                    .or_else(|| navigator::first_playable(&self.snapshot.entries));
                match target {
                    Some(i) => self.play(i),
                    None => Ok(()),
                }
            }
            PlaybackState::Playing => {
                self.engine.pause();
                self.state = PlaybackState::Paused;
                Ok(())
            }
            PlaybackState::Paused => {
                self.resume();
                Ok(())
            }
        }
    }

    fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.engine.unpause();
            self.state = PlaybackState::Playing;
        }
    }

    pub fn next(&mut self) -> Result<()> {
        match navigator::next(self.current_index(), &self.snapshot.entries) {
            Some(i) => self.play(i),
            None => {
                debug!(dir = %self.snapshot.dir.display(), "nothing playable, stopping");
                self.stop();
                Ok(())
            }
        }
    }

    pub fn previous(&mut self) -> Result<()> {
        match navigator::previous(self.current_index(), &self.snapshot.entries) {
            Some(i) => self.play(i),
            None => Ok(()),
        }
    }

    /// Advance after the engine ran dry. Only a playing transport advances.
    ///
    /// Returns whether a new track was started.
    pub fn on_engine_ended(&mut self) -> Result<bool> {
        if self.state != PlaybackState::Playing {
            return Ok(false);
        }
        let before = self.generation;
        if let Err(err) = self.next() {
            // The finished track is still "playing"; without this every tick retries.
            self.stop();
            return Err(err);
        }
        Ok(self.generation != before)
    }

    pub fn poll(&self) -> PollStatus {
        if self.engine.is_active() {
            PollStatus::Active
        } else if self.state == PlaybackState::Playing {
            PollStatus::Ended
        } else {
            PollStatus::Inactive
        }
    }

    /// Jump to `seconds` in the current track.
    ///
    /// A target at or past the end counts as the track finishing. A paused
    /// track does not advance, so such a seek leaves it where it was.
    pub fn seek_to(&mut self, seconds: f64) -> Result<()> {
        if self.current.is_none() {
            return Ok(());
        }
        let target = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };

        if self.length > 0.0 && target >= self.length {
            debug!(position = target, length = self.length, "seek past end");
            return self.on_engine_ended().map(|_| ());
        }

        let paused = self.state == PlaybackState::Paused;
        if let Err(err) = self.engine.play(Duration::from_secs_f64(target), paused) {
            return Err(self.fail(err));
        }
        self.seek_offset = target;
        Ok(())
    }

    pub fn set_volume(&mut self, volume: i32) {
        self.volume = volume.clamp(0, 100) as u8;
        self.engine.set_volume(f32::from(self.volume) / 100.0);
    }

    /// Bring back a saved session: load `name` paused, seek, then resume if it
    /// was playing. Nothing is heard before the saved position.
    pub fn restore(&mut self, name: &str, position: f64, was_playing: bool) -> Result<()> {
        let index = self
            .snapshot
            .position_of(name)
            .ok_or_else(|| PlayerError::TrackNotFound(name.to_string()))?;
        let (entry, path) = self.playable_at(index)?;
        self.start(entry, &path, true)?;
        if position > 0.0 {
            self.seek_to(position)?;
        }
        if was_playing {
            self.resume();
        }
        info!(track = name, position, was_playing, "restored session");
        Ok(())
    }

    pub fn stop(&mut self) {
        self.engine.stop();
        self.state = PlaybackState::Idle;
        self.current = None;
        self.seek_offset = 0.0;
        self.length = 0.0;
    }
}
