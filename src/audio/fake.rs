use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PlayerError, Result};

use super::engine::AudioEngine;

/// Scripted engine for transport and player tests.
///
/// Time does not pass on its own: tests set `elapsed_ms` and call `finish()`
/// to simulate the end of a track.
#[derive(Debug, Default)]
pub(crate) struct FakeEngine {
    pub loaded: Option<PathBuf>,
    pub started: bool,
    pub paused: bool,
    pub finished: bool,
    pub last_start: Option<Duration>,
    pub elapsed_ms: u64,
    pub volume: f32,
    pub lengths: HashMap<PathBuf, Duration>,
    pub default_length: Duration,
    pub missing: HashSet<PathBuf>,
    pub undecodable: HashSet<PathBuf>,
    pub plays: usize,
    /// Set whenever output would have been audible.
    pub sounded: bool,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            volume: 1.0,
            default_length: Duration::from_secs(180),
            ..Self::default()
        }
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }
}

impl AudioEngine for FakeEngine {
    fn load(&mut self, path: &Path) -> Result<()> {
        if self.missing.contains(path) {
            return Err(PlayerError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            ));
        }
        if self.undecodable.contains(path) {
            return Err(PlayerError::Engine(format!("cannot decode {}", path.display())));
        }
        self.loaded = Some(path.to_path_buf());
        self.started = false;
        self.finished = false;
        Ok(())
    }

    fn play(&mut self, start: Duration, paused: bool) -> Result<()> {
        if self.loaded.is_none() {
            return Err(PlayerError::Engine("nothing loaded".into()));
        }
        self.started = true;
        self.paused = paused;
        self.sounded |= !paused;
        self.finished = false;
        self.last_start = Some(start);
        self.elapsed_ms = 0;
        self.plays += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn unpause(&mut self) {
        self.paused = false;
        self.sounded |= self.started;
    }

    fn stop(&mut self) {
        self.loaded = None;
        self.started = false;
        self.paused = false;
        self.elapsed_ms = 0;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn elapsed_millis(&self) -> u64 {
        self.elapsed_ms
    }

    fn is_active(&self) -> bool {
        self.loaded.is_some() && self.started && !self.paused && !self.finished
    }

    fn track_length(&self, path: &Path) -> Result<Duration> {
        Ok(self.lengths.get(path).copied().unwrap_or(self.default_length))
    }
}
