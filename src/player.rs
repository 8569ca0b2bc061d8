//! Command dispatch: every user action becomes a [`Command`] handled here.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::audio::AudioEngine;
use crate::config::LibrarySettings;
use crate::error::{PlayerError, Result};
use crate::library::DirectorySnapshot;
use crate::seek::SeekController;
use crate::session::SessionState;
use crate::transport::{PlaybackState, PollStatus, Transport};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Play the entry at this index.
    Play(usize),
    /// Play/pause; the index is the preferred entry when starting from idle.
    Toggle(Option<usize>),
    Next,
    Previous,
    Shuffle,
    /// Enter a folder or play a file.
    Open(usize),
    Navigate(PathBuf),
    Parent,
    /// Relist the current folder. Also undoes a shuffle.
    Refresh,
    SetVolume(i32),
    SeekGrab,
    SeekDrag(f64),
    SeekRelease(f64),
    /// Fraction of the bar, `0.0..=1.0`.
    SeekClick(f64),
    /// Relative seek in seconds.
    SeekBy(f64),
    Tick,
}

pub struct Player<E> {
    transport: Transport<E>,
    seek: SeekController,
    library: LibrarySettings,
    rng: StdRng,
}

impl<E: AudioEngine> Player<E> {
    pub fn new(engine: E, library: LibrarySettings) -> Self {
        Self::with_rng(engine, library, StdRng::from_entropy())
    }

    pub fn with_rng(engine: E, library: LibrarySettings, rng: StdRng) -> Self {
        Self {
            transport: Transport::new(engine),
            seek: SeekController::new(),
            library,
            rng,
        }
    }

    pub fn transport(&self) -> &Transport<E> {
        &self.transport
    }

    #[cfg(test)]
    pub fn transport_mut(&mut self) -> &mut Transport<E> {
        &mut self.transport
    }

    pub fn seek(&self) -> &SeekController {
        &self.seek
    }

    pub fn snapshot(&self) -> &DirectorySnapshot {
        self.transport.snapshot()
    }

    pub fn dir(&self) -> &Path {
        &self.transport.snapshot().dir
    }

    pub fn handle(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Play(index) => self.transport.play(index),
            Command::Toggle(selection) => self.transport.toggle(selection),
            Command::Next => self.transport.next(),
            Command::Previous => self.transport.previous(),
            Command::Shuffle => {
                self.transport.shuffle(&mut self.rng);
                Ok(())
            }
            Command::Open(index) => self.open(index),
            Command::Navigate(path) => self.navigate(&path),
            Command::Parent => match self.dir().parent().map(Path::to_path_buf) {
                Some(parent) => self.navigate(&parent),
                None => Ok(()),
            },
            Command::Refresh => {
                let dir = self.dir().to_path_buf();
                self.navigate(&dir)
            }
            Command::SetVolume(volume) => {
                self.transport.set_volume(volume);
                Ok(())
            }
            Command::SeekGrab => {
                self.seek.on_grab();
                Ok(())
            }
            Command::SeekDrag(value) => {
                self.seek.on_drag(value);
                Ok(())
            }
            Command::SeekRelease(value) => self.seek.on_release(&mut self.transport, value),
            Command::SeekClick(fraction) => self.seek.on_click_seek(&mut self.transport, fraction),
            Command::SeekBy(delta) => {
                let target = self.transport.elapsed() + delta;
                let result = self.transport.seek_to(target);
                self.seek.on_poll(&self.transport);
                result
            }
            Command::Tick => self.tick(),
        }
    }

    fn open(&mut self, index: usize) -> Result<()> {
        let entry = self
            .snapshot()
            .get(index)
            .cloned()
            .ok_or(PlayerError::IndexOutOfBounds(index))?;
        if entry.is_folder() {
            let path = self.snapshot().path_of(&entry);
            self.navigate(&path)
        } else {
            self.transport.play(index)
        }
    }

    /// Relist `path` and make it the current folder. On failure the previous
    /// folder and snapshot stay.
    fn navigate(&mut self, path: &Path) -> Result<()> {
        match DirectorySnapshot::load(path, &self.library) {
            Ok(snapshot) => {
                self.transport.replace_snapshot(snapshot);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "cannot open folder, keeping current one");
                Err(err)
            }
        }
    }

    fn tick(&mut self) -> Result<()> {
        let result = match self.transport.poll() {
            PollStatus::Ended => {
                debug!("track ended");
                self.transport.on_engine_ended().map(|_| ())
            }
            PollStatus::Active | PollStatus::Inactive => Ok(()),
        };
        self.seek.on_poll(&self.transport);
        result
    }

    /// The record saved at shutdown.
    ///
    /// `folder_path` is the current track's folder when something is loaded,
    /// so the song can be found again even after browsing elsewhere.
    pub fn session_state(&self) -> SessionState {
        let current = self.transport.current();
        let folder = current
            .and_then(|c| c.path.parent())
            .unwrap_or_else(|| self.dir());

        SessionState {
            volume: self.transport.volume(),
            folder_path: folder.to_string_lossy().into_owned(),
            current_song: current.map(|c| c.entry.name.clone()).unwrap_or_default(),
            last_position: self.transport.elapsed(),
            was_playing: self.transport.state() == PlaybackState::Playing,
        }
    }

    /// Apply a saved session: volume, folder, then the song itself.
    ///
    /// The folder is `override_dir`, else the saved one, else `fallback_dir`.
    /// A folder or song that no longer exists is logged and skipped.
    pub fn restore(&mut self, session: &SessionState, override_dir: Option<&Path>, fallback_dir: &Path) {
        self.transport.set_volume(i32::from(session.volume));

        let saved_dir = (!session.folder_path.is_empty()).then(|| PathBuf::from(&session.folder_path));
        let dir = override_dir
            .map(Path::to_path_buf)
            .or_else(|| saved_dir.clone())
            .unwrap_or_else(|| fallback_dir.to_path_buf());
        if let Err(e) = self.navigate(&dir) {
            debug!(error = %e, "start folder unavailable");
        }

        // A folder given on the command line wins; the song only comes back
        // when it lives there.
        if session.current_song.is_empty() || saved_dir.as_deref() != Some(dir.as_path()) {
            self.seek.on_poll(&self.transport);
            return;
        }

        if let Err(e) =
            self.transport
                .restore(&session.current_song, session.last_position, session.was_playing)
        {
            warn!(error = %e, song = %session.current_song, "cannot restore last song");
        }
        self.seek.on_poll(&self.transport);
    }
}

#[cfg(test)]
mod tests;
