use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use crate::error::{PlayerError, Result};
use crate::library;

use super::engine::AudioEngine;
use super::sink::{create_sink_at, open_decoder};

/// [`AudioEngine`] on the default output device.
///
/// Every `play` builds a fresh sink, so seeking is "play again from here".
pub struct RodioEngine {
    stream: OutputStream,
    sink: Option<Sink>,
    path: Option<PathBuf>,
    volume: f32,
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl RodioEngine {
    /// Open the default output device.
    pub fn open() -> Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| PlayerError::Engine(format!("no audio output device: {e}")))?;
        // rodio prints to stderr on drop, which would land on top of the TUI.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            sink: None,
            path: None,
            volume: 1.0,
            started_at: None,
            accumulated: Duration::ZERO,
        })
    }

    fn drop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.started_at = None;
        self.accumulated = Duration::ZERO;
    }
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, path: &Path) -> Result<()> {
        // Decode once up front so a broken file fails here and not mid-play.
        open_decoder(path)?;
        self.drop_sink();
        self.path = Some(path.to_path_buf());
        debug!(path = %path.display(), "loaded");
        Ok(())
    }

    fn play(&mut self, start: Duration, paused: bool) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Err(PlayerError::Engine("nothing loaded".to_string()));
        };

        let sink = create_sink_at(&self.stream, &path, start)?;
        self.drop_sink();
        sink.set_volume(self.volume);
        if !paused {
            sink.play();
            self.started_at = Some(Instant::now());
        }
        self.sink = Some(sink);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        if let Some(started) = self.started_at.take() {
            self.accumulated += started.elapsed();
        }
    }

    fn unpause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
            if self.started_at.is_none() {
                self.started_at = Some(Instant::now());
            }
        }
    }

    fn stop(&mut self) {
        self.drop_sink();
        self.path = None;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn elapsed_millis(&self) -> u64 {
        let running = self.started_at.map_or(Duration::ZERO, |s| s.elapsed());
        (self.accumulated + running).as_millis() as u64
    }

    fn is_active(&self) -> bool {
        self.sink
            .as_ref()
            .is_some_and(|sink| !sink.empty() && !sink.is_paused())
    }

    fn track_length(&self, path: &Path) -> Result<Duration> {
        probe_length(path)
    }
}

/// Length from tags, then from the decoder, else zero.
pub(super) fn probe_length(path: &Path) -> Result<Duration> {
    if !path.is_file() {
        return Err(PlayerError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        ));
    }

    if let Some(d) = library::probe(path).duration {
        return Ok(d);
    }

    match open_decoder(path) {
        Ok(decoder) => Ok(decoder.total_duration().unwrap_or(Duration::ZERO)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "length unknown");
            Ok(Duration::ZERO)
        }
    }
}
