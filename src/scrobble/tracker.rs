use super::service::TrackInfo;

/// Tracks at or below this length are never scrobbled.
pub const MIN_TRACK_SECS: f64 = 30.0;
/// Four minutes of play always earns a scrobble.
pub const MAX_THRESHOLD_SECS: f64 = 240.0;

/// Seconds a track of `length` must play before it counts; `None` if it never does.
pub fn scrobble_threshold(length: f64) -> Option<f64> {
    (length > MIN_TRACK_SECS).then(|| (length / 2.0).min(MAX_THRESHOLD_SECS))
}

#[derive(Clone, Debug, PartialEq)]
pub enum TrackerAction {
    NowPlaying(TrackInfo),
    Scrobble { track: TrackInfo, started_at: u64 },
}

#[derive(Debug)]
struct Play {
    generation: u64,
    track: Option<TrackInfo>,
    started_at: u64,
    scrobbled: bool,
}

/// Decides when the current play is announced and when it is scrobbled.
///
/// A play is identified by the transport's generation counter, so replaying
/// the same file is a new play.
#[derive(Debug, Default)]
pub struct ScrobbleTracker {
    current: Option<Play>,
}

impl ScrobbleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Option<u64> {
        self.current.as_ref().map(|p| p.generation)
    }

    /// A new play began. Returns the now-playing announcement, if reportable.
    pub fn start(&mut self, generation: u64, track: Option<TrackInfo>, now: u64) -> Option<TrackerAction> {
        let announce = track.clone().map(TrackerAction::NowPlaying);
        self.current = Some(Play {
            generation,
            track,
            started_at: now,
            scrobbled: false,
        });
        announce
    }

    /// Progress on the current play. Returns the scrobble once, when the
    /// threshold is crossed.
    pub fn progress(&mut self, elapsed: f64, length: f64) -> Option<TrackerAction> {
        let play = self.current.as_mut()?;
        if play.scrobbled {
            return None;
        }
        let track = play.track.as_ref()?;

        // The engine's length wins; tags cover decoders that cannot tell.
        let length = if length > 0.0 {
            length
        } else {
            track.duration.map_or(0.0, |d| d.as_secs_f64())
        };
        let threshold = scrobble_threshold(length)?;
        if elapsed < threshold {
            return None;
        }

        play.scrobbled = true;
        Some(TrackerAction::Scrobble {
            track: track.clone(),
            started_at: play.started_at,
        })
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
