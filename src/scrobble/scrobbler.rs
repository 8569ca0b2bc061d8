use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::config::ScrobbleSettings;
use crate::library;

use super::auth::{AuthEvent, AuthHandle, AuthTask};
use super::client::LastFmClient;
use super::error::{Result, ScrobbleError};
use super::service::{ScrobbleService, TrackInfo};
use super::store::SessionKeyStore;
use super::tracker::{ScrobbleTracker, TrackerAction};

/// What the UI holds: login state plus the play tracker.
///
/// Network calls run on `runtime`; this type itself lives on the UI thread
/// and never blocks.
pub struct Scrobbler {
    runtime: Handle,
    service: Option<Arc<dyn ScrobbleService>>,
    retry_interval: Duration,
    timeout: Duration,
    auth: Option<AuthHandle>,
    tracker: ScrobbleTracker,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl Scrobbler {
    /// Connect to Last.fm when enabled and configured; otherwise a scrobbler
    /// that does nothing.
    pub fn from_settings(settings: &ScrobbleSettings, store_path: Option<&Path>, runtime: Handle) -> Self {
        let service: Option<Arc<dyn ScrobbleService>> = if !settings.enabled {
            debug!("scrobbling disabled");
            None
        } else if let Some(path) = store_path {
            match LastFmClient::new(settings, SessionKeyStore::new(path)) {
                Ok(client) => Some(Arc::new(client)),
                Err(ScrobbleError::MissingCredentials) => {
                    info!("no Last.fm API credentials, scrobbling off");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "cannot set up Last.fm client");
                    None
                }
            }
        } else {
            warn!("no place to store a Last.fm session, scrobbling off");
            None
        };

        Self::new(
            service,
            runtime,
            Duration::from_millis(settings.retry_interval_ms),
            Duration::from_secs(settings.auth_timeout_secs),
        )
    }

    pub fn new(
        service: Option<Arc<dyn ScrobbleService>>,
        runtime: Handle,
        retry_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            runtime,
            service,
            retry_interval,
            timeout,
            auth: None,
            tracker: ScrobbleTracker::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.service.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.service.as_ref().is_some_and(|s| s.is_authenticated())
    }

    pub fn is_authenticating(&self) -> bool {
        self.auth.is_some()
    }

    /// Start the auth flow. A flow already running is left alone.
    pub fn login(&mut self) -> Result<()> {
        let service = self.service.clone().ok_or(ScrobbleError::MissingCredentials)?;
        if self.auth.is_some() {
            return Ok(());
        }
        info!("starting Last.fm authorization");
        let task = AuthTask::new(service, self.retry_interval, self.timeout);
        self.auth = Some(task.spawn(&self.runtime));
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.cancel_login();
        match &self.service {
            Some(service) => service.clear_token(),
            None => Ok(()),
        }
    }

    pub fn cancel_login(&mut self) {
        if let Some(auth) = &self.auth {
            auth.cancel();
        }
    }

    /// Drain auth events. The handle is dropped after the final one.
    pub fn poll_auth(&mut self) -> Vec<AuthEvent> {
        let Some(auth) = self.auth.as_mut() else {
            return Vec::new();
        };

        // Checked before draining so every event the task sent is seen.
        let finished = auth.is_finished();
        let mut events = Vec::new();
        while let Some(event) = auth.try_next() {
            let done = event.is_terminal();
            events.push(event);
            if done {
                self.auth = None;
                return events;
            }
        }
        if finished {
            warn!("Last.fm authorization task ended without a result");
            self.auth = None;
        }
        events
    }

    /// Feed playback progress. `generation` changes whenever a new play starts.
    pub fn on_playback(&mut self, generation: u64, path: Option<&Path>, elapsed: f64, length: f64) {
        let Some(path) = path else {
            self.tracker.clear();
            return;
        };

        self.observe(
            generation,
            || {
                let track = TrackInfo::from_tags(library::probe(path), path);
                if track.is_none() {
                    debug!(path = %path.display(), "no artist tag, not reporting");
                }
                track
            },
            elapsed,
            length,
        );
    }

    /// `describe` runs only when `generation` is new.
    pub(crate) fn observe(
        &mut self,
        generation: u64,
        describe: impl FnOnce() -> Option<TrackInfo>,
        elapsed: f64,
        length: f64,
    ) {
        if self.tracker.generation() != Some(generation) {
            if let Some(action) = self.tracker.start(generation, describe(), unix_now()) {
                self.submit(action);
            }
        }

        if let Some(action) = self.tracker.progress(elapsed, length) {
            self.submit(action);
        }
    }

    fn submit(&self, action: TrackerAction) {
        let Some(service) = self.service.clone() else {
            return;
        };
        if !service.is_authenticated() {
            return;
        }

        self.runtime.spawn(async move {
            let result = match &action {
                TrackerAction::NowPlaying(track) => service.update_now_playing(track).await,
                TrackerAction::Scrobble { track, started_at } => {
                    service.scrobble(track, *started_at).await
                }
            };
            if let Err(e) = result {
                warn!(error = %e, action = ?action, "Last.fm submission failed");
            }
        });
    }
}
