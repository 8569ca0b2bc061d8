//! Application model: the player plus what only the screen cares about
//! (cursor, status line, Last.fm login state).

use std::io;
use std::path::Path;

use tracing::{info, warn};

use crate::audio::AudioEngine;
use crate::config::AudioSettings;
use crate::player::{Command, Player};
use crate::scrobble::{AuthEvent, Scrobbler};
use crate::transport::PlaybackState;

/// Hands a URL to the desktop's browser.
pub type UrlOpener = Box<dyn Fn(&str) -> io::Result<()>>;

/// The main application model.
pub struct App<E> {
    pub player: Player<E>,
    pub scrobbler: Scrobbler,
    pub selected: usize,
    /// One-line message shown under the list; the latest one wins.
    pub status: Option<String>,
    /// Approval page while a Last.fm login is waiting on the user.
    pub auth_url: Option<String>,
    volume_step: i32,
    scrub_seconds: f64,
    open_url: UrlOpener,
}

impl<E: AudioEngine> App<E> {
    pub fn new(player: Player<E>, scrobbler: Scrobbler, audio: &AudioSettings) -> Self {
        let mut app = Self {
            player,
            scrobbler,
            selected: 0,
            status: None,
            auth_url: None,
            volume_step: i32::from(audio.volume_step),
            scrub_seconds: audio.scrub_seconds as f64,
            open_url: Box::new(|url: &str| open::that_detached(url)),
        };
        app.select_current_or_first();
        app
    }

    /// Replace how approval pages are opened.
    pub fn with_url_opener(mut self, open_url: UrlOpener) -> Self {
        self.open_url = open_url;
        self
    }

    pub fn has_entries(&self) -> bool {
        !self.player.snapshot().is_empty()
    }

    pub fn playback(&self) -> PlaybackState {
        self.player.transport().state()
    }

    pub fn now_playing(&self) -> Option<&str> {
        self.player
            .transport()
            .current()
            .map(|c| c.entry.name.as_str())
    }

    /// Run `command`; a failure becomes the status line, never an exit.
    pub fn dispatch(&mut self, command: Command) {
        if let Err(err) = self.player.handle(command) {
            warn!(error = %err, "command failed");
            self.status = Some(err.to_string());
        }
        self.clamp_selection();
    }

    /// One tick of the event loop: advance playback, drain login events,
    /// report progress to Last.fm.
    pub fn on_tick(&mut self) {
        self.dispatch(Command::Tick);

        for event in self.scrobbler.poll_auth() {
            self.on_auth_event(event);
        }

        let transport = self.player.transport();
        let path = transport.current().map(|c| c.path.clone());
        let (generation, elapsed, length) = (transport.generation(), transport.elapsed(), transport.length());
        self.scrobbler
            .on_playback(generation, path.as_deref(), elapsed, length);
    }

    pub fn on_auth_event(&mut self, event: AuthEvent) {
        let message = match event {
            AuthEvent::AwaitingApproval { url } => {
                info!(url = %url, "opening Last.fm approval page");
                let message = match (self.open_url)(&url) {
                    Ok(()) => "Last.fm: approve access in your browser, esc to cancel".to_string(),
                    Err(e) => {
                        warn!(error = %e, "cannot open a browser");
                        "Last.fm: open this page to approve access, esc to cancel".to_string()
                    }
                };
                self.auth_url = Some(url);
                message
            }
            AuthEvent::Authorized { user } => {
                self.auth_url = None;
                format!("Last.fm: connected as {user}")
            }
            AuthEvent::Failed(e) => {
                self.auth_url = None;
                format!("AuthError: {e}")
            }
            AuthEvent::Cancelled => {
                self.auth_url = None;
                "Last.fm: login cancelled".to_string()
            }
        };
        self.status = Some(message);
    }

    /// Log in when logged out, log out when logged in.
    pub fn toggle_login(&mut self) {
        if self.scrobbler.is_authenticating() {
            return;
        }
        let result = if self.scrobbler.is_authenticated() {
            self.scrobbler
                .logout()
                .map(|()| "Last.fm: disconnected".to_string())
        } else {
            self.scrobbler
                .login()
                .map(|()| "Last.fm: requesting token...".to_string())
        };
        self.status = Some(match result {
            Ok(msg) => msg,
            Err(e) => format!("AuthError: {e}"),
        });
    }

    pub fn cancel_login(&mut self) {
        if self.scrobbler.is_authenticating() {
            info!("cancelling Last.fm login");
            self.scrobbler.cancel_login();
        }
    }

    /// Enter on the cursor row: open the folder or play the file.
    pub fn open_selected(&mut self) {
        if !self.has_entries() {
            return;
        }
        let before = self.player.dir().to_path_buf();
        self.dispatch(Command::Open(self.selected));
        if self.player.dir() != before {
            self.selected = 0;
        }
    }

    /// Up one folder, with the cursor on the folder we came from.
    pub fn go_parent(&mut self) {
        let left = self.player.dir().to_path_buf();
        self.dispatch(Command::Parent);
        if self.player.dir() != left {
            let name = left.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            self.selected = self.player.snapshot().position_of(name).unwrap_or(0);
        }
    }

    pub fn toggle_playback(&mut self) {
        let selection = self.has_entries().then_some(self.selected);
        self.dispatch(Command::Toggle(selection));
    }

    pub fn shuffle(&mut self) {
        self.dispatch(Command::Shuffle);
        self.select_current_or_first();
        self.status = Some("shuffled".to_string());
    }

    /// Relist the folder in name order, keeping the cursor on the same name.
    pub fn refresh(&mut self) {
        let keep = self
            .player
            .snapshot()
            .get(self.selected)
            .map(|e| e.name.clone());
        self.dispatch(Command::Refresh);
        if let Some(i) = keep.and_then(|n| self.player.snapshot().position_of(&n)) {
            self.selected = i;
        }
    }

    pub fn navigate(&mut self, dir: &Path) {
        self.dispatch(Command::Navigate(dir.to_path_buf()));
        self.select_current_or_first();
    }

    pub fn volume_up(&mut self) {
        let v = i32::from(self.player.transport().volume()) + self.volume_step;
        self.dispatch(Command::SetVolume(v));
    }

    pub fn volume_down(&mut self) {
        let v = i32::from(self.player.transport().volume()) - self.volume_step;
        self.dispatch(Command::SetVolume(v));
    }

    pub fn scrub_forward(&mut self) {
        self.dispatch(Command::SeekBy(self.scrub_seconds));
    }

    pub fn scrub_back(&mut self) {
        self.dispatch(Command::SeekBy(-self.scrub_seconds));
    }

    /// Row after `current`, wrapping to the top.
    pub fn next_row_from(&self, current: usize) -> Option<usize> {
        let len = self.player.snapshot().len();
        (len > 0).then(|| if current + 1 >= len { 0 } else { current + 1 })
    }

    /// Row before `current`, wrapping to the bottom.
    pub fn prev_row_from(&self, current: usize) -> Option<usize> {
        let len = self.player.snapshot().len();
        (len > 0).then(|| if current == 0 || current >= len { len - 1 } else { current - 1 })
    }

    pub fn next(&mut self) {
        if let Some(i) = self.next_row_from(self.selected) {
            self.selected = i;
        }
    }

    pub fn prev(&mut self) {
        if let Some(i) = self.prev_row_from(self.selected) {
            self.selected = i;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.player.snapshot().len().saturating_sub(1);
    }

    fn select_current_or_first(&mut self) {
        self.selected = self.player.transport().current_index().unwrap_or(0);
    }

    fn clamp_selection(&mut self) {
        let len = self.player.snapshot().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}
