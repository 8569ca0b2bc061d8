use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::library::TrackTags;

use super::error::Result;

/// A Last.fm web session: the key used to sign writes and the account it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionKey {
    pub key: String,
    pub name: String,
}

/// Request token plus the page the user must visit to approve it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionPoll {
    Authorized(SessionKey),
    /// The user has not approved the token yet.
    Pending,
}

/// What gets reported about a track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackInfo {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    pub duration: Option<Duration>,
}

impl TrackInfo {
    /// Build from file tags. No artist, no report. A missing title falls back to
    /// the file stem.
    pub fn from_tags(tags: TrackTags, path: &Path) -> Option<Self> {
        let artist = tags.artist?;
        let title = tags.title.or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })?;
        Some(Self {
            artist,
            title,
            album: tags.album,
            duration: tags.duration,
        })
    }
}

/// The listening-history service seen from the player.
#[async_trait]
pub trait ScrobbleService: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// Fetch a request token for the desktop auth flow.
    async fn begin_auth(&self) -> Result<AuthToken>;

    /// Exchange an approved token for a session.
    async fn poll_session(&self, token: &str) -> Result<SessionPoll>;

    /// Keep `session` for later runs and use it from now on.
    fn persist_token(&self, session: &SessionKey) -> Result<()>;

    /// Forget the stored session (log out).
    fn clear_token(&self) -> Result<()>;

    async fn update_now_playing(&self, track: &TrackInfo) -> Result<()>;

    /// `started_at` is the UNIX time the play began.
    async fn scrobble(&self, track: &TrackInfo, started_at: u64) -> Result<()>;
}
