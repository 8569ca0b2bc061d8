//! Last.fm 2.0 web API over `reqwest`.

use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ScrobbleSettings;

use super::error::{Result, ScrobbleError};
use super::service::{AuthToken, ScrobbleService, SessionKey, SessionPoll, TrackInfo};
use super::store::SessionKeyStore;

/// "Unauthorized token": the user has not approved it yet.
const TOKEN_NOT_AUTHORIZED: u32 = 14;

pub struct LastFmClient {
    http: Client,
    api_key: String,
    api_secret: String,
    api_root: String,
    auth_url: String,
    store: SessionKeyStore,
    session: RwLock<Option<SessionKey>>,
}

impl LastFmClient {
    /// Build a client and pick up any stored session.
    ///
    /// An unreadable store is logged and treated as logged out.
    pub fn new(settings: &ScrobbleSettings, store: SessionKeyStore) -> Result<Self> {
        let (api_key, api_secret) = settings
            .credentials()
            .ok_or(ScrobbleError::MissingCredentials)?;

        let session = match store.load() {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "ignoring stored Last.fm session");
                None
            }
        };
        if let Some(s) = &session {
            info!(user = %s.name, "Last.fm session loaded");
        }

        let http = Client::builder()
            .user_agent(concat!("allegro/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            api_root: settings.api_root.clone(),
            auth_url: settings.auth_url.clone(),
            store,
            session: RwLock::new(session),
        })
    }

    #[cfg(test)]
    pub fn user(&self) -> Option<String> {
        self.session_key().map(|s| s.name)
    }

    fn session_key(&self) -> Option<SessionKey> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_session(&self, session: Option<SessionKey>) {
        *self.session.write().unwrap_or_else(|e| e.into_inner()) = session;
    }

    /// `api_sig`: every parameter as name+value sorted by name, then the
    /// secret, MD5 in lowercase hex. `format` is never part of it.
    pub(crate) fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(k, _)| *k != "format").collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let mut raw = String::new();
        for (k, v) in sorted {
            raw.push_str(k);
            raw.push_str(v);
        }
        raw.push_str(&self.api_secret);
        format!("{:x}", md5::compute(raw.as_bytes()))
    }

    fn signed(&self, method: &str, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        params.push(("method", method.to_string()));
        params.push(("api_key", self.api_key.clone()));
        let sig = self.sign(&params);
        params.push(("api_sig", sig));
        params.push(("format", "json".to_string()));
        params
    }

    async fn get(&self, method: &str, params: Vec<(&'static str, String)>) -> Result<Value> {
        let params = self.signed(method, params);
        debug!(url = %self.api_root, method, "Last.fm GET");
        let response = self.http.get(&self.api_root).query(&params).send().await?;
        read_body(response).await
    }

    async fn post(&self, method: &str, params: Vec<(&'static str, String)>) -> Result<Value> {
        let params = self.signed(method, params);
        debug!(url = %self.api_root, method, "Last.fm POST");
        let response = self.http.post(&self.api_root).form(&params).send().await?;
        read_body(response).await
    }

    fn require_session(&self) -> Result<SessionKey> {
        self.session_key().ok_or_else(|| ScrobbleError::Api {
            code: 9,
            message: "not logged in".to_string(),
        })
    }
}

async fn read_body(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await?;

    let body: Value = serde_json::from_str(&text).map_err(|e| {
        ScrobbleError::Parse(format!("HTTP {status}: {e}"))
    })?;

    if let Some(code) = body.get("error").and_then(Value::as_u64) {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(ScrobbleError::Api {
            code: code as u32,
            message,
        });
    }
    if !status.is_success() {
        return Err(ScrobbleError::Parse(format!("HTTP {status} without error body")));
    }
    Ok(body)
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_str)
}

fn track_params(track: &TrackInfo) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("artist", track.artist.clone()),
        ("track", track.title.clone()),
    ];
    if let Some(album) = &track.album {
        params.push(("album", album.clone()));
    }
    if let Some(d) = track.duration {
        params.push(("duration", d.as_secs().to_string()));
    }
    params
}

#[async_trait]
impl ScrobbleService for LastFmClient {
    fn is_authenticated(&self) -> bool {
        self.session_key().is_some()
    }

    async fn begin_auth(&self) -> Result<AuthToken> {
        let body = self.get("auth.getToken", Vec::new()).await?;
        let token = str_at(&body, &["token"])
            .ok_or_else(|| ScrobbleError::Parse("auth.getToken: no token".to_string()))?
            .to_string();
        let url = format!("{}?api_key={}&token={}", self.auth_url, self.api_key, token);
        info!(url = %url, "Last.fm token issued, approval needed");
        Ok(AuthToken { token, url })
    }

    async fn poll_session(&self, token: &str) -> Result<SessionPoll> {
        match self
            .get("auth.getSession", vec![("token", token.to_string())])
            .await
        {
            Ok(body) => {
                let key = str_at(&body, &["session", "key"]);
                let name = str_at(&body, &["session", "name"]);
                match (key, name) {
                    (Some(key), Some(name)) => Ok(SessionPoll::Authorized(SessionKey {
                        key: key.to_string(),
                        name: name.to_string(),
                    })),
                    _ => Err(ScrobbleError::Parse("auth.getSession: no session".to_string())),
                }
            }
            Err(ScrobbleError::Api { code, .. }) if code == TOKEN_NOT_AUTHORIZED => {
                Ok(SessionPoll::Pending)
            }
            Err(e) => Err(e),
        }
    }

    fn persist_token(&self, session: &SessionKey) -> Result<()> {
        self.store.save(session)?;
        self.set_session(Some(session.clone()));
        info!(user = %session.name, "Last.fm connected");
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        self.set_session(None);
        self.store.clear()?;
        info!("Last.fm disconnected");
        Ok(())
    }

    async fn update_now_playing(&self, track: &TrackInfo) -> Result<()> {
        let session = self.require_session()?;
        let mut params = track_params(track);
        params.push(("sk", session.key));
        self.post("track.updateNowPlaying", params).await?;
        debug!(artist = %track.artist, title = %track.title, "now playing sent");
        Ok(())
    }

    async fn scrobble(&self, track: &TrackInfo, started_at: u64) -> Result<()> {
        let session = self.require_session()?;
        let mut params = track_params(track);
        params.push(("timestamp", started_at.to_string()));
        params.push(("sk", session.key));
        let body = self.post("track.scrobble", params).await?;

        let ignored = body
            .pointer("/scrobbles/@attr/ignored")
            .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(0);
        if ignored > 0 {
            warn!(artist = %track.artist, title = %track.title, "scrobble ignored by Last.fm");
        } else {
            info!(artist = %track.artist, title = %track.title, "scrobbled");
        }
        Ok(())
    }
}
