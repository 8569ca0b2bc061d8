use super::*;
use crate::config::ScrobbleSettings;
use crate::library::TrackTags;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Handle;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn track() -> TrackInfo {
    TrackInfo {
        artist: "Boards of Canada".into(),
        title: "Roygbiv".into(),
        album: Some("Music Has the Right to Children".into()),
        duration: Some(Duration::from_secs(151)),
    }
}

// =============================================================================
// Fake service
// =============================================================================

#[derive(Default)]
struct FakeService {
    pending_polls: AtomicUsize,
    authenticated: AtomicBool,
    fail_begin: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeService {
    fn pending_for(polls: usize) -> Self {
        let s = Self::default();
        s.pending_polls.store(polls, Ordering::SeqCst);
        s
    }

    fn logged_in() -> Self {
        let s = Self::default();
        s.authenticated.store(true, Ordering::SeqCst);
        s
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl ScrobbleService for FakeService {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn begin_auth(&self) -> Result<AuthToken> {
        self.record("begin_auth");
        if self.fail_begin {
            return Err(ScrobbleError::Api {
                code: 10,
                message: "Invalid API key".into(),
            });
        }
        Ok(AuthToken {
            token: "tok".into(),
            url: "https://auth.example/?api_key=k&token=tok".into(),
        })
    }

    async fn poll_session(&self, token: &str) -> Result<SessionPoll> {
        self.record(format!("poll_session {token}"));
        let left = self.pending_polls.load(Ordering::SeqCst);
        if left > 0 {
            self.pending_polls.store(left - 1, Ordering::SeqCst);
            return Ok(SessionPoll::Pending);
        }
        Ok(SessionPoll::Authorized(SessionKey {
            key: "sk-1".into(),
            name: "listener".into(),
        }))
    }

    fn persist_token(&self, session: &SessionKey) -> Result<()> {
        self.record(format!("persist {}", session.key));
        self.authenticated.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        self.record("clear");
        self.authenticated.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn update_now_playing(&self, track: &TrackInfo) -> Result<()> {
        self.record(format!("now_playing {}", track.title));
        Ok(())
    }

    async fn scrobble(&self, track: &TrackInfo, _started_at: u64) -> Result<()> {
        self.record(format!("scrobble {}", track.title));
        Ok(())
    }
}

async fn collect(mut handle: AuthHandle) -> Vec<AuthEvent> {
    let mut events = Vec::new();
    while let Some(ev) = handle.next().await {
        let done = ev.is_terminal();
        events.push(ev);
        if done {
            break;
        }
    }
    events
}

// =============================================================================
// Auth task
// =============================================================================

mod auth_task {
    use super::*;

    #[tokio::test]
    async fn pending_polls_retry_until_authorized() {
        let service = Arc::new(FakeService::pending_for(2));
        let handle = AuthTask::new(service.clone(), Duration::from_millis(5), Duration::from_secs(5))
            .spawn(&Handle::current());

        let events = collect(handle).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], AuthEvent::AwaitingApproval { url } if url.contains("token=tok")));
        assert!(matches!(&events[1], AuthEvent::Authorized { user } if user == "listener"));

        let calls = service.calls();
        assert_eq!(calls.iter().filter(|c| c.starts_with("poll_session")).count(), 3);
        assert_eq!(calls.last().map(String::as_str), Some("persist sk-1"));
        assert!(service.is_authenticated());
    }

    #[tokio::test]
    async fn cancel_ends_task() {
        let service = Arc::new(FakeService::pending_for(usize::MAX));
        let mut handle = AuthTask::new(service.clone(), Duration::from_millis(5), Duration::from_secs(30))
            .spawn(&Handle::current());

        let first = handle.next().await.unwrap();
        assert!(matches!(first, AuthEvent::AwaitingApproval { .. }));
        handle.cancel();

        let events = collect(handle).await;
        assert!(matches!(events.last(), Some(AuthEvent::Cancelled)));
        assert!(!service.is_authenticated());
    }

    #[tokio::test]
    async fn timeout_ends_task() {
        let service = Arc::new(FakeService::pending_for(usize::MAX));
        let handle = AuthTask::new(service, Duration::from_millis(5), Duration::from_millis(40))
            .spawn(&Handle::current());

        let events = collect(handle).await;
        assert!(matches!(
            events.last(),
            Some(AuthEvent::Failed(ScrobbleError::Timeout))
        ));
    }

    #[tokio::test]
    async fn token_failure_is_reported() {
        let service = Arc::new(FakeService {
            fail_begin: true,
            ..FakeService::default()
        });
        let handle = AuthTask::new(service, Duration::from_millis(5), Duration::from_secs(5))
            .spawn(&Handle::current());

        let events = collect(handle).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            AuthEvent::Failed(ScrobbleError::Api { code: 10, .. })
        ));
    }
}

// =============================================================================
// Tracker
// =============================================================================

mod tracker {
    use super::*;

    #[test]
    fn threshold_follows_lastfm_rules() {
        assert_eq!(scrobble_threshold(30.0), None);
        assert_eq!(scrobble_threshold(12.0), None);
        assert_eq!(scrobble_threshold(100.0), Some(50.0));
        assert_eq!(scrobble_threshold(600.0), Some(240.0));
    }

    #[test]
    fn announces_then_scrobbles_once() {
        let mut t = ScrobbleTracker::new();
        let start = t.start(1, Some(track()), 1_000);
        assert_eq!(start, Some(TrackerAction::NowPlaying(track())));

        assert_eq!(t.progress(60.0, 151.0), None);
        assert_eq!(
            t.progress(76.0, 151.0),
            Some(TrackerAction::Scrobble {
                track: track(),
                started_at: 1_000
            })
        );
        assert_eq!(t.progress(120.0, 151.0), None);
    }

    #[test]
    fn untagged_play_is_silent() {
        let mut t = ScrobbleTracker::new();
        assert_eq!(t.start(1, None, 0), None);
        assert_eq!(t.progress(500.0, 600.0), None);
        assert_eq!(t.generation(), Some(1));
    }

    #[test]
    fn tag_duration_covers_unknown_length() {
        let mut t = ScrobbleTracker::new();
        t.start(4, Some(track()), 0);
        assert!(t.progress(80.0, 0.0).is_some());
    }

    #[test]
    fn short_tracks_never_scrobble() {
        let mut t = ScrobbleTracker::new();
        let short = TrackInfo {
            duration: Some(Duration::from_secs(20)),
            ..track()
        };
        t.start(1, Some(short), 0);
        assert_eq!(t.progress(20.0, 20.0), None);
    }

    #[test]
    fn track_info_needs_an_artist() {
        let tags = TrackTags {
            title: Some("Intro".into()),
            ..TrackTags::default()
        };
        assert_eq!(TrackInfo::from_tags(tags, Path::new("/m/01 intro.mp3")), None);

        let tags = TrackTags {
            artist: Some("Autechre".into()),
            ..TrackTags::default()
        };
        let info = TrackInfo::from_tags(tags, Path::new("/m/Gantz Graf.flac")).unwrap();
        assert_eq!(info.title, "Gantz Graf");
        assert_eq!(info.artist, "Autechre");
    }
}

// =============================================================================
// Session key store
// =============================================================================

mod store {
    use super::*;

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionKeyStore::new(dir.path().join("auth").join("lastfm.toml"));
        assert_eq!(store.load().unwrap(), None);

        let session = SessionKey {
            key: "abc".into(),
            name: "listener".into(),
        };
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn garbage_store_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lastfm.toml");
        std::fs::write(&path, "key = [").unwrap();
        let err = SessionKeyStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ScrobbleError::Store { .. }));
    }
}

// =============================================================================
// Last.fm client over HTTP
// =============================================================================

mod client {
    use super::*;

    fn settings(server: &MockServer) -> ScrobbleSettings {
        ScrobbleSettings {
            api_key: Some("key".into()),
            api_secret: Some("secret".into()),
            api_root: format!("{}/2.0/", server.uri()),
            auth_url: "https://www.last.fm/api/auth/".into(),
            ..ScrobbleSettings::default()
        }
    }

    fn client(server: &MockServer, dir: &TempDir) -> LastFmClient {
        LastFmClient::new(&settings(server), SessionKeyStore::new(dir.path().join("lastfm.toml"))).unwrap()
    }

    #[tokio::test]
    async fn missing_credentials_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = LastFmClient::new(
            &ScrobbleSettings::default(),
            SessionKeyStore::new(dir.path().join("lastfm.toml")),
        );
        assert!(matches!(result, Err(ScrobbleError::MissingCredentials)));
    }

    #[tokio::test]
    async fn signature_is_md5_of_sorted_params_and_secret() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let c = client(&server, &dir);

        let sig = c.sign(&[
            ("token", "TOK".to_string()),
            ("method", "auth.getSession".to_string()),
            ("api_key", "key".to_string()),
            ("format", "json".to_string()),
        ]);
        assert_eq!(sig, "efd5151cbef586de4d170ab37f919170");
    }

    #[tokio::test]
    async fn begin_auth_builds_approval_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2.0/"))
            .and(query_param("method", "auth.getToken"))
            .and(query_param("api_key", "key"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"token":"T0K3N"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let token = client(&server, &dir).begin_auth().await.unwrap();
        assert_eq!(token.token, "T0K3N");
        assert_eq!(token.url, "https://www.last.fm/api/auth/?api_key=key&token=T0K3N");
    }

    #[tokio::test]
    async fn unapproved_token_is_pending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("method", "auth.getSession"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"error":14,"message":"Unauthorized Token - This token has not been authorized"}"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let poll = client(&server, &dir).poll_session("T").await.unwrap();
        assert_eq!(poll, SessionPoll::Pending);
    }

    #[tokio::test]
    async fn other_api_errors_surface() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("method", "auth.getSession"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_string(r#"{"error":15,"message":"This token has expired"}"#),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = client(&server, &dir).poll_session("T").await.unwrap_err();
        assert!(matches!(err, ScrobbleError::Api { code: 15, .. }));
    }

    #[tokio::test]
    async fn approved_token_persists_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("method", "auth.getSession"))
            .and(query_param("token", "T"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"session":{"name":"listener","key":"sk-9","subscriber":0}}"#,
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let c = client(&server, &dir);
        assert!(!c.is_authenticated());

        let SessionPoll::Authorized(session) = c.poll_session("T").await.unwrap() else {
            panic!("expected a session");
        };
        c.persist_token(&session).unwrap();
        assert!(c.is_authenticated());
        assert_eq!(c.user().as_deref(), Some("listener"));

        // A fresh client picks the stored key up.
        let again = client(&server, &dir);
        assert!(again.is_authenticated());

        again.clear_token().unwrap();
        assert!(!again.is_authenticated());
        assert!(!client(&server, &dir).is_authenticated());
    }

    #[tokio::test]
    async fn scrobble_posts_signed_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2.0/"))
            .and(body_string_contains("method=track.scrobble"))
            .and(body_string_contains("sk=sk-1"))
            .and(body_string_contains("timestamp=1700000000"))
            .and(body_string_contains("api_sig="))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"scrobbles":{"@attr":{"accepted":1,"ignored":0}}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let c = client(&server, &dir);
        c.persist_token(&SessionKey {
            key: "sk-1".into(),
            name: "listener".into(),
        })
        .unwrap();

        c.scrobble(&track(), 1_700_000_000).await.unwrap();
    }

    #[tokio::test]
    async fn writes_need_a_session() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let err = client(&server, &dir).update_now_playing(&track()).await.unwrap_err();
        assert!(matches!(err, ScrobbleError::Api { code: 9, .. }));
    }
}

// =============================================================================
// Scrobbler glue
// =============================================================================

mod scrobbler {
    use super::*;

    fn scrobbler(service: Arc<FakeService>) -> Scrobbler {
        Scrobbler::new(
            Some(service as Arc<dyn ScrobbleService>),
            Handle::current(),
            Duration::from_millis(5),
            Duration::from_secs(5),
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    #[tokio::test]
    async fn login_reports_events_then_forgets_handle() {
        let service = Arc::new(FakeService::pending_for(1));
        let mut s = scrobbler(service.clone());

        s.login().unwrap();
        assert!(s.is_authenticating());

        let mut events = Vec::new();
        for _ in 0..100 {
            events.extend(s.poll_auth());
            if !s.is_authenticating() {
                break;
            }
            settle().await;
        }

        assert!(matches!(events.first(), Some(AuthEvent::AwaitingApproval { .. })));
        assert!(matches!(events.last(), Some(AuthEvent::Authorized { .. })));
        assert!(s.is_authenticated());

        s.logout().unwrap();
        assert!(!s.is_authenticated());
    }

    #[tokio::test]
    async fn login_without_service_needs_credentials() {
        let mut s = Scrobbler::new(None, Handle::current(), Duration::from_millis(5), Duration::from_secs(1));
        assert!(!s.is_available());
        assert!(matches!(s.login(), Err(ScrobbleError::MissingCredentials)));
        assert!(s.poll_auth().is_empty());
    }

    #[tokio::test]
    async fn plays_are_announced_and_scrobbled() {
        let service = Arc::new(FakeService::logged_in());
        let mut s = scrobbler(service.clone());

        s.observe(1, || Some(track()), 0.0, 151.0);
        s.observe(1, || panic!("described twice"), 40.0, 151.0);
        s.observe(1, || panic!("described twice"), 80.0, 151.0);
        s.observe(1, || panic!("described twice"), 100.0, 151.0);
        settle().await;

        assert_eq!(service.calls(), vec!["now_playing Roygbiv", "scrobble Roygbiv"]);
    }

    #[tokio::test]
    async fn nothing_is_sent_when_logged_out() {
        let service = Arc::new(FakeService::default());
        let mut s = scrobbler(service.clone());

        s.observe(1, || Some(track()), 100.0, 151.0);
        settle().await;
        assert!(service.calls().is_empty());
    }
}
