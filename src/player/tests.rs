use super::*;
use crate::audio::fake::FakeEngine;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

/// music/
///   Live/
///     encore.ogg
///   a.mp3
///   b.mp3
///   notes.txt
fn music_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("Live")).unwrap();
    fs::write(dir.path().join("Live").join("encore.ogg"), b"").unwrap();
    fs::write(dir.path().join("b.mp3"), b"").unwrap();
    fs::write(dir.path().join("a.mp3"), b"").unwrap();
    fs::write(dir.path().join("notes.txt"), b"").unwrap();
    dir
}

fn player_at(dir: &Path) -> Player<FakeEngine> {
    let mut p = Player::with_rng(FakeEngine::new(), LibrarySettings::default(), StdRng::seed_from_u64(3));
    p.handle(Command::Navigate(dir.to_path_buf())).unwrap();
    p
}

fn names(p: &Player<FakeEngine>) -> Vec<&str> {
    p.snapshot().entries.iter().map(|e| e.name.as_str()).collect()
}

fn playing_name(p: &Player<FakeEngine>) -> Option<&str> {
    p.transport().current().map(|c| c.entry.name.as_str())
}

#[test]
fn navigate_lists_folder() {
    let dir = music_dir();
    let p = player_at(dir.path());
    assert_eq!(names(&p), vec!["Live", "a.mp3", "b.mp3"]);
    assert_eq!(p.dir(), dir.path());
}

#[test]
fn navigate_failure_keeps_previous_folder() {
    let dir = music_dir();
    let mut p = player_at(dir.path());

    let err = p.handle(Command::Navigate(dir.path().join("missing"))).unwrap_err();
    assert!(matches!(err, PlayerError::Io { .. }));
    assert_eq!(p.dir(), dir.path());
    assert_eq!(names(&p), vec!["Live", "a.mp3", "b.mp3"]);
}

#[test]
fn open_enters_folders_and_plays_files() {
    let dir = music_dir();
    let mut p = player_at(dir.path());

    p.handle(Command::Open(2)).unwrap();
    assert_eq!(playing_name(&p), Some("b.mp3"));

    p.handle(Command::Open(0)).unwrap();
    assert_eq!(p.dir(), dir.path().join("Live"));
    assert_eq!(names(&p), vec!["encore.ogg"]);
    // Browsing does not interrupt playback.
    assert_eq!(playing_name(&p), Some("b.mp3"));

    p.handle(Command::Parent).unwrap();
    assert_eq!(p.dir(), dir.path());
}

#[test]
fn open_out_of_range_is_error() {
    let dir = music_dir();
    let mut p = player_at(dir.path());
    assert!(matches!(
        p.handle(Command::Open(42)),
        Err(PlayerError::IndexOutOfBounds(42))
    ));
}

#[test]
fn toggle_from_idle_starts_first_track() {
    let dir = music_dir();
    let mut p = player_at(dir.path());
    p.handle(Command::Toggle(None)).unwrap();

    assert_eq!(playing_name(&p), Some("a.mp3"));
    assert_eq!(p.transport().state(), PlaybackState::Playing);
    assert_eq!(p.transport().elapsed(), 0.0);
}

#[test]
fn tick_advances_when_track_ends() {
    let dir = music_dir();
    let mut p = player_at(dir.path());
    p.handle(Command::Play(2)).unwrap();
    p.transport_mut().engine_mut().elapsed_ms = 4_000;

    p.handle(Command::Tick).unwrap();
    assert_eq!(playing_name(&p), Some("b.mp3"));
    assert_eq!(p.seek().value(), 4.0);

    p.transport_mut().engine_mut().finish();
    p.handle(Command::Tick).unwrap();
    assert_eq!(playing_name(&p), Some("a.mp3"));
    assert_eq!(p.seek().value(), 0.0);
}

#[test]
fn tick_while_grabbed_keeps_bar_under_pointer() {
    let dir = music_dir();
    let mut p = player_at(dir.path());
    p.handle(Command::Play(1)).unwrap();
    p.handle(Command::Tick).unwrap();

    p.handle(Command::SeekGrab).unwrap();
    p.handle(Command::SeekDrag(90.0)).unwrap();
    p.transport_mut().engine_mut().elapsed_ms = 2_000;
    p.handle(Command::Tick).unwrap();
    assert_eq!(p.seek().value(), 90.0);

    p.handle(Command::SeekRelease(90.0)).unwrap();
    assert_eq!(p.transport().engine().last_start, Some(Duration::from_secs(90)));
    assert_eq!(p.seek().value(), 90.0);
}

#[test]
fn seek_by_is_relative_to_elapsed() {
    let dir = music_dir();
    let mut p = player_at(dir.path());
    p.handle(Command::Play(1)).unwrap();
    p.transport_mut().engine_mut().elapsed_ms = 20_000;

    p.handle(Command::SeekBy(5.0)).unwrap();
    assert_eq!(p.transport().elapsed(), 25.0);

    p.handle(Command::SeekBy(-60.0)).unwrap();
    assert_eq!(p.transport().elapsed(), 0.0);
}

#[test]
fn seek_click_uses_fraction_of_length() {
    let dir = music_dir();
    let mut p = player_at(dir.path());
    p.handle(Command::Play(1)).unwrap();
    p.handle(Command::SeekClick(0.5)).unwrap();
    assert_eq!(p.transport().elapsed(), 90.0);
}

#[test]
fn shuffle_then_refresh_restores_order() {
    let dir = music_dir();
    for n in ["c.mp3", "d.mp3", "e.mp3", "f.mp3"] {
        fs::write(dir.path().join(n), b"").unwrap();
    }
    let mut p = player_at(dir.path());
    let sorted: Vec<String> = names(&p).into_iter().map(String::from).collect();

    p.handle(Command::Shuffle).unwrap();
    assert_eq!(p.snapshot().entries[0].name, "Live");
    assert_eq!(p.snapshot().len(), sorted.len());

    p.handle(Command::Refresh).unwrap();
    assert_eq!(names(&p), sorted.iter().map(String::as_str).collect::<Vec<_>>());
}

#[test]
fn volume_command_clamps() {
    let dir = music_dir();
    let mut p = player_at(dir.path());
    p.handle(Command::SetVolume(300)).unwrap();
    assert_eq!(p.transport().volume(), 100);
}

#[test]
fn session_state_reflects_transport() {
    let dir = music_dir();
    let mut p = player_at(dir.path());
    p.handle(Command::SetVolume(70)).unwrap();
    p.handle(Command::Play(1)).unwrap();
    p.transport_mut().engine_mut().elapsed_ms = 42_000;
    p.handle(Command::Toggle(None)).unwrap();
    // Browse away; the song's own folder is what gets saved.
    p.handle(Command::Open(0)).unwrap();

    let s = p.session_state();
    assert_eq!(s.volume, 70);
    assert_eq!(s.current_song, "a.mp3");
    assert_eq!(s.folder_path, dir.path().to_string_lossy());
    assert_eq!(s.last_position, 42.0);
    assert!(!s.was_playing);
}

#[test]
fn session_state_when_idle() {
    let dir = music_dir();
    let p = player_at(dir.path());
    let s = p.session_state();
    assert_eq!(s.current_song, "");
    assert_eq!(s.last_position, 0.0);
    assert!(!s.was_playing);
    assert_eq!(s.folder_path, dir.path().to_string_lossy());
}

#[test]
fn restore_brings_back_paused_song() {
    let dir = music_dir();
    let mut p = Player::with_rng(FakeEngine::new(), LibrarySettings::default(), StdRng::seed_from_u64(1));
    let session = SessionState {
        volume: 30,
        folder_path: dir.path().to_string_lossy().into_owned(),
        current_song: "a.mp3".into(),
        last_position: 42.0,
        was_playing: false,
    };

    p.restore(&session, None, Path::new("/nowhere"));

    assert_eq!(p.dir(), dir.path());
    assert_eq!(playing_name(&p), Some("a.mp3"));
    assert_eq!(p.transport().state(), PlaybackState::Paused);
    assert_eq!(p.transport().elapsed(), 42.0);
    assert_eq!(p.transport().volume(), 30);
    assert_eq!(p.seek().value(), 42.0);
}

#[test]
fn restore_with_missing_song_only_opens_folder() {
    let dir = music_dir();
    let mut p = Player::with_rng(FakeEngine::new(), LibrarySettings::default(), StdRng::seed_from_u64(1));
    let session = SessionState {
        folder_path: dir.path().to_string_lossy().into_owned(),
        current_song: "deleted.mp3".into(),
        ..SessionState::default()
    };

    p.restore(&session, None, Path::new("/nowhere"));
    assert_eq!(p.dir(), dir.path());
    assert_eq!(p.transport().state(), PlaybackState::Idle);
}

#[test]
fn restore_with_override_folder_skips_song() {
    let dir = music_dir();
    let other = tempfile::tempdir().unwrap();
    fs::write(other.path().join("a.mp3"), b"").unwrap();

    let mut p = Player::with_rng(FakeEngine::new(), LibrarySettings::default(), StdRng::seed_from_u64(1));
    let session = SessionState {
        folder_path: dir.path().to_string_lossy().into_owned(),
        current_song: "a.mp3".into(),
        was_playing: true,
        ..SessionState::default()
    };

    p.restore(&session, Some(other.path()), Path::new("/nowhere"));
    assert_eq!(p.dir(), other.path());
    assert_eq!(p.transport().state(), PlaybackState::Idle);
}

#[test]
fn restore_without_saved_folder_uses_fallback() {
    let dir = music_dir();
    let mut p = Player::with_rng(FakeEngine::new(), LibrarySettings::default(), StdRng::seed_from_u64(1));
    p.restore(&SessionState::default(), None, dir.path());
    assert_eq!(p.dir(), dir.path());
    assert_eq!(p.transport().volume(), 50);
}

#[test]
fn relative_start_folder_keeps_parent_and_saves_absolute_path() {
    let root = tempfile::tempdir().unwrap();
    let music = root.path().join("music");
    fs::create_dir(&music).unwrap();
    fs::write(music.join("a.mp3"), b"").unwrap();
    let canonical_root = fs::canonicalize(root.path()).unwrap();

    let start = crate::library::absolute_folder(&music, Path::new("."));
    let mut p = Player::with_rng(FakeEngine::new(), LibrarySettings::default(), StdRng::seed_from_u64(1));
    p.restore(&SessionState::default(), Some(&start), Path::new("/nowhere"));
    assert_eq!(p.dir(), canonical_root.join("music"));

    p.handle(Command::Toggle(None)).unwrap();
    let saved = p.session_state();
    assert!(Path::new(&saved.folder_path).is_absolute());
    assert_eq!(Path::new(&saved.folder_path), canonical_root.join("music"));

    p.handle(Command::Parent).unwrap();
    assert_eq!(p.dir(), canonical_root);
    assert_eq!(names(&p), vec!["music"]);
}
