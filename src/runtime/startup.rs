use std::path::Path;

use tokio::runtime::Runtime;
use tracing::info;

use crate::app::App;
use crate::audio::RodioEngine;
use crate::config;
use crate::library;
use crate::player::Player;
use crate::scrobble::Scrobbler;
use crate::session::SessionStore;

/// Runtime for network work only; the player stays on the UI thread.
pub fn network_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("allegro-net")
        .enable_all()
        .build()
}

/// Open the audio device, restore the last session and wire up Last.fm.
///
/// Fails only when there is no audio output.
pub fn build_app(
    settings: &config::Settings,
    cwd: &Path,
    start_dir: Option<&Path>,
    session: Option<&SessionStore>,
    runtime: &Runtime,
) -> Result<App<RodioEngine>, Box<dyn std::error::Error>> {
    let engine = RodioEngine::open()?;
    let mut player = Player::new(engine, settings.library.clone());

    let saved = session.map(SessionStore::load).unwrap_or_default();
    let start_dir = start_dir.map(|dir| library::absolute_folder(cwd, dir));
    let mut music_dir = settings.music_dir();
    if music_dir.is_relative() {
        music_dir = library::absolute_folder(cwd, &music_dir);
    }
    player.restore(&saved, start_dir.as_deref(), &music_dir);
    info!(dir = %player.dir().display(), "library opened");

    let store_path = settings.scrobble_store_path();
    let scrobbler = Scrobbler::from_settings(&settings.scrobble, store_path.as_deref(), runtime.handle().clone());

    Ok(App::new(player, scrobbler, &settings.audio))
}
