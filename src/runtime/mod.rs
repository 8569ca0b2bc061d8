use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info, warn};

use crate::logging;
use crate::session::SessionStore;

mod event_loop;
mod settings;
mod startup;

/// Grace period for in-flight scrobbles when quitting.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_warning) = settings::load_settings();

    // Held until exit so buffered lines reach the file.
    let _log_guard = match settings.log_dir() {
        Some(dir) => match logging::init(&dir, &settings.logging.filter) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("allegro: logging disabled: {e}");
                None
            }
        },
        None => None,
    };
    if let Some(msg) = config_warning {
        warn!("{msg}");
    }

    let start_dir = env::args_os().nth(1).map(PathBuf::from);
    let cwd = env::current_dir()
        .inspect_err(|e| warn!(error = %e, "no working directory, relative folders stay relative"))
        .unwrap_or_default();
    let session = settings.session_path().map(SessionStore::new);

    let network = startup::network_runtime()?;
    let mut app = startup::build_app(&settings, &cwd, start_dir.as_deref(), session.as_ref(), &network)
        .inspect_err(|e| error!(error = %e, "startup failed"))?;

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::new();
        event_loop::run(&mut terminal, &settings, &mut app, &mut state)
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Some(store) = &session {
        let state = app.player.session_state();
        match store.save(&state) {
            Ok(()) => info!(path = %store.path().display(), "session saved"),
            Err(e) => warn!(error = %e, "cannot save session"),
        }
    }

    drop(app);
    network.shutdown_timeout(SHUTDOWN_GRACE);

    run_result
}
