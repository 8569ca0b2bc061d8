use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};

use crate::app::App;
use crate::audio::AudioEngine;
use crate::config;
use crate::player::Command;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Seek bar position from the last draw, for mouse hit-testing.
    seek_area: Rect,
    last_tick: Instant,
}

impl EventLoopState {
    pub fn new() -> Self {
        Self {
            pending_gg: false,
            seek_area: Rect::default(),
            last_tick: Instant::now(),
        }
    }
}

/// Main terminal event loop: ticks playback, draws, handles input.
/// Returns `Ok(())` when the user quits.
pub fn run<E: AudioEngine>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App<E>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick = Duration::from_millis(settings.audio.poll_interval_ms.max(1));

    loop {
        if state.last_tick.elapsed() >= tick {
            app.on_tick();
            state.last_tick = Instant::now();
        }

        terminal.draw(|f| {
            state.seek_area = ui::layout_for(f.area(), app).seek;
            ui::draw(f, app, settings.audio.scrub_seconds);
        })?;

        let wait = tick.saturating_sub(state.last_tick.elapsed());
        if !event::poll(wait)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, app, state) {
                    break;
                }
            }
            Event::Mouse(mouse) => handle_mouse_event(mouse, app, state),
            _ => {}
        }
    }

    Ok(())
}

/// Returns `true` when the user asked to quit.
fn handle_key_event<E: AudioEngine>(key: KeyEvent, app: &mut App<E>, state: &mut EventLoopState) -> bool {
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Backspace => app.go_parent(),
        KeyCode::Char('p') | KeyCode::Char(' ') => app.toggle_playback(),
        KeyCode::Char('l') => app.dispatch(Command::Next),
        KeyCode::Char('h') => app.dispatch(Command::Previous),
        KeyCode::Char('L') => app.scrub_forward(),
        KeyCode::Char('H') => app.scrub_back(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.volume_up(),
        KeyCode::Char('-') => app.volume_down(),
        KeyCode::Char('s') => app.shuffle(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('a') => app.toggle_login(),
        KeyCode::Esc => app.cancel_login(),
        KeyCode::Char(c @ '0'..='9') => {
            let tenth = f64::from(c.to_digit(10).unwrap_or(0));
            app.dispatch(Command::SeekClick(tenth / 10.0));
        }
        _ => {}
    }
    false
}

fn handle_mouse_event<E: AudioEngine>(mouse: MouseEvent, app: &mut App<E>, state: &EventLoopState) {
    let maximum = app.player.seek().maximum();
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(fraction) = ui::seek_fraction(state.seek_area, mouse.column, mouse.row) {
                app.dispatch(Command::SeekGrab);
                app.dispatch(Command::SeekDrag(fraction * maximum));
            }
        }
        MouseEventKind::Drag(MouseButton::Left) if app.player.seek().is_grabbed() => {
            let fraction = ui::seek_fraction_clamped(state.seek_area, mouse.column);
            app.dispatch(Command::SeekDrag(fraction * maximum));
        }
        MouseEventKind::Up(MouseButton::Left) if app.player.seek().is_grabbed() => {
            let value = app.player.seek().value();
            app.dispatch(Command::SeekRelease(value));
        }
        _ => {}
    }
}
