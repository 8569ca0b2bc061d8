//! Terminal rendering with `ratatui`.
//!
//! Drawing only reads the [`App`]; the one thing the event loop needs back is
//! where the seek bar sits, see [`layout_for`] and [`seek_fraction`].

use std::collections::BTreeMap;
use std::sync::LazyLock;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::audio::AudioEngine;
use crate::library::TrackEntry;
use crate::seek::format_time;
use crate::transport::PlaybackState;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("j/k", "up/down"),
        ("g/G", "top/bottom"),
        ("enter", "open"),
        ("bksp", "parent"),
        ("space/p", "play/pause"),
        ("h/l", "prev/next"),
        ("0-9", "jump"),
        ("+/-", "volume"),
        ("s", "shuffle"),
        ("r", "sort A-Z"),
        ("a", "Last.fm"),
        ("q", "quit"),
    ])
});

fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "enter", "bksp", "space/p", "h/l", "H/L", "0-9", "+/-", "s", "r", "a", "g/G", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{scrub_seconds}s"))
            } else {
                CONTROLS_MAP.get(k).map(|v| format!("[{k}] {v}"))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

pub struct Areas {
    pub header: Rect,
    pub status: Rect,
    pub list: Rect,
    pub seek: Rect,
    pub footer: Rect,
}

const STATUS_HEIGHT: u16 = 4;

/// Status box height. It grows while an approval URL is shown so the whole
/// URL fits, wrapped, below the state and message lines.
fn status_height(width: u16, auth_url: Option<&str>) -> u16 {
    let Some(url) = auth_url else {
        return STATUS_HEIGHT;
    };
    // Two borders plus one column of left padding.
    let inner = usize::from(width.saturating_sub(3).max(1));
    let url_rows = url.chars().count().div_ceil(inner).max(1);
    let rows = 2 + 2 + url_rows;
    u16::try_from(rows).unwrap_or(u16::MAX).max(STATUS_HEIGHT)
}

/// Screen areas for `app` at this terminal size.
pub fn layout_for<E: AudioEngine>(area: Rect, app: &App<E>) -> Areas {
    layout_areas(area, status_height(area.width, app.auth_url.as_deref()))
}

fn layout_areas(area: Rect, status_height: u16) -> Areas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(status_height),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(area);
    Areas {
        header: chunks[0],
        status: chunks[1],
        list: chunks[2],
        seek: chunks[3],
        footer: chunks[4],
    }
}

/// Where a click at (`column`, `row`) lands on the seek bar, as a fraction of
/// its width. `None` outside the bar's inner area.
pub fn seek_fraction(seek: Rect, column: u16, row: u16) -> Option<f64> {
    let inner = Block::default().borders(Borders::ALL).inner(seek);
    if inner.width == 0 || row < inner.y || row >= inner.y + inner.height {
        return None;
    }
    if column < inner.x || column >= inner.x + inner.width {
        return None;
    }
    let offset = f64::from(column - inner.x);
    let span = f64::from(inner.width.saturating_sub(1).max(1));
    Some((offset / span).clamp(0.0, 1.0))
}

/// Like [`seek_fraction`], but clamps columns outside the bar to its ends.
/// Used while dragging, when the pointer may leave the bar.
pub fn seek_fraction_clamped(seek: Rect, column: u16) -> f64 {
    let inner = Block::default().borders(Borders::ALL).inner(seek);
    let span = f64::from(inner.width.saturating_sub(1).max(1));
    let offset = f64::from(column.saturating_sub(inner.x));
    (offset / span).clamp(0.0, 1.0)
}

fn entry_label(entry: &TrackEntry, playing: bool) -> String {
    let marker = if playing { "♪ " } else { "  " };
    if entry.is_folder() {
        format!("{marker}{}/", entry.name)
    } else {
        format!("{marker}{}", entry.name)
    }
}

/// Rows `[start, end)` to render so the cursor sits mid-list when possible.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize) {
    if total <= height || height == 0 {
        return (0, total);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

pub fn draw<E: AudioEngine>(frame: &mut Frame, app: &App<E>, scrub_seconds: u64) {
    let areas = layout_for(frame.area(), app);
    let transport = app.player.transport();

    let header = Paragraph::new(app.player.dir().display().to_string())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" allegro ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, areas.header);

    // Status box
    let status = {
        let mut parts: Vec<String> = Vec::new();
        match (transport.state(), app.now_playing()) {
            (PlaybackState::Idle, _) | (_, None) if !app.player.snapshot().has_playable() => {
                parts.push("Stopped (no audio in this folder)".to_string())
            }
            (PlaybackState::Idle, _) | (_, None) => parts.push("Stopped".to_string()),
            (state, Some(name)) => parts.push(format!("{}: {name}", capitalize(state.label()))),
        }
        parts.push(format!("Vol: {}%", transport.volume()));

        let lastfm = if app.scrobbler.is_authenticating() {
            "Last.fm: waiting"
        } else if app.scrobbler.is_authenticated() {
            "Last.fm: on"
        } else if app.scrobbler.is_available() {
            "Last.fm: off"
        } else {
            "Last.fm: n/a"
        };
        parts.push(lastfm.to_string());

        let mut text = parts.join(" • ");
        if let Some(msg) = &app.status {
            text.push('\n');
            text.push_str(msg);
        }
        if let Some(url) = &app.auth_url {
            text.push('\n');
            text.push_str(url);
        }
        text
    };
    let status_par = Paragraph::new(status)
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, areas.status);

    // Main list; only the visible window is turned into items.
    {
        let entries = &app.player.snapshot().entries;
        let playing = transport.current_index();
        let height = areas.list.height.saturating_sub(2) as usize;
        let (start, end) = visible_window(entries.len(), height, app.selected);

        let items: Vec<ListItem> = entries[start..end]
            .iter()
            .enumerate()
            .map(|(offset, e)| {
                let item = ListItem::new(entry_label(e, playing == Some(start + offset)));
                if e.is_folder() { item.bold() } else { item }
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" files "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if !entries.is_empty() {
            state.select(Some(app.selected.saturating_sub(start)));
        }
        frame.render_stateful_widget(list, areas.list, &mut state);
    }

    let seek = app.player.seek();
    let label = format!("{} / {}", format_time(seek.value()), format_time(seek.maximum()));
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" position "))
        .ratio(seek.ratio())
        .label(label);
    frame.render_widget(gauge, areas.seek);

    let footer = Paragraph::new(controls_text(scrub_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, areas.footer);
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
