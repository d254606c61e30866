//! UI rendering for the terminal user interface.
//!
//! Everything drawn here is read from the controller's presentation surface
//! (rows, tag chips, playback state) and the terminal-side [`ViewState`].

use std::collections::BTreeMap;
use std::str::FromStr;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use tracing::debug;

use crate::app::{Controller, InputMode, PlaybackState, ViewState};
use crate::audio::Backend;
use crate::config::{ControlsSettings, UiSettings};

/// Colors resolved from the `ui.color_scheme` table.
///
/// Values are anything `ratatui` parses as a color: names (`yellow`,
/// `lightblue`), indexed (`42`) or hex (`#1d1d1d`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub border: Color,
    pub title: Color,
    pub tag: Color,
    pub tag_active: Color,
    pub search: Color,
    pub progress: Color,
    pub playlist: Color,
    pub playlist_active: Color,
    pub playlist_background: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border: Color::Reset,
            title: Color::Yellow,
            tag: Color::Gray,
            tag_active: Color::LightMagenta,
            search: Color::Reset,
            progress: Color::LightMagenta,
            playlist: Color::Reset,
            playlist_active: Color::LightMagenta,
            playlist_background: Color::Reset,
        }
    }
}

impl Theme {
    /// Apply the recognized keys of `scheme` over the defaults.
    pub fn from_scheme(scheme: &BTreeMap<String, String>) -> Self {
        let mut theme = Self::default();
        for (key, value) in scheme {
            let Ok(color) = Color::from_str(value.trim()) else {
                debug!(key = key.as_str(), value = value.as_str(), "ignoring unparsable color");
                continue;
            };
            let slot = match key.as_str() {
                "border_color" => &mut theme.border,
                "title_color" => &mut theme.title,
                "tag_color" => &mut theme.tag,
                "tag_active_color" => &mut theme.tag_active,
                "search_color" => &mut theme.search,
                "progress_color" => &mut theme.progress,
                "playlist_color" => &mut theme.playlist,
                "playlist_active_color" => &mut theme.playlist_active,
                "playlist_background" => &mut theme.playlist_background,
                _ => {
                    debug!(key = key.as_str(), "ignoring unknown color scheme key");
                    continue;
                }
            };
            *slot = color;
        }
        theme
    }
}

/// Render the controls help text, incorporating the configured steps.
fn controls_text(controls: &ControlsSettings) -> String {
    [
        "[space/p] play/pause".to_string(),
        "[h/l] prev/next".to_string(),
        format!("[H/L] seek -/+{}%", controls.seek_step_percent),
        format!("[+/-] volume {}", controls.volume_step),
        "[r] loop".to_string(),
        "[s] shuffle".to_string(),
        "[/] search".to_string(),
        "[1-9] tags".to_string(),
        "[j/k] move".to_string(),
        "[enter] play selected".to_string(),
        "[o] open file".to_string(),
        "[q] quit".to_string(),
    ]
    .join(" | ")
}

/// Short flags line: transport, loop, shuffle and volume.
fn status_text(state: &PlaybackState) -> String {
    let transport = if state.playing { "Playing" } else { "Paused" };
    let looped = if state.looped { "Loop: ON" } else { "Loop: OFF" };
    let shuffled = if state.shuffled { "Shuffle: ON" } else { "Shuffle: OFF" };
    let volume = (state.volume * 100.0).round() as i32;
    format!("{transport} • {looped} • {shuffled} • Vol: {volume}%")
}

fn bordered<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(title)
}

/// Render the entire UI into `frame`.
pub fn draw<B: Backend>(
    frame: &mut Frame,
    controller: &Controller<B>,
    view: &ViewState,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
    theme: &Theme,
) {
    let chips = controller.tag_chips();
    let show_tags = ui_settings.include_tags && !chips.is_empty();

    let mut constraints = vec![Constraint::Length(3)];
    if show_tags {
        constraints.push(Constraint::Length(3));
    }
    if ui_settings.include_search {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Length(5));
    constraints.push(if ui_settings.show_playlist {
        Constraint::Min(1)
    } else {
        Constraint::Min(0)
    });
    constraints.push(Constraint::Length(4));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());
    let mut next = chunks.iter().copied();
    let mut take = || next.next().unwrap_or_default();

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(bordered(" tagdeck ", theme).title_alignment(Alignment::Center));
    frame.render_widget(header, take());

    if show_tags {
        let mut spans: Vec<Span> = Vec::new();
        for (i, chip) in chips.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw("  "));
            }
            let label = if i < 9 {
                format!("[{}] {}", i + 1, chip.tag)
            } else {
                chip.tag.clone()
            };
            let style = if chip.active {
                Style::default()
                    .fg(theme.tag_active)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(theme.tag)
            };
            spans.push(Span::styled(label, style));
        }
        let tags = Paragraph::new(Line::from(spans)).block(bordered(" tags ", theme));
        frame.render_widget(tags, take());
    }

    if ui_settings.include_search {
        draw_search(frame, take(), controller, view, theme);
    }

    draw_now_playing(frame, take(), controller, theme);

    let list_area = take();
    if ui_settings.show_playlist {
        draw_playlist(frame, list_area, controller, view, theme);
    }

    // Footer: path prompt, notice, or the key help.
    let footer_text = match (&view.mode, &view.message) {
        (InputMode::OpenPath(path), _) => format!("Open file: {path}_  (enter to load, esc to cancel)"),
        (_, Some(message)) => message.clone(),
        _ => controls_text(controls_settings),
    };
    let footer = Paragraph::new(footer_text)
        .block(bordered(" controls ", theme).padding(Padding::left(1)))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, take());
}

fn draw_search<B: Backend>(
    frame: &mut Frame,
    area: Rect,
    controller: &Controller<B>,
    view: &ViewState,
    theme: &Theme,
) {
    let editing = view.mode == InputMode::Search;
    let query = controller.query().as_str();

    let line = if query.is_empty() && !editing {
        Line::from(Span::styled(
            controller.search_placeholder(),
            Style::default().add_modifier(Modifier::DIM),
        ))
    } else {
        let cursor = if editing { "_" } else { "" };
        Line::from(Span::styled(
            format!("{query}{cursor}"),
            Style::default().fg(theme.search),
        ))
    };

    let title = if editing { " search (esc to leave) " } else { " search " };
    frame.render_widget(Paragraph::new(line).block(bordered(title, theme)), area);
}

fn draw_now_playing<B: Backend>(
    frame: &mut Frame,
    area: Rect,
    controller: &Controller<B>,
    theme: &Theme,
) {
    let state = controller.state();
    let block = bordered(" now playing ", theme).padding(Padding::horizontal(1));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let title = if controller.has_session() {
        state.title.as_str()
    } else {
        "-"
    };
    let title = Paragraph::new(Span::styled(
        title,
        Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(title, rows[0]);

    let ratio = (state.slider / 100.0).clamp(0.0, 1.0);
    let label = format!(
        "{}  (buffered {:.0}%)",
        controller.time_text(),
        state.buffered
    );
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(theme.progress))
        .ratio(if controller.has_session() { ratio } else { 0.0 })
        .label(label);
    frame.render_widget(gauge, rows[1]);

    frame.render_widget(Paragraph::new(status_text(state)), rows[2]);
}

fn draw_playlist<B: Backend>(
    frame: &mut Frame,
    area: Rect,
    controller: &Controller<B>,
    view: &ViewState,
    theme: &Theme,
) {
    let block = bordered(" playlist ", theme)
        .style(Style::default().bg(theme.playlist_background));

    let rows = controller.rows();
    if rows.is_empty() {
        let text = if controller.catalog().is_empty() {
            "No tracks loaded. Press o to open a file."
        } else {
            "No tracks match the current tags and search."
        };
        let empty = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    // Only build items for the visible window, centred on the cursor.
    let total = rows.len();
    let height = area.height.saturating_sub(2) as usize;
    let cursor = view.cursor.min(total - 1);
    let (start, end) = if total <= height || height == 0 {
        (0, total)
    } else {
        let mut start = cursor.saturating_sub(height / 2);
        if start + height > total {
            start = total - height;
        }
        (start, start + height)
    };

    let items: Vec<ListItem> = rows[start..end]
        .iter()
        .map(|row| {
            if row.active {
                ListItem::new(format!("♪ {}", row.title)).style(
                    Style::default()
                        .fg(theme.playlist_active)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ListItem::new(format!("  {}", row.title)).style(Style::default().fg(theme.playlist))
            }
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(cursor - start));
    frame.render_stateful_widget(list, area, &mut state);
}
