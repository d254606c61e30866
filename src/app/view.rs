//! Presentation surface: what the UI renders, derived from the controller,
//! plus the small amount of terminal-only state (cursor, input mode).

use crate::audio::Backend;

use super::controller::Controller;
use super::state::format_time;

/// One playlist entry as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRow {
    /// Catalog index.
    pub index: usize,
    pub title: String,
    pub url: String,
    /// This row is the live session's track.
    pub active: bool,
}

/// One tag in the filter bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagChip {
    pub tag: String,
    pub active: bool,
}

impl<B: Backend> Controller<B> {
    /// Playlist rows in derived order (filtered, optionally sorted).
    pub fn rows(&self) -> Vec<PlaylistRow> {
        let live = self.has_session().then(|| self.current());
        self.playlist()
            .base()
            .iter()
            .filter_map(|&index| {
                self.catalog().get(index).map(|track| PlaylistRow {
                    index,
                    title: track.title.clone(),
                    url: track.url.clone(),
                    active: live == Some(index),
                })
            })
            .collect()
    }

    /// Every tag in the catalog. A chip is active only while a filter is
    /// set and includes it.
    pub fn tag_chips(&self) -> Vec<TagChip> {
        let filter = self.filter();
        self.tags()
            .into_iter()
            .map(|tag| TagChip {
                active: !filter.is_empty() && filter.contains(&tag),
                tag,
            })
            .collect()
    }

    /// `elapsed/total`, e.g. `1:05/3:01`.
    pub fn time_text(&self) -> String {
        let state = self.state();
        format!("{}/{}", format_time(state.time), format_time(state.duration))
    }

    pub fn search_placeholder(&self) -> String {
        format!("Search {} tracks...", self.catalog().len())
    }
}

/// What keystrokes currently edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing into the search box.
    Search,
    /// Typing a path to load with `o`.
    OpenPath(String),
}

/// Terminal-side state that the controller does not care about.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Highlighted row in the playlist panel.
    pub cursor: usize,
    pub mode: InputMode,
    /// One-line notice shown in the footer, e.g. a failed file load.
    pub message: Option<String>,
}

impl ViewState {
    pub fn cursor_down(&mut self, rows: usize) {
        if rows > 0 {
            self.cursor = (self.cursor + 1).min(rows - 1);
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Keep the cursor inside a list of `rows` entries.
    pub fn clamp(&mut self, rows: usize) {
        self.cursor = self.cursor.min(rows.saturating_sub(1));
    }

    /// Put the cursor on the row for catalog index `index`, if shown.
    pub fn follow(&mut self, rows: &[PlaylistRow], index: usize) {
        if let Some(pos) = rows.iter().position(|r| r.index == index) {
            self.cursor = pos;
        }
    }
}
