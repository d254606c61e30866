use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::library::Track;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/tagdeck/config.toml` or `~/.config/tagdeck/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `TAGDECK__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
    pub library: LibrarySettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Order the playlist alphabetically by title.
    pub sort_tracks: bool,
    /// Move to the next track when one ends (loop and shuffle take precedence).
    pub auto_play_next_track: bool,
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Whether repeat-one starts enabled.
    pub looped: bool,
    /// Initial volume, 0.0–1.0.
    pub volume: f32,
    /// Ask other MPRIS players on the session bus to pause when playback starts.
    pub pause_other_players: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            sort_tracks: true,
            auto_play_next_track: true,
            shuffle: false,
            looped: false,
            volume: 0.8,
            pause_other_players: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Show the tag filter bar.
    pub include_tags: bool,
    /// Show the search box.
    pub include_search: bool,
    /// Show the playlist panel.
    pub show_playlist: bool,
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Theme variables, e.g. `{ title_color = "yellow", playlist_background = "#1d1d1d" }`.
    ///
    /// Unknown names are ignored; see `ui::Theme` for the recognized ones.
    pub color_scheme: BTreeMap<String, String>,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            include_tags: true,
            include_search: true,
            show_playlist: true,
            header_text: " ~ tagdeck ~ ".to_string(),
            color_scheme: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Slider percentage to move when pressing `H` / `L`.
    pub seek_step_percent: f64,
    /// Volume points (out of 100) to change when pressing `+` / `-`.
    pub volume_step: u8,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            seek_step_percent: 5.0,
            volume_step: 5,
        }
    }
}

/// One configured track.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackSetting {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<TrackSetting> for Track {
    fn from(t: TrackSetting) -> Self {
        Track::new(t.url, t.title, t.tags)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Initial track list, in catalog order.
    pub tracks: Vec<TrackSetting>,
    /// Directory scanned at startup; its tracks follow the configured ones.
    pub scan_dir: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            tracks: default_tracks(),
            scan_dir: None,
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            recursive: true,
            include_hidden: true,
            follow_links: true,
        }
    }
}

fn default_tracks() -> Vec<TrackSetting> {
    let demo = |file: &str, title: &str, tag: &str| TrackSetting {
        url: format!("https://audioplayer.madza.dev/{file}"),
        title: title.to_string(),
        tags: vec![tag.to_string()],
    };
    vec![
        demo("Madza-Chords_of_Life.mp3", "Madza - Chords of Life", "house"),
        demo("Madza-Late_Night_Drive.mp3", "Madza - Late Night Drive", "dnb"),
        demo("Madza-Persistence.mp3", "Madza - Persistence", "dubstep"),
    ]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Log file; the terminal belongs to the UI.
    pub file: Option<PathBuf>,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}
