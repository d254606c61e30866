use super::load::{default_config_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_tagdeck_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("TAGDECK_CONFIG_PATH", "/tmp/tagdeck-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/tagdeck-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("tagdeck")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("tagdeck")
            .join("config.toml")
    );
}

#[test]
fn defaults_match_the_documented_options() {
    let s = Settings::default();
    assert!(s.playback.sort_tracks);
    assert!(s.playback.auto_play_next_track);
    assert!(!s.playback.shuffle);
    assert!(!s.playback.looped);
    assert_eq!(s.playback.volume, 0.8);
    assert!(s.ui.include_tags);
    assert!(s.ui.include_search);
    assert!(s.ui.show_playlist);
    assert!(s.ui.color_scheme.is_empty());
    assert_eq!(s.library.tracks.len(), 3);
    assert_eq!(s.library.tracks[1].tags, vec!["dnb".to_string()]);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r##"
[playback]
sort_tracks = false
auto_play_next_track = false
shuffle = true
volume = 0.5

[ui]
include_tags = false
show_playlist = false
header_text = "hello"

[ui.color_scheme]
title_color = "yellow"
playlist_background = "#1d1d1d"

[controls]
seek_step_percent = 10.0
volume_step = 2

[[library.tracks]]
url = "/music/one.mp3"
title = "One"
tags = ["house", "deep"]

[[library.tracks]]
url = "/music/two.mp3"
title = "Two"

[log]
level = "debug"
"##,
    )
    .unwrap();

    let _g1 = EnvGuard::set("TAGDECK_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("TAGDECK__PLAYBACK__VOLUME");

    let s = Settings::load().unwrap();
    assert!(!s.playback.sort_tracks);
    assert!(!s.playback.auto_play_next_track);
    assert!(s.playback.shuffle);
    assert_eq!(s.playback.volume, 0.5);
    assert!(!s.ui.include_tags);
    assert!(s.ui.include_search);
    assert!(!s.ui.show_playlist);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(s.ui.color_scheme.get("playlist_background").map(String::as_str), Some("#1d1d1d"));
    assert_eq!(s.controls.seek_step_percent, 10.0);
    assert_eq!(s.controls.volume_step, 2);
    assert_eq!(s.library.tracks.len(), 2);
    assert_eq!(s.library.tracks[0].tags, vec!["house".to_string(), "deep".to_string()]);
    assert!(s.library.tracks[1].tags.is_empty());
    assert_eq!(s.log.level, "debug");
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
volume = 0.5
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("TAGDECK_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("TAGDECK__PLAYBACK__VOLUME", "0.25");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.volume, 0.25);
}

#[test]
fn validate_rejects_out_of_range_values() {
    let mut s = Settings::default();
    s.playback.volume = 1.5;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.controls.volume_step = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.controls.seek_step_percent = 0.0;
    assert!(s.validate().is_err());
}

#[test]
fn track_setting_converts_into_track() {
    let setting = TrackSetting {
        url: "/a.mp3".into(),
        title: "A".into(),
        tags: vec!["house".into(), "house".into()],
    };
    let track: crate::library::Track = setting.into();
    assert_eq!(track.tags, vec!["house".to_string()]);
}
