use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LogSettings;

/// `$XDG_STATE_HOME/tagdeck/tagdeck.log`, or `~/.local/state/tagdeck/tagdeck.log`.
pub fn default_log_path() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
    };

    state_home.map(|d| d.join("tagdeck").join("tagdeck.log"))
}

/// Install the global `tracing` subscriber, writing to the configured file.
///
/// The terminal is owned by the UI, so when no file can be opened logging
/// stays off. Runs before the terminal switches to raw mode. `RUST_LOG`
/// overrides `log.level`.
pub fn init(settings: &LogSettings) {
    let Some(path) = settings.file.clone().or_else(default_log_path) else {
        return;
    };
    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("tagdeck: logging disabled, cannot create {}: {e}", dir.display());
            return;
        }
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("tagdeck: logging disabled, cannot open {}: {e}", path.display());
            return;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    if let Err(e) = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_target(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init()
    {
        eprintln!("tagdeck: logging disabled: {e}");
    }
}
