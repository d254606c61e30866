use tracing::info;

use crate::config;
use crate::library::{Track, scan};

/// Configured tracks first, then whatever `library.scan_dir` holds.
pub fn initial_tracks(settings: &config::Settings) -> Vec<Track> {
    let library = &settings.library;
    let mut tracks: Vec<Track> = library.tracks.iter().cloned().map(Track::from).collect();
    let configured = tracks.len();

    if let Some(dir) = &library.scan_dir {
        tracks.extend(scan(dir, library));
        info!(dir = %dir.display(), found = tracks.len() - configured, "scanned library");
    }

    info!(configured, total = tracks.len(), "catalog ready");
    tracks
}
