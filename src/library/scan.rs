use std::path::Path;

use lofty::prelude::*;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::Track;

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Split a genre tag like `"House; Deep House"` into lowercase tags.
fn genre_tags(genre: &str) -> Vec<String> {
    genre
        .split([';', ',', '/'])
        .map(|g| g.trim().to_lowercase())
        .filter(|g| !g.is_empty())
        .collect()
}

/// Walk `dir` and build a track for every audio file found.
///
/// The title comes from the file's title tag, falling back to the file stem.
/// Tags are the genre tag entries plus the name of the containing directory
/// (unless the file sits directly in `dir`). Results are sorted by lowercase
/// title.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let mut tracks: Vec<Track> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);
    if !settings.recursive {
        walker = walker.max_depth(1);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || !is_audio_file(path, settings) {
            continue;
        }

        let mut title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        let mut tags: Vec<String> = Vec::new();

        if let Ok(tagged) = lofty::read_from_path(path) {
            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = tag.title() {
                    if !v.trim().is_empty() {
                        title = v.trim().to_string();
                    }
                }
                if let Some(v) = tag.genre() {
                    tags.extend(genre_tags(&v));
                }
            }
        } else {
            debug!(path = %path.display(), "no readable tags, using file name");
        }

        if entry.depth() > 1 {
            if let Some(parent) = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|s| s.to_str())
            {
                tags.push(parent.to_lowercase());
            }
        }

        tracks.push(Track::new(path.display().to_string(), title, tags));
    }

    tracks.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn is_audio_file_matches_configured_extensions_case_insensitive() {
        let settings = LibrarySettings::default();
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.MP3"), &settings));
        assert!(is_audio_file(Path::new("/tmp/a.flac"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a.txt"), &settings));
        assert!(!is_audio_file(Path::new("/tmp/a"), &settings));
    }

    #[test]
    fn genre_tags_splits_and_lowercases() {
        assert_eq!(genre_tags("House; Deep House"), vec!["house", "deep house"]);
        assert_eq!(genre_tags("DnB/Jungle"), vec!["dnb", "jungle"]);
        assert!(genre_tags("  ").is_empty());
    }

    #[test]
    fn scan_uses_file_stem_and_parent_dir_tag() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("Techno");
        fs::create_dir_all(&sub).unwrap();

        fs::write(dir.path().join("b.MP3"), b"not a real mp3").unwrap();
        fs::write(sub.join("A.ogg"), b"not a real ogg").unwrap();
        fs::write(dir.path().join("c.txt"), b"ignore me").unwrap();

        let tracks = scan(dir.path(), &LibrarySettings::default());
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].title, "A");
        assert_eq!(tracks[0].tags, vec!["techno".to_string()]);
        assert_eq!(tracks[1].title, "b");
        assert!(tracks[1].tags.is_empty());
    }

    #[test]
    fn scan_respects_recursive_false_and_hidden() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
        fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("child.mp3"), b"not real").unwrap();

        let settings = LibrarySettings {
            recursive: false,
            include_hidden: false,
            ..LibrarySettings::default()
        };
        let tracks = scan(dir.path(), &settings);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "root");
    }
}
