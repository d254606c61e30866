use super::*;
use std::fs;
use tempfile::tempdir;

fn t(title: &str, tags: &[&str]) -> Track {
    Track::new(format!("https://example.test/{title}.mp3"), title, tags.iter().copied())
}

#[test]
fn track_new_drops_blank_and_duplicate_tags() {
    let track = Track::new("u", "T", ["house", " ", "house", "dnb"]);
    assert_eq!(track.tags, vec!["house".to_string(), "dnb".to_string()]);
    assert!(track.has_tag("dnb"));
    assert!(!track.has_tag("techno"));
}

#[test]
fn catalog_tags_keep_first_seen_order() {
    let catalog = Catalog::new(vec![
        t("A", &["house", "deep"]),
        t("B", &["dnb", "house"]),
        t("C", &["dubstep"]),
    ]);
    assert_eq!(catalog.tags(), vec!["house", "deep", "dnb", "dubstep"]);
}

#[test]
fn prepend_shifts_existing_tracks() {
    let mut catalog = Catalog::new(vec![t("A", &[]), t("B", &[])]);
    catalog.prepend(t("Local", &[LOCAL_TAG]));

    let titles: Vec<&str> = catalog.tracks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Local", "A", "B"]);
    assert_eq!(catalog.tags(), vec![LOCAL_TAG.to_string()]);
}

#[test]
fn local_track_uses_file_name_and_local_tag() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("My Song.flac");
    fs::write(&path, b"not real audio").unwrap();

    let track = local_track(&path).unwrap();
    assert_eq!(track.title, "My Song.flac");
    assert_eq!(track.tags, vec![LOCAL_TAG.to_string()]);
    assert!(track.url.ends_with("My Song.flac"));
}

#[test]
fn local_track_rejects_missing_and_directories() {
    let dir = tempdir().unwrap();
    assert!(local_track(&dir.path().join("missing.mp3")).is_err());
    assert!(local_track(dir.path()).is_err());
}
