use super::model::Track;

/// Ordered collection of tracks. Indices into it are what the playlist and
/// the playback controller refer to.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Insert `track` at index 0, shifting every existing entry by one.
    pub fn prepend(&mut self, track: Track) {
        self.tracks.insert(0, track);
    }

    /// Distinct tags across the catalog, in the order they are first seen.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for track in &self.tracks {
            for tag in &track.tags {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        tags
    }
}
