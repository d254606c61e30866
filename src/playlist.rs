//! Filter/search engine: derives the playable order from the catalog.
//!
//! The playlist is a pure function of the catalog, the selected tags, the
//! search query and the sort flag. Shuffle is layered on top as a random
//! permutation of that derived sequence.

mod filter;
mod order;

pub use filter::{Filter, Query};
pub use order::Playlist;

use crate::library::Catalog;

/// Catalog indices that pass the tag filter and contain the query, in
/// catalog order or sorted by lowercase title when `sort` is set.
pub fn derive(catalog: &Catalog, filter: &Filter, query: &Query, sort: bool) -> Vec<usize> {
    let mut indices: Vec<usize> = catalog
        .tracks()
        .iter()
        .enumerate()
        .filter(|(_, track)| filter.matches(track) && query.matches(&track.title))
        .map(|(i, _)| i)
        .collect();

    if sort {
        let tracks = catalog.tracks();
        // Stable: equal titles keep catalog order.
        indices.sort_by_cached_key(|&i| tracks[i].title.to_lowercase());
    }

    indices
}
