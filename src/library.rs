//! Track catalog: the ordered list of playable tracks.
//!
//! Tracks come from the configured track list, an optional directory scan
//! and files the user loads at runtime (prepended with the `local` tag).

mod catalog;
mod local;
mod model;
mod scan;

pub use catalog::Catalog;
pub use local::{LOCAL_TAG, local_track};
pub use model::Track;
pub use scan::scan;

#[cfg(test)]
mod tests;
