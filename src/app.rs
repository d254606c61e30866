//! Application module: the playback controller and the state it exposes.
//!
//! `Controller` owns the catalog, the filter and search inputs, the derived
//! playlist and the single live audio session. `PlaybackState` is the record
//! the UI renders; `view` turns both into rows, chips and time strings.

mod controller;
mod state;
mod view;

pub use controller::{Controller, Options};
pub use state::{PlaybackState, PlaybackStatus, format_time};
pub use view::{InputMode, PlaylistRow, TagChip, ViewState};
