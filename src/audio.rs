//! Audio resource layer.
//!
//! A [`Backend`] acquires one [`Resource`] per track. The resource reports
//! what happens to it (data ready, time progress, buffering, volume changes,
//! end of track, waiting for data) as [`ResourceEvent`]s over a channel; a
//! [`Session`] owns the resource together with the receiving end and tears
//! both down when dropped.

mod backend;
mod output;
mod session;
mod types;

pub use backend::{Backend, Resource};
pub use output::{RodioBackend, RodioResource};
pub use session::Session;
pub use types::{EventSender, ReadyState, ResourceEvent, SeekTarget, TimeRange};

#[cfg(test)]
pub mod testing;
