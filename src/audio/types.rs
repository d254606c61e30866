//! Small types shared by the audio backends and the playback controller.

use std::sync::mpsc::Sender;

/// Notifications a resource emits on its own schedule.
///
/// Handlers for one resource see these in emission order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResourceEvent {
    /// Enough of the track is decoded to know its duration and start output.
    DataReady,
    /// Playback position moved.
    TimeUpdate,
    /// More of the track has been buffered.
    Progress,
    /// The output volume changed, either through us or an external control.
    VolumeChange(f32),
    /// Playback reached the end of the track.
    Ended,
    /// Output stalled until more data arrives.
    Waiting,
}

pub type EventSender = Sender<ResourceEvent>;

/// How much media data a resource holds, mirroring the HTML media ready states.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

/// A buffered span of the track, in seconds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, secs: f64) -> bool {
        secs >= self.start && secs <= self.end
    }
}

/// Where a seek should land.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SeekTarget {
    /// Slider position, 0–100.
    Percent(f64),
    /// Absolute position in seconds.
    Seconds(f64),
}

impl SeekTarget {
    /// Resolve to whole seconds within `[0, duration]`.
    ///
    /// With an unknown duration (0) percentages resolve to 0 and absolute
    /// targets are only clamped at 0.
    pub fn resolve(self, duration: f64) -> f64 {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        match self {
            SeekTarget::Percent(p) => (p.clamp(0.0, 100.0) * duration / 100.0).round(),
            SeekTarget::Seconds(s) => {
                let s = s.max(0.0);
                if duration > 0.0 { s.min(duration) } else { s }
            }
        }
    }
}
