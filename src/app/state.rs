//! The playback state record and the numeric formatting rules applied to it.

use crate::audio::TimeRange;

/// Coarse transport status, as reported to MPRIS.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Everything the UI shows about the live session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub title: String,
    /// Elapsed seconds.
    pub time: f64,
    /// Track length in seconds, 0 until the resource knows it.
    pub duration: f64,
    /// Slider position, 0–100 with one decimal.
    pub slider: f64,
    /// Buffered share of the track, 0–100 with two decimals.
    pub buffered: f64,
    /// Output volume, 0.0–1.0.
    pub volume: f32,
    pub playing: bool,
    pub looped: bool,
    pub shuffled: bool,
    pub ended: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            title: String::new(),
            time: 0.0,
            duration: 0.0,
            slider: 1.0,
            buffered: 0.0,
            volume: 0.8,
            playing: false,
            looped: false,
            shuffled: false,
            ended: false,
        }
    }
}

impl PlaybackState {
    /// Nothing to play: clear everything derived from a session. Modes and
    /// volume are user choices and survive.
    pub fn reset_media(&mut self) {
        self.title.clear();
        self.time = 0.0;
        self.duration = 0.0;
        self.slider = 1.0;
        self.buffered = 0.0;
        self.playing = false;
        self.ended = false;
    }

    /// A new session was bound to `title`.
    pub fn begin_track(&mut self, title: &str) {
        self.title = title.to_string();
        self.time = 0.0;
        self.duration = 0.0;
        self.slider = 0.0;
        self.buffered = 0.0;
        self.ended = false;
    }

    pub fn status(&self, has_session: bool) -> PlaybackStatus {
        if !has_session {
            PlaybackStatus::Stopped
        } else if self.playing {
            PlaybackStatus::Playing
        } else if self.ended {
            PlaybackStatus::Stopped
        } else {
            PlaybackStatus::Paused
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Slider percentage for `time` into a track of `duration` seconds.
pub(crate) fn slider_percent(time: f64, duration: f64) -> f64 {
    if time == 0.0 || !time.is_finite() || !(duration > 0.0) || !duration.is_finite() {
        return 0.0;
    }
    round_to(time * 100.0 / duration, 1)
}

/// Buffered percentage from the contiguous span that begins with the first
/// buffered range. `None` when nothing is buffered yet.
pub(crate) fn buffered_percent(ranges: &[TimeRange], duration: f64) -> Option<f64> {
    let first = ranges.first()?;
    if !(duration > 0.0) || !duration.is_finite() {
        return None;
    }

    let mut end = first.end;
    for r in &ranges[1..] {
        if r.start <= end {
            end = end.max(r.end);
        } else {
            break;
        }
    }
    Some(round_to(end / duration * 100.0, 2))
}

/// Format seconds as `H:MM:SS`, or `M:SS` when under an hour.
///
/// Zero, negative and unknown (NaN) values render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
