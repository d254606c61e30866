//! Playback controller: binds exactly one audio resource to the current
//! track and keeps [`PlaybackState`] consistent with what it reports.

use std::path::Path;

use tracing::{debug, info};

use crate::audio::{Backend, ReadyState, Resource, ResourceEvent, SeekTarget, Session};
use crate::config::PlaybackSettings;
use crate::error::Result;
use crate::library::{Catalog, Track, local_track};
use crate::playlist::{self, Filter, Playlist, Query};

use super::state::{PlaybackState, PlaybackStatus, buffered_percent, slider_percent};

/// Behaviour switches fixed at startup.
#[derive(Debug, Copy, Clone)]
pub struct Options {
    pub sort_tracks: bool,
    pub auto_play_next_track: bool,
    pub shuffle: bool,
    pub looped: bool,
    pub volume: f32,
}

impl Default for Options {
    fn default() -> Self {
        Self::from(&PlaybackSettings::default())
    }
}

impl From<&PlaybackSettings> for Options {
    fn from(s: &PlaybackSettings) -> Self {
        Self {
            sort_tracks: s.sort_tracks,
            auto_play_next_track: s.auto_play_next_track,
            shuffle: s.shuffle,
            looped: s.looped,
            volume: s.volume,
        }
    }
}

/// A seek waiting for the resource to buffer its target.
#[derive(Debug, Copy, Clone)]
struct PendingSeek {
    target: SeekTarget,
    resume: bool,
}

pub struct Controller<B: Backend> {
    backend: B,
    catalog: Catalog,
    filter: Filter,
    query: Query,
    playlist: Playlist,
    current: usize,
    session: Option<Session<B::Resource>>,
    state: PlaybackState,
    pending_seek: Option<PendingSeek>,
    options: Options,
}

impl<B: Backend> Controller<B> {
    /// Build the catalog and playlist and bind the first playlist entry
    /// without starting playback.
    pub fn new(backend: B, tracks: Vec<Track>, options: Options) -> Self {
        let mut controller = Self {
            backend,
            catalog: Catalog::new(tracks),
            filter: Filter::default(),
            query: Query::default(),
            playlist: Playlist::default(),
            current: 0,
            session: None,
            state: PlaybackState {
                volume: options.volume.clamp(0.0, 1.0),
                looped: options.looped,
                shuffled: options.shuffle,
                ..PlaybackState::default()
            },
            pending_seek: None,
            options,
        };

        controller.playlist = Playlist::new(controller.derive());
        if options.shuffle {
            controller.playlist.shuffle();
        }
        controller.current = controller.playlist.first().unwrap_or(0);
        controller.rebind(false);
        controller
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Catalog index of the current track.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.session.as_ref().and_then(|_| self.catalog.get(self.current))
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status(self.session.is_some())
    }

    // Transport

    pub fn play(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.resource_mut().play();
        self.state.playing = true;
        self.state.ended = false;
    }

    pub fn pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.resource_mut().pause();
        self.state.playing = false;
    }

    pub fn toggle_play(&mut self) {
        if self.state.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Move to the next playlist entry, wrapping to the first.
    pub fn next(&mut self) {
        if let Some(index) = self.playlist.next_after(self.current) {
            self.go_to(index, true);
        }
    }

    /// Move to the previous playlist entry, wrapping to the last.
    pub fn previous(&mut self) {
        if let Some(index) = self.playlist.prev_before(self.current) {
            self.go_to(index, true);
        }
    }

    /// Play the catalog entry at `index`. Entries outside the playlist are
    /// ignored.
    pub fn select(&mut self, index: usize) {
        if !self.playlist.contains(index) {
            return;
        }
        if index == self.current && self.session.is_some() {
            self.play();
        } else {
            self.go_to(index, true);
        }
    }

    // Seeking

    /// Seek, keeping the current play/pause state.
    pub fn seek(&mut self, target: SeekTarget) {
        let resume = self.state.playing;
        self.seek_then(target, resume);
    }

    /// Move the slider while it is being dragged; nothing is sent to the
    /// resource until [`Controller::release_slider`].
    pub fn drag_slider(&mut self, percent: f64) {
        if self.session.is_some() && percent.is_finite() {
            self.state.slider = percent.clamp(0.0, 100.0);
        }
    }

    /// Seek to the dragged slider position and start playing.
    pub fn release_slider(&mut self) {
        let target = SeekTarget::Percent(self.state.slider);
        self.seek_then(target, true);
    }

    fn seek_then(&mut self, target: SeekTarget, resume: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let resource = session.resource_mut();
        let position = target.resolve(resource.duration());

        if resource.is_buffered(position) {
            resource.set_current_time(position);
            let duration = resource.duration();
            self.pending_seek = None;
            self.state.time = position;
            self.state.slider = slider_percent(position, duration);
            if resume {
                self.play();
            }
            return;
        }

        // Keep an earlier deferred seek's intent to resume.
        let resume = resume || self.pending_seek.is_some_and(|p| p.resume);
        self.pause();
        self.pending_seek = Some(PendingSeek { target, resume });
        debug!(position, "seek target not buffered, waiting for data");
    }

    /// Apply a deferred seek once its target is buffered, or, when
    /// `ready_is_enough`, once the resource reports enough data.
    fn try_apply_pending_seek(&mut self, ready_is_enough: bool) {
        let Some(pending) = self.pending_seek else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let resource = session.resource_mut();
        let duration = resource.duration();
        let position = pending.target.resolve(duration);

        let ready = ready_is_enough && resource.ready_state() == ReadyState::HaveEnoughData;
        if !resource.is_buffered(position) && !ready {
            return;
        }

        resource.set_current_time(position);
        self.pending_seek = None;
        self.state.time = position;
        self.state.slider = slider_percent(position, duration);
        debug!(position, "deferred seek applied");
        if pending.resume {
            self.play();
        }
    }

    pub fn has_pending_seek(&self) -> bool {
        self.pending_seek.is_some()
    }

    // Volume and modes

    /// Set the output volume, clamped to 0.0–1.0.
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.state.volume = volume;
        if let Some(session) = self.session.as_mut() {
            session.resource_mut().set_volume(volume);
        }
    }

    /// Set the volume on the 0–100 scale the UI shows.
    pub fn set_volume_percent(&mut self, percent: i32) {
        self.set_volume(percent as f32 / 100.0);
    }

    pub fn volume_percent(&self) -> i32 {
        (self.state.volume * 100.0).round() as i32
    }

    pub fn toggle_loop(&mut self) {
        self.state.looped = !self.state.looped;
    }

    pub fn toggle_shuffle(&mut self) {
        self.state.shuffled = !self.state.shuffled;
        if self.state.shuffled {
            self.playlist.shuffle();
        } else {
            self.playlist.unshuffle();
        }
    }

    // Filter and search

    /// Tags available for filtering, in first-seen catalog order.
    pub fn tags(&self) -> Vec<String> {
        self.catalog.tags()
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        self.filter.toggle(tag);
        self.refresh_playlist();
    }

    pub fn set_query(&mut self, text: &str) {
        self.query = Query::new(text);
        self.refresh_playlist();
    }

    pub fn push_query_char(&mut self, c: char) {
        self.query.push(c);
        self.refresh_playlist();
    }

    pub fn pop_query_char(&mut self) {
        self.query.pop();
        self.refresh_playlist();
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.refresh_playlist();
    }

    fn derive(&self) -> Vec<usize> {
        playlist::derive(
            &self.catalog,
            &self.filter,
            &self.query,
            self.options.sort_tracks,
        )
    }

    /// Recompute the playlist and move the current index back inside it.
    fn refresh_playlist(&mut self) {
        let base = self.derive();
        self.playlist.refresh(base);

        if self.playlist.contains(self.current) {
            return;
        }
        if let Some(first) = self.playlist.first() {
            let autoplay = self.state.playing;
            self.go_to(first, autoplay);
        }
    }

    // Catalog

    /// Load a file from disk and make it the current, paused track.
    pub fn load_local(&mut self, path: &Path) -> Result<()> {
        let track = local_track(path)?;
        self.add_local_track(track);
        Ok(())
    }

    /// Prepend `track` and bind it without starting playback.
    ///
    /// Tag filter and query are cleared when they would hide the new track.
    pub fn add_local_track(&mut self, track: Track) {
        let hidden = !self.filter.matches(&track) || !self.query.matches(&track.title);
        info!(title = %track.title, "local track loaded");
        self.catalog.prepend(track);
        if hidden {
            self.filter = Filter::default();
            self.query.clear();
        }

        // Every catalog index shifted by one, so the old permutation is void.
        self.playlist = Playlist::new(self.derive());
        if self.state.shuffled {
            self.playlist.shuffle();
        }

        self.current = 0;
        self.rebind(false);
    }

    // Session lifecycle

    fn go_to(&mut self, index: usize, autoplay: bool) {
        if index == self.current && self.session.is_some() {
            if autoplay {
                self.restart();
            }
            return;
        }
        self.current = index;
        self.rebind(autoplay);
        if let Some(track) = self.catalog.get(index) {
            info!(index, title = %track.title, "track changed");
        }
    }

    /// Rewind the current track and play it.
    fn restart(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.resource_mut().set_current_time(0.0);
        }
        self.pending_seek = None;
        self.state.time = 0.0;
        self.state.slider = 0.0;
        self.play();
    }

    /// Replace the live session with one for the current index.
    fn rebind(&mut self, autoplay: bool) {
        self.pending_seek = None;
        // The previous resource is fully torn down before the next one exists.
        self.session = None;

        let Some(track) = self.catalog.get(self.current) else {
            self.state.reset_media();
            return;
        };
        let title = track.title.clone();

        let mut session = Session::open(&mut self.backend, self.current, &track.url);
        session.resource_mut().set_volume(self.state.volume);
        self.session = Some(session);
        self.state.begin_track(&title);
        self.state.playing = false;

        if autoplay {
            self.play();
        }
    }

    /// Drop the live session, e.g. on shutdown.
    pub fn shutdown(&mut self) {
        self.pending_seek = None;
        self.session = None;
        self.state.playing = false;
    }

    // Resource events

    /// Poll the live resource and apply every event it has queued.
    pub fn tick(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.poll();
        }

        // A handler may replace the session; the old receiver is dropped
        // with it, so the loop only ever drains the live one.
        while let Some(event) = self.session.as_mut().and_then(|s| s.next_event()) {
            self.handle(event);
        }
    }

    fn handle(&mut self, event: ResourceEvent) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let resource = session.resource();

        match event {
            ResourceEvent::DataReady => {
                self.state.duration = resource.duration();
                self.state.time = resource.current_time();
                self.try_apply_pending_seek(false);
            }
            ResourceEvent::TimeUpdate => {
                let time = resource.current_time();
                self.state.time = time;
                self.state.slider = slider_percent(time, resource.duration());
            }
            ResourceEvent::Progress => {
                if let Some(buffered) = buffered_percent(&resource.buffered(), resource.duration())
                {
                    self.state.buffered = buffered;
                }
                self.try_apply_pending_seek(false);
            }
            ResourceEvent::VolumeChange(volume) => {
                self.state.volume = volume.clamp(0.0, 1.0);
            }
            ResourceEvent::Waiting => {
                self.try_apply_pending_seek(true);
            }
            ResourceEvent::Ended => self.on_ended(),
        }
    }

    fn on_ended(&mut self) {
        self.state.ended = true;

        if self.state.looped {
            self.restart();
            return;
        }

        if self.state.shuffled {
            self.playlist.shuffle();
            match self.playlist.next_after(self.current) {
                Some(index) => self.go_to(index, true),
                None => self.stop_at_end(),
            }
            return;
        }

        if self.options.auto_play_next_track && !self.playlist.is_empty() {
            self.next();
        } else {
            self.stop_at_end();
        }
    }

    fn stop_at_end(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.resource_mut().pause();
        }
        self.state.playing = false;
    }
}
