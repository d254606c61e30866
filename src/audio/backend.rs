use super::types::{EventSender, ReadyState, TimeRange};

/// Source of audio resources.
pub trait Backend {
    type Resource: Resource;

    /// Acquire a resource for `url` and start loading it.
    ///
    /// Acquisition never fails outright: a location that cannot be opened
    /// yields a resource that stays stalled with a zero duration.
    fn load(&mut self, url: &str) -> Self::Resource;
}

/// Control surface of one loaded track.
pub trait Resource {
    fn play(&mut self);
    fn pause(&mut self);
    fn set_current_time(&mut self, secs: f64);
    fn set_volume(&mut self, volume: f32);

    fn current_time(&self) -> f64;
    /// Track length in seconds, 0 until known.
    fn duration(&self) -> f64;
    fn volume(&self) -> f32;
    fn buffered(&self) -> Vec<TimeRange>;
    fn ready_state(&self) -> ReadyState;

    /// Route this resource's events to `listener`, replacing any previous one.
    fn subscribe(&mut self, listener: EventSender);
    /// Stop emitting events.
    fn unsubscribe(&mut self);
    /// Stop output and drop the underlying media.
    fn release(&mut self);

    /// Let the resource inspect its output and emit pending events. Called
    /// once per event-loop tick; push-based backends can ignore it.
    fn poll(&mut self) {}

    /// Whether `secs` falls inside an already-buffered range.
    fn is_buffered(&self, secs: f64) -> bool {
        self.buffered().iter().any(|r| r.contains(secs))
    }
}
