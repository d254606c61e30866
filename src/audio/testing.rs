//! In-memory backend for driving the controller from tests.
//!
//! Every resource the backend hands out shares its state with a [`Probe`],
//! so a test can inspect calls and emit events after the controller has
//! taken ownership of the backend.

use std::cell::RefCell;
use std::rc::Rc;

use super::backend::{Backend, Resource};
use super::types::{EventSender, ReadyState, ResourceEvent, TimeRange};

#[derive(Debug)]
pub struct ScriptState {
    pub url: String,
    pub playing: bool,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f32,
    pub buffered: Vec<TimeRange>,
    pub ready_state: ReadyState,
    pub listener: Option<EventSender>,
    pub released: bool,
    pub seeks: Vec<f64>,
}

impl ScriptState {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            buffered: Vec::new(),
            ready_state: ReadyState::HaveNothing,
            listener: None,
            released: false,
            seeks: Vec::new(),
        }
    }

    fn emit(&self, event: ResourceEvent) -> bool {
        self.listener
            .as_ref()
            .map(|tx| tx.send(event).is_ok())
            .unwrap_or(false)
    }
}

type Shared = Rc<RefCell<Vec<Rc<RefCell<ScriptState>>>>>;

#[derive(Default)]
pub struct ScriptedBackend {
    resources: Shared,
}

impl ScriptedBackend {
    pub fn probe(&self) -> Probe {
        Probe {
            resources: self.resources.clone(),
        }
    }
}

impl Backend for ScriptedBackend {
    type Resource = ScriptedResource;

    fn load(&mut self, url: &str) -> ScriptedResource {
        let state = Rc::new(RefCell::new(ScriptState::new(url)));
        self.resources.borrow_mut().push(state.clone());
        ScriptedResource { state }
    }
}

pub struct ScriptedResource {
    state: Rc<RefCell<ScriptState>>,
}

impl Resource for ScriptedResource {
    fn play(&mut self) {
        self.state.borrow_mut().playing = true;
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn set_current_time(&mut self, secs: f64) {
        let mut s = self.state.borrow_mut();
        s.current_time = secs;
        s.seeks.push(secs);
    }

    fn set_volume(&mut self, volume: f32) {
        let mut s = self.state.borrow_mut();
        s.volume = volume;
        s.emit(ResourceEvent::VolumeChange(volume));
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().current_time
    }

    fn duration(&self) -> f64 {
        self.state.borrow().duration
    }

    fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    fn buffered(&self) -> Vec<TimeRange> {
        self.state.borrow().buffered.clone()
    }

    fn ready_state(&self) -> ReadyState {
        self.state.borrow().ready_state
    }

    fn subscribe(&mut self, listener: EventSender) {
        self.state.borrow_mut().listener = Some(listener);
    }

    fn unsubscribe(&mut self) {
        self.state.borrow_mut().listener = None;
    }

    fn release(&mut self) {
        let mut s = self.state.borrow_mut();
        s.released = true;
        s.playing = false;
    }
}

/// Test-side view of every resource a [`ScriptedBackend`] created.
#[derive(Clone)]
pub struct Probe {
    resources: Shared,
}

impl Probe {
    pub fn count(&self) -> usize {
        self.resources.borrow().len()
    }

    pub fn nth(&self, n: usize) -> Rc<RefCell<ScriptState>> {
        self.resources.borrow()[n].clone()
    }

    pub fn last(&self) -> Rc<RefCell<ScriptState>> {
        let resources = self.resources.borrow();
        resources[resources.len() - 1].clone()
    }

    /// Emit `event` from the most recent resource. Returns whether a
    /// listener received it.
    pub fn emit(&self, event: ResourceEvent) -> bool {
        self.last().borrow().emit(event)
    }

    /// Emit `event` from the `n`-th resource ever created.
    pub fn emit_from(&self, n: usize, event: ResourceEvent) -> bool {
        self.nth(n).borrow().emit(event)
    }

    /// Make the most recent resource look loaded: known duration, fully
    /// buffered, enough data.
    pub fn finish_loading(&self, duration: f64) {
        {
            let last = self.last();
            let mut s = last.borrow_mut();
            s.duration = duration;
            s.buffered = vec![TimeRange::new(0.0, duration)];
            s.ready_state = ReadyState::HaveEnoughData;
        }
        self.emit(ResourceEvent::DataReady);
        self.emit(ResourceEvent::Progress);
    }

    pub fn with_last<T>(&self, f: impl FnOnce(&mut ScriptState) -> T) -> T {
        let last = self.last();
        let mut s = last.borrow_mut();
        f(&mut s)
    }
}
