use std::sync::mpsc::{self, Receiver};

use tracing::debug;

use super::backend::{Backend, Resource};
use super::types::ResourceEvent;

/// The live binding between one catalog entry and its audio resource.
///
/// Dropping a session detaches the listener, stops output and releases the
/// resource. Events still queued for it are discarded with the receiver, so
/// nothing from a superseded track can reach the controller.
pub struct Session<R: Resource> {
    index: usize,
    resource: R,
    events: Receiver<ResourceEvent>,
}

impl<R: Resource> Session<R> {
    /// Load `url` through `backend` and subscribe to its events.
    pub fn open<B>(backend: &mut B, index: usize, url: &str) -> Self
    where
        B: Backend<Resource = R>,
    {
        let mut resource = backend.load(url);
        let (tx, rx) = mpsc::channel();
        resource.subscribe(tx);
        debug!(index, url, "session opened");

        Self {
            index,
            resource,
            events: rx,
        }
    }

    /// Catalog index this session plays.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut R {
        &mut self.resource
    }

    /// Take the next queued event, if any.
    pub fn next_event(&mut self) -> Option<ResourceEvent> {
        self.events.try_recv().ok()
    }

    /// Give the resource a chance to emit events.
    pub fn poll(&mut self) {
        self.resource.poll();
    }
}

impl<R: Resource> Drop for Session<R> {
    fn drop(&mut self) {
        self.resource.unsubscribe();
        self.resource.pause();
        self.resource.release();
        debug!(index = self.index, "session torn down");
    }
}
