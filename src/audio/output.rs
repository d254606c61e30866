//! rodio-backed resources for local files.
//!
//! rodio decodes from the local filesystem only, so plain paths and
//! `file://` URLs load; any other scheme yields a stalled resource. A local
//! file counts as fully buffered once its decoder is built.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::prelude::*;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::backend::{Backend, Resource};
use super::types::{EventSender, ReadyState, ResourceEvent, TimeRange};

/// Owns the output stream every resource's sink is mixed into.
pub struct RodioBackend {
    stream: OutputStream,
}

impl RodioBackend {
    pub fn open_default() -> Result<Self> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| Error::OutputDevice(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped, which garbles the TUI.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl Backend for RodioBackend {
    type Resource = RodioResource;

    fn load(&mut self, url: &str) -> RodioResource {
        match open_sink(&self.stream, url) {
            Ok((sink, path, duration)) => {
                debug!(url, duration, "decoder ready");
                RodioResource::loaded(sink, path, duration)
            }
            Err(e) => {
                warn!(url, error = %e, "track could not be loaded, session will stall");
                RodioResource::stalled()
            }
        }
    }
}

fn local_path(url: &str) -> Result<PathBuf> {
    if let Some(rest) = url.strip_prefix("file://") {
        return Ok(PathBuf::from(rest));
    }
    if url.contains("://") {
        return Err(Error::Unsupported(url.to_string()));
    }
    Ok(PathBuf::from(url))
}

fn decode(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path)?;
    Decoder::new(BufReader::new(file)).map_err(|e| Error::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Create a paused sink for `url`, returning it with the file path and the
/// duration in seconds (0 when neither the tags nor the decoder know it).
fn open_sink(stream: &OutputStream, url: &str) -> Result<(Sink, PathBuf, f64)> {
    let path = local_path(url)?;
    let source = decode(&path)?;

    let duration = lofty::read_from_path(&path)
        .map(|tagged| tagged.properties().duration())
        .ok()
        .filter(|d| !d.is_zero())
        .or_else(|| source.total_duration())
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, path, duration))
}

/// One track loaded into a rodio sink.
///
/// rodio has no callbacks, so events are derived in [`Resource::poll`] by
/// comparing the sink with what was last reported.
pub struct RodioResource {
    sink: Option<Sink>,
    path: Option<PathBuf>,
    duration: f64,
    volume: f32,
    listener: Option<EventSender>,
    announced: bool,
    playing: bool,
    ended: bool,
    last_pos: f64,
}

impl RodioResource {
    fn loaded(sink: Sink, path: PathBuf, duration: f64) -> Self {
        Self {
            volume: sink.volume(),
            sink: Some(sink),
            path: Some(path),
            duration,
            listener: None,
            announced: false,
            playing: false,
            ended: false,
            last_pos: 0.0,
        }
    }

    fn stalled() -> Self {
        Self {
            sink: None,
            path: None,
            duration: 0.0,
            volume: 1.0,
            listener: None,
            announced: false,
            playing: false,
            ended: false,
            last_pos: 0.0,
        }
    }

    fn emit(&self, event: ResourceEvent) {
        if let Some(tx) = &self.listener {
            let _ = tx.send(event);
        }
    }

    /// After the end of the track the sink has consumed its source; queue a
    /// fresh decoder so the track can be seeked or replayed.
    fn rearm(&mut self) {
        let (Some(sink), Some(path)) = (self.sink.as_ref(), self.path.as_ref()) else {
            return;
        };
        if !sink.empty() {
            return;
        }
        match decode(path) {
            Ok(source) => {
                sink.append(source);
                if !self.playing {
                    sink.pause();
                }
                self.ended = false;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "failed to reopen track"),
        }
    }
}

impl Resource for RodioResource {
    fn play(&mut self) {
        if self.ended {
            self.rearm();
        }
        if let Some(sink) = &self.sink {
            sink.play();
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        self.playing = false;
    }

    fn set_current_time(&mut self, secs: f64) {
        if !secs.is_finite() {
            return;
        }
        self.rearm();
        let Some(sink) = &self.sink else {
            return;
        };
        let target = Duration::from_secs_f64(secs.max(0.0));
        if let Err(e) = sink.try_seek(target) {
            warn!(secs, error = %e, "seek failed");
            return;
        }
        self.last_pos = secs;
        self.emit(ResourceEvent::TimeUpdate);
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
        self.emit(ResourceEvent::VolumeChange(volume));
    }

    fn current_time(&self) -> f64 {
        if self.ended {
            return self.duration;
        }
        self.sink
            .as_ref()
            .map(|s| s.get_pos().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn buffered(&self) -> Vec<TimeRange> {
        if self.sink.is_some() && self.duration > 0.0 {
            vec![TimeRange::new(0.0, self.duration)]
        } else {
            Vec::new()
        }
    }

    fn ready_state(&self) -> ReadyState {
        if self.sink.is_some() {
            ReadyState::HaveEnoughData
        } else {
            ReadyState::HaveNothing
        }
    }

    fn subscribe(&mut self, listener: EventSender) {
        self.listener = Some(listener);
    }

    fn unsubscribe(&mut self) {
        self.listener = None;
    }

    fn release(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.path = None;
        self.playing = false;
    }

    fn poll(&mut self) {
        if self.listener.is_none() {
            return;
        }
        let Some(sink) = &self.sink else {
            return;
        };

        if !self.announced {
            self.announced = true;
            self.emit(ResourceEvent::DataReady);
            self.emit(ResourceEvent::Progress);
        }

        let volume = sink.volume();
        if (volume - self.volume).abs() > f32::EPSILON {
            self.volume = volume;
            self.emit(ResourceEvent::VolumeChange(volume));
        }

        if !self.playing {
            return;
        }

        if sink.empty() {
            self.playing = false;
            self.ended = true;
            self.emit(ResourceEvent::TimeUpdate);
            self.emit(ResourceEvent::Ended);
            return;
        }

        let pos = sink.get_pos().as_secs_f64();
        if (pos - self.last_pos).abs() >= 0.25 {
            self.last_pos = pos;
            self.emit(ResourceEvent::TimeUpdate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_path_accepts_plain_and_file_urls() {
        assert_eq!(local_path("/music/a.mp3").unwrap(), PathBuf::from("/music/a.mp3"));
        assert_eq!(
            local_path("file:///music/a.mp3").unwrap(),
            PathBuf::from("/music/a.mp3")
        );
    }

    #[test]
    fn local_path_rejects_remote_schemes() {
        assert!(matches!(
            local_path("https://example.test/a.mp3"),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn stalled_resource_reports_nothing() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut r = RodioResource::stalled();
        r.subscribe(tx);
        r.play();
        r.poll();

        assert_eq!(r.duration(), 0.0);
        assert!(r.buffered().is_empty());
        assert_eq!(r.ready_state(), ReadyState::HaveNothing);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn decode_reports_missing_and_garbage_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(decode(&dir.path().join("missing.mp3")), Err(Error::Io(_))));

        let junk = dir.path().join("junk.mp3");
        std::fs::write(&junk, b"definitely not audio").unwrap();
        assert!(matches!(decode(&junk), Err(Error::Decode { .. })));
    }
}
