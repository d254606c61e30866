use std::collections::HashMap;
use std::sync::{Arc, Mutex, mpsc::Sender};

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::{Connection, fdo::DBusProxy, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::app::PlaybackStatus;
use crate::library::Track;

const BUS_NAME: &str = "org.mpris.MediaPlayer2.tagdeck";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const PLAYER_IFACE: &str = "org.mpris.MediaPlayer2.Player";

/// Requests from the bus (or the terminal) for the event loop to act on.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in seconds.
    SeekBy(f64),
    /// 0.0–1.0; clamped by the controller.
    SetVolume(f64),
    SetLoop(bool),
    SetShuffle(bool),
}

/// Transport state mirrored onto the bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStatus {
    pub status: PlaybackStatus,
    pub volume: f64,
    pub looped: bool,
    pub shuffled: bool,
    /// Elapsed seconds.
    pub position: f64,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            volume: 1.0,
            looped: false,
            shuffled: false,
            position: 0.0,
        }
    }
}

#[derive(Debug, Default)]
struct SharedState {
    player: PlayerStatus,
    title: Option<String>,
    url: Option<String>,
    tags: Vec<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
}

fn to_micros(secs: f64) -> i64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1_000_000.0) as i64
    } else {
        0
    }
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
}

impl MprisHandle {
    pub fn set_status(&self, player: PlayerStatus) {
        if let Ok(mut s) = self.state.lock() {
            s.player = player;
        }
    }

    /// Publish the current track, or clear it with `None`.
    pub fn set_track_metadata(&self, index: Option<usize>, track: Option<&Track>, duration: f64) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };

        match (index, track) {
            (Some(i), Some(t)) => {
                s.title = Some(t.title.clone());
                s.url = Some(t.url.clone());
                s.tags = t.tags.clone();
                s.length_micros = (duration > 0.0).then(|| to_micros(duration));
                s.track_id = ObjectPath::try_from(format!("{OBJECT_PATH}/track/{i}"))
                    .ok()
                    .map(OwnedObjectPath::from);
            }
            _ => {
                s.title = None;
                s.url = None;
                s.tags.clear();
                s.length_micros = None;
                s.track_id = None;
            }
        }
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No window to raise.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "tagdeck"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        ["audio/mpeg", "audio/flac", "audio/ogg", "audio/wav"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn player(&self) -> PlayerStatus {
        self.state.lock().map(|s| s.player).unwrap_or_default()
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    /// `offset` is in microseconds.
    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::SeekBy(offset as f64 / 1_000_000.0));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        match self.player().status {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        if self.player().looped { "Track" } else { "None" }
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, value: String) {
        let _ = self.tx.send(ControlCmd::SetLoop(value == "Track"));
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.player().shuffled
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, value: bool) {
        let _ = self.tx.send(ControlCmd::SetShuffle(value));
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.player().volume
    }

    #[zbus(property)]
    fn set_volume(&mut self, value: f64) {
        let _ = self.tx.send(ControlCmd::SetVolume(value));
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        to_micros(self.player().position)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut put = |key: &str, value: Value<'_>| {
            if let Ok(v) = OwnedValue::try_from(value) {
                map.insert(key.to_string(), v);
            }
        };

        if let Some(id) = &s.track_id {
            put("mpris:trackid", Value::from(id.clone().into_inner()));
        }
        if let Some(title) = &s.title {
            put("xesam:title", Value::from(title.as_str()));
        }
        if let Some(url) = &s.url {
            put("xesam:url", Value::from(url.as_str()));
        }
        if !s.tags.is_empty() {
            put("xesam:genre", Value::from(s.tags.clone()));
        }
        if let Some(len) = s.length_micros {
            put("mpris:length", Value::from(len));
        }
        map
    }
}

pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            let connection = match Connection::session().await {
                Ok(c) => c,
                Err(e) => {
                    warn!("MPRIS: failed to connect to session bus: {e}");
                    return;
                }
            };

            if let Err(e) = connection.request_name(BUS_NAME).await {
                warn!("MPRIS: failed to acquire name: {e}");
                return;
            }

            let object_server = connection.object_server();

            if let Err(e) = object_server
                .at(OBJECT_PATH, RootIface { tx: tx.clone() })
                .await
            {
                warn!("MPRIS: failed to register root iface: {e}");
                return;
            }

            if let Err(e) = object_server
                .at(
                    OBJECT_PATH,
                    PlayerIface {
                        tx,
                        state: state_for_thread,
                    },
                )
                .await
            {
                warn!("MPRIS: failed to register player iface: {e}");
                return;
            }

            info!(name = BUS_NAME, "MPRIS service registered");

            loop {
                Timer::after(std::time::Duration::from_secs(3600)).await;
            }
        });
    });

    MprisHandle { state }
}

/// Whether `name` is another MPRIS player on the bus.
fn is_other_player(name: &str) -> bool {
    name.starts_with("org.mpris.MediaPlayer2.") && name != BUS_NAME
}

async fn pause_players(connection: &Connection) -> zbus::Result<usize> {
    let names = DBusProxy::new(connection).await?.list_names().await?;

    let mut paused = 0;
    for name in names.iter().filter(|n| is_other_player(n.as_str())) {
        match connection
            .call_method(Some(name.as_str()), OBJECT_PATH, Some(PLAYER_IFACE), "Pause", &())
            .await
        {
            Ok(_) => paused += 1,
            Err(e) => debug!(player = name.as_str(), "pause request failed: {e}"),
        }
    }
    Ok(paused)
}

/// Ask every other MPRIS player on the session bus to pause.
///
/// Runs on its own thread and never reports back; failures are only logged.
pub fn pause_other_players() {
    std::thread::spawn(|| {
        block_on(async {
            let result = match Connection::session().await {
                Ok(connection) => pause_players(&connection).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(n) => debug!(paused = n, "asked other players to pause"),
                Err(e) => warn!("could not pause other players: {e}"),
            }
        });
    });
}
