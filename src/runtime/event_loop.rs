use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::{Controller, InputMode, ViewState};
use crate::audio::{Backend, SeekTarget};
use crate::config;
use crate::mpris::{self, ControlCmd, MprisHandle, PlayerStatus};
use crate::runtime::mpris_sync::{player_status, update_mpris};
use crate::ui::{self, Theme};

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    pub view: ViewState,
    /// Last-known playing index as emitted to MPRIS.
    last_mpris_index: Option<usize>,
    /// Last-known transport state as emitted to MPRIS.
    last_mpris_status: Option<PlayerStatus>,
    last_mpris_duration: f64,
    was_playing: bool,
}

impl EventLoopState {
    pub fn new() -> Self {
        Self {
            view: ViewState::default(),
            last_mpris_index: None,
            last_mpris_status: None,
            last_mpris_duration: 0.0,
            was_playing: false,
        }
    }
}

/// Main terminal event loop: drains resource events, draws, and handles
/// MPRIS commands and key presses. Returns `Ok(())` when shutdown is
/// requested.
pub fn run<B: Backend>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    theme: &Theme,
    controller: &mut Controller<B>,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        controller.tick();

        // Silence other players whenever we start sounding.
        let playing = controller.state().playing;
        if playing && !state.was_playing && settings.playback.pause_other_players {
            mpris::pause_other_players();
        }
        state.was_playing = playing;

        sync_mpris(mpris, controller, state);

        state.view.clamp(controller.rows().len());
        terminal.draw(|f| {
            ui::draw(
                f,
                controller,
                &state.view,
                &settings.ui,
                &settings.controls,
                theme,
            )
        })?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, controller) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, controller, &mut state.view) {
                    return Ok(());
                }
            }
        }
    }
}

fn sync_mpris<B: Backend>(mpris: &MprisHandle, controller: &Controller<B>, state: &mut EventLoopState) {
    let index = controller.has_session().then(|| controller.current());
    let status = player_status(controller);
    let duration = controller.state().duration;

    if index != state.last_mpris_index
        || Some(status) != state.last_mpris_status
        || duration != state.last_mpris_duration
    {
        update_mpris(mpris, controller);
        state.last_mpris_index = index;
        state.last_mpris_status = Some(status);
        state.last_mpris_duration = duration;
    }
}

/// Apply one MPRIS command. Returns `true` when the app should quit.
fn handle_control_cmd<B: Backend>(cmd: ControlCmd, controller: &mut Controller<B>) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => controller.play(),
        ControlCmd::Pause => controller.pause(),
        ControlCmd::PlayPause => controller.toggle_play(),
        ControlCmd::Stop => {
            controller.pause();
            controller.seek(SeekTarget::Seconds(0.0));
        }
        ControlCmd::Next => controller.next(),
        ControlCmd::Prev => controller.previous(),
        ControlCmd::SeekBy(secs) => {
            let target = controller.state().time + secs;
            controller.seek(SeekTarget::Seconds(target));
        }
        ControlCmd::SetVolume(v) => controller.set_volume(v as f32),
        ControlCmd::SetLoop(on) => {
            if controller.state().looped != on {
                controller.toggle_loop();
            }
        }
        ControlCmd::SetShuffle(on) => {
            if controller.state().shuffled != on {
                controller.toggle_shuffle();
            }
        }
    }
    false
}

/// Expand a leading `~/` to `$HOME`.
fn expand_path(input: &str) -> PathBuf {
    let input = input.trim();
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(input)
}

/// Handle one key press. Returns `true` when the app should quit.
fn handle_key_event<B: Backend>(
    key: KeyEvent,
    settings: &config::Settings,
    controller: &mut Controller<B>,
    view: &mut ViewState,
) -> bool {
    match &mut view.mode {
        InputMode::Search => {
            match key.code {
                KeyCode::Esc => {
                    controller.clear_query();
                    view.mode = InputMode::Normal;
                }
                KeyCode::Enter => view.mode = InputMode::Normal,
                KeyCode::Backspace => controller.pop_query_char(),
                KeyCode::Char(c) if !c.is_control() => controller.push_query_char(c),
                _ => {}
            }
            view.cursor = 0;
            return false;
        }
        InputMode::OpenPath(path) => {
            match key.code {
                KeyCode::Esc => view.mode = InputMode::Normal,
                KeyCode::Backspace => {
                    path.pop();
                }
                KeyCode::Char(c) if !c.is_control() => path.push(c),
                KeyCode::Enter => {
                    let input = std::mem::take(path);
                    view.mode = InputMode::Normal;
                    match controller.load_local(&expand_path(&input)) {
                        Ok(()) => {
                            view.cursor = 0;
                            view.message = Some(format!("Loaded {}", controller.state().title));
                        }
                        Err(e) => {
                            warn!(path = input.as_str(), error = %e, "could not load local file");
                            view.message = Some(format!("Could not open {input}: {e}"));
                        }
                    }
                }
                _ => {}
            }
            return false;
        }
        InputMode::Normal => {}
    }

    view.message = None;
    let controls = &settings.controls;

    match key.code {
        KeyCode::Char('q') => {
            info!("quit requested");
            return true;
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => controller.toggle_play(),
        KeyCode::Char('l') => {
            controller.next();
            view.follow(&controller.rows(), controller.current());
        }
        KeyCode::Char('h') => {
            controller.previous();
            view.follow(&controller.rows(), controller.current());
        }
        KeyCode::Char('L') => {
            let target = controller.state().slider + controls.seek_step_percent;
            controller.seek(SeekTarget::Percent(target));
        }
        KeyCode::Char('H') => {
            let target = controller.state().slider - controls.seek_step_percent;
            controller.seek(SeekTarget::Percent(target));
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let volume = controller.volume_percent() + i32::from(controls.volume_step);
            controller.set_volume_percent(volume);
        }
        KeyCode::Char('-') => {
            let volume = controller.volume_percent() - i32::from(controls.volume_step);
            controller.set_volume_percent(volume);
        }
        KeyCode::Char('r') => controller.toggle_loop(),
        KeyCode::Char('s') => controller.toggle_shuffle(),
        KeyCode::Char('/') => view.mode = InputMode::Search,
        KeyCode::Char('o') => view.mode = InputMode::OpenPath(String::new()),
        KeyCode::Char(c @ '1'..='9') => {
            let n = c as usize - '1' as usize;
            if let Some(chip) = controller.tag_chips().get(n) {
                let tag = chip.tag.clone();
                controller.toggle_tag(&tag);
                view.follow(&controller.rows(), controller.current());
            }
        }
        KeyCode::Char('j') | KeyCode::Down => view.cursor_down(controller.rows().len()),
        KeyCode::Char('k') | KeyCode::Up => view.cursor_up(),
        KeyCode::Enter => {
            if let Some(row) = controller.rows().get(view.cursor) {
                controller.select(row.index);
            }
        }
        _ => {}
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Options;
    use crate::audio::testing::{Probe, ScriptedBackend};
    use crate::library::Track;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup() -> (Controller<ScriptedBackend>, Probe, config::Settings, ViewState) {
        let tracks = vec![
            Track::new("a.mp3", "Alpha", ["house"]),
            Track::new("b.mp3", "Beta", ["dnb"]),
            Track::new("c.mp3", "Gamma", ["house"]),
        ];
        let backend = ScriptedBackend::default();
        let probe = backend.probe();
        let controller = Controller::new(backend, tracks, Options::default());
        (controller, probe, config::Settings::default(), ViewState::default())
    }

    fn keys<B: Backend>(
        codes: &[KeyCode],
        settings: &config::Settings,
        controller: &mut Controller<B>,
        view: &mut ViewState,
    ) {
        for &code in codes {
            handle_key_event(press(code), settings, controller, view);
        }
    }

    #[test]
    fn q_quits() {
        let (mut c, _p, s, mut v) = setup();
        assert!(handle_key_event(press(KeyCode::Char('q')), &s, &mut c, &mut v));
    }

    #[test]
    fn space_toggles_playback() {
        let (mut c, probe, s, mut v) = setup();
        keys(&[KeyCode::Char(' ')], &s, &mut c, &mut v);
        assert!(probe.last().borrow().playing);
        keys(&[KeyCode::Char('p')], &s, &mut c, &mut v);
        assert!(!probe.last().borrow().playing);
    }

    #[test]
    fn cursor_and_enter_select_a_row() {
        let (mut c, _p, s, mut v) = setup();
        keys(
            &[KeyCode::Char('j'), KeyCode::Char('j'), KeyCode::Enter],
            &s,
            &mut c,
            &mut v,
        );
        assert_eq!(c.current(), 2);
        assert!(c.state().playing);
    }

    #[test]
    fn search_mode_edits_query_and_esc_clears_it() {
        let (mut c, _p, s, mut v) = setup();
        keys(
            &[KeyCode::Char('/'), KeyCode::Char('G'), KeyCode::Char('a')],
            &s,
            &mut c,
            &mut v,
        );
        assert_eq!(c.query().as_str(), "ga");
        assert_eq!(c.rows().len(), 1);
        // Keys typed while searching never reach the transport.
        keys(&[KeyCode::Char('q')], &s, &mut c, &mut v);
        assert_eq!(v.mode, InputMode::Search);

        keys(&[KeyCode::Esc], &s, &mut c, &mut v);
        assert_eq!(v.mode, InputMode::Normal);
        assert!(c.query().is_empty());
    }

    #[test]
    fn number_keys_toggle_tags() {
        let (mut c, _p, s, mut v) = setup();
        keys(&[KeyCode::Char('2')], &s, &mut c, &mut v);
        assert!(c.filter().contains("dnb"));
        assert_eq!(c.rows().len(), 1);

        keys(&[KeyCode::Char('2'), KeyCode::Char('9')], &s, &mut c, &mut v);
        assert!(c.filter().is_empty());
    }

    #[test]
    fn volume_keys_step_and_clamp() {
        let (mut c, _p, s, mut v) = setup();
        keys(&[KeyCode::Char('+')], &s, &mut c, &mut v);
        assert_eq!(c.volume_percent(), 85);
        for _ in 0..10 {
            keys(&[KeyCode::Char('+')], &s, &mut c, &mut v);
        }
        assert_eq!(c.volume_percent(), 100);
    }

    #[test]
    fn seek_keys_move_by_configured_percent() {
        let (mut c, probe, s, mut v) = setup();
        probe.finish_loading(200.0);
        c.tick();

        keys(&[KeyCode::Char('L'), KeyCode::Char('L')], &s, &mut c, &mut v);
        assert_eq!(probe.last().borrow().seeks, vec![10.0, 20.0]);
        keys(&[KeyCode::Char('H')], &s, &mut c, &mut v);
        assert_eq!(c.state().time, 10.0);
    }

    #[test]
    fn open_prompt_reports_missing_file() {
        let (mut c, _p, s, mut v) = setup();
        keys(&[KeyCode::Char('o')], &s, &mut c, &mut v);
        for ch in "/no/such/file.mp3".chars() {
            keys(&[KeyCode::Char(ch)], &s, &mut c, &mut v);
        }
        keys(&[KeyCode::Enter], &s, &mut c, &mut v);

        assert_eq!(v.mode, InputMode::Normal);
        assert!(v.message.as_deref().unwrap().starts_with("Could not open"));
        assert_eq!(c.catalog().len(), 3);
    }

    #[test]
    fn open_prompt_loads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.flac");
        std::fs::write(&path, b"fLaC").unwrap();

        let (mut c, _p, s, mut v) = setup();
        v.mode = InputMode::OpenPath(path.display().to_string());
        keys(&[KeyCode::Enter], &s, &mut c, &mut v);

        assert_eq!(c.catalog().get(0).unwrap().title, "take.flac");
        assert_eq!(c.current(), 0);
        assert!(!c.state().playing);
        assert_eq!(v.message.as_deref(), Some("Loaded take.flac"));
    }

    #[test]
    fn control_commands_drive_controller() {
        let (mut c, _p, _s, _v) = setup();

        assert!(!handle_control_cmd(ControlCmd::Play, &mut c));
        assert!(c.state().playing);
        handle_control_cmd(ControlCmd::SetVolume(2.0), &mut c);
        assert_eq!(c.state().volume, 1.0);
        handle_control_cmd(ControlCmd::SetLoop(true), &mut c);
        handle_control_cmd(ControlCmd::SetLoop(true), &mut c);
        assert!(c.state().looped);
        handle_control_cmd(ControlCmd::SetShuffle(true), &mut c);
        assert!(c.state().shuffled);
        assert!(handle_control_cmd(ControlCmd::Quit, &mut c));
    }

    #[test]
    fn expand_path_trims_input() {
        assert_eq!(expand_path(" /tmp/a.mp3 "), PathBuf::from("/tmp/a.mp3"));
        assert_eq!(expand_path("rel/b.ogg"), PathBuf::from("rel/b.ogg"));
    }
}
