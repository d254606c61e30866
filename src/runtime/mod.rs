use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::{Controller, Options};
use crate::audio::RodioBackend;
use crate::mpris::ControlCmd;
use crate::ui::Theme;

mod event_loop;
mod logging;
mod mpris_sync;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, problem) = settings::load_settings();
    logging::init(&settings.log);
    if let Some(problem) = problem {
        warn!("{problem}");
    }

    let tracks = startup::initial_tracks(&settings);
    let backend = RodioBackend::open_default()?;
    let mut controller = Controller::new(backend, tracks, Options::from(&settings.playback));
    let theme = Theme::from_scheme(&settings.ui.color_scheme);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);
    mpris_sync::update_mpris(&mpris, &controller);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::new();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &theme,
        &mut controller,
        &mpris,
        &control_rx,
        &mut state,
    );

    controller.shutdown();
    info!("shutting down");

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}
