//! TUI effects boundary: event loop, terminal lifecycle, key mapping.
//!
//! This is the only TUI module with side effects. It wires the pure layers
//! (state, update, view) to the real terminal via crossterm and ratatui,
//! and owns every thread:
//! - A key reader thread forwards crossterm key events
//! - A generation worker runs each captured request on the shared model
//! - Timer threads drive the intro, the farewell, and the generation
//!   watchdog
//!
//! All producers feed one mpsc channel; the event loop consumes it and
//! dispatches into the pure handlers. Kept minimal: all intelligence lives
//! in the pure layers.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use humansize::{BINARY, format_size};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::artifact;
use crate::assets::AssetSet;
use crate::model::story_model;
use crate::types::{GenParams, GenRequest, StoryBatch};

use super::state::{
    Action, AppEvent, Effect, Screen, Session, SessionOptions, Status, Transition,
};
use super::update::{handle_app_event, update};
use super::view::render;

/// How long the welcome intro stays on screen.
pub const WELCOME_DELAY: Duration = Duration::from_secs(3);
/// How long the farewell screen stays before the process exits.
pub const FAREWELL_DELAY: Duration = Duration::from_secs(3);
/// Watchdog limit for a single generation request.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the effects boundary needs besides the session itself.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub session: SessionOptions,
    /// Assets directory. None uses the built-in banners without warnings.
    pub assets_dir: Option<PathBuf>,
    /// Where saved artifacts go.
    pub out_dir: PathBuf,
}

// ============================================================================
// KEY MAPPING
// ============================================================================

/// Map a crossterm key event to a semantic Action.
///
/// Context-free on purpose: the transition function decides what each
/// action means per screen, so `Char` stays a plain `Input`.
/// Returns None for keys that map to nothing.
pub fn map_key(key: KeyEvent) -> Option<Action> {
    // Ctrl-C always quits, Ctrl-S always means save.
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('s') => Some(Action::Save),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Enter => Some(Action::Confirm),
        KeyCode::Esc => Some(Action::Exit),
        KeyCode::Tab => Some(Action::FocusNext),
        KeyCode::BackTab => Some(Action::FocusPrev),
        KeyCode::Up => Some(Action::MoveUp),
        KeyCode::Down => Some(Action::MoveDown),
        KeyCode::Left => Some(Action::ValuePrev),
        KeyCode::Right => Some(Action::ValueNext),
        KeyCode::Backspace => Some(Action::DeleteBack),
        KeyCode::Char(c) => Some(Action::Input(c)),
        _ => None,
    }
}

// ============================================================================
// TERMINAL LIFECYCLE
// ============================================================================

/// Set up the terminal for TUI mode.
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Install a panic hook that restores the terminal before printing.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

// ============================================================================
// BACKGROUND THREADS
// ============================================================================

/// Spawn a thread that reads crossterm events and forwards key events.
fn spawn_key_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        loop {
            match event::read() {
                Ok(Event::Key(key)) => {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break; // receiver dropped, TUI is shutting down
                    }
                }
                Ok(_) => {} // ignore mouse, resize, etc.
                Err(_) => break,
            }
        }
    });
}

/// Spawn a thread that posts one event after a delay.
fn spawn_timer(
    tx: mpsc::Sender<AppEvent>,
    delay: Duration,
    make: impl FnOnce() -> AppEvent + Send + 'static,
) {
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = tx.send(make());
    });
}

/// Spawn the generation worker for one captured request.
///
/// The worker never touches the session: it reports through the channel,
/// and the pure handler decides whether the answer is still wanted.
fn spawn_generation(request: GenRequest, request_id: u64, tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let result = story_model().generate(
            &request.prompt,
            request.genre,
            request.version_count,
            &GenParams::default(),
        );
        let event = match result {
            Ok(stories) => AppEvent::GenerationDone { request_id, stories },
            Err(e) => AppEvent::GenerationFailed {
                request_id,
                error: e.to_string(),
            },
        };
        let _ = tx.send(event);
    });
}

// ============================================================================
// EVENT LOOP
// ============================================================================

/// Run the interactive session until the user leaves.
///
/// Main entry point for the TUI. Asset warnings go to stderr before the
/// alternate screen opens, so they stay visible after exit too.
pub fn run(opts: RunOptions) -> io::Result<()> {
    let assets = match &opts.assets_dir {
        Some(dir) => AssetSet::load(dir),
        None => AssetSet::fallback(),
    };
    for warning in &assets.warnings {
        eprintln!("Warning: {warning}");
    }

    install_panic_hook();
    let mut terminal = setup_terminal()?;

    let mut session = Session::with_options(opts.session.clone());
    let (tx, rx) = mpsc::channel::<AppEvent>();
    spawn_key_reader(tx.clone());
    if !session.welcome_played {
        spawn_timer(tx.clone(), WELCOME_DELAY, || AppEvent::IntroElapsed);
    }

    let mut farewell_armed = false;
    loop {
        terminal.draw(|frame| render(&session, &assets, frame))?;

        if session.should_quit {
            break;
        }

        let Ok(event) = rx.recv() else {
            break; // all senders dropped
        };

        let transition = match event {
            AppEvent::Key(key) => match map_key(key) {
                Some(action) => update(&mut session, &action),
                None => Transition::Stay,
            },
            background => handle_app_event(&mut session, background),
        };

        match transition {
            Transition::Stay => {}
            Transition::Quit => session.should_quit = true,
            Transition::Effect(effect) => {
                handle_effect(effect, &mut session, &tx, &opts.out_dir);
            }
        }

        // First arrival on the farewell screen arms its exit timer.
        if session.screen == Screen::Exiting && !farewell_armed {
            farewell_armed = true;
            spawn_timer(tx.clone(), FAREWELL_DELAY, || AppEvent::FarewellElapsed);
        }
    }

    restore_terminal()?;
    Ok(())
}

// ============================================================================
// EFFECT HANDLING
// ============================================================================

/// Execute a side effect requested by a pure transition.
fn handle_effect(
    effect: Effect,
    session: &mut Session,
    tx: &mpsc::Sender<AppEvent>,
    out_dir: &Path,
) {
    match effect {
        Effect::StartGeneration { request, request_id } => {
            spawn_generation(request, request_id, tx.clone());
            spawn_timer(tx.clone(), GENERATION_TIMEOUT, move || {
                AppEvent::GenerationTimeout { request_id }
            });
        }
        Effect::SaveBatch => save_last_batch(session, out_dir),
    }
}

/// Write the last generation to disk and report through the status line.
/// Failure leaves the results and the screen untouched.
fn save_last_batch(session: &mut Session, out_dir: &Path) {
    let Some(request) = session.last_request.clone() else {
        session.status = Some(Status::warn("Nothing to save yet."));
        return;
    };
    let batch = StoryBatch {
        prompt: request.prompt,
        genre: request.genre,
        stories: session.last_results.clone(),
    };
    match artifact::save_batch(&batch, out_dir) {
        Ok(saved) => {
            let name = saved
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| saved.path.display().to_string());
            session.status = Some(Status::info(format!(
                "Saved {} ({})",
                name,
                format_size(saved.bytes, BINARY)
            )));
        }
        Err(e) => {
            session.status = Some(Status::error(format!("Save failed: {e}")));
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
