//! Session state algebra: pure types, zero effects.
//!
//! These types define the whole session state space. The transition
//! functions and the rendering layer both program against them.
//!
//! Design principle: Screen variants carry only per-screen transient state
//! (focus, scroll, the captured request). Fields the user configures and
//! the last results live on [`Session`], which the event loop owns and
//! passes by reference. Nothing here is a process global.

use crossterm::event::KeyEvent;

use crate::types::{
    DEFAULT_PROMPT, DEFAULT_VERSIONS, GenRequest, GeneratedStory, Genre, ThemeName,
};

// ============================================================================
// APP EVENTS
// ============================================================================

/// Everything the event loop can receive from its channel.
///
/// Several producers feed a single mpsc channel:
/// - A key reader thread sends `Key` variants
/// - The generation worker sends `GenerationDone` / `GenerationFailed`
/// - Timer threads send `IntroElapsed`, `FarewellElapsed`, and the
///   generation watchdog's `GenerationTimeout`
///
/// Generation events carry the id of the request they answer; stale ids
/// (a request already timed out or abandoned) are discarded.
#[derive(Debug)]
pub enum AppEvent {
    /// A terminal key event from the crossterm reader thread.
    Key(KeyEvent),
    /// The one-time welcome intro has been on screen long enough.
    IntroElapsed,
    /// The worker finished a generation request.
    GenerationDone {
        request_id: u64,
        stories: Vec<GeneratedStory>,
    },
    /// The worker failed a generation request.
    GenerationFailed { request_id: u64, error: String },
    /// The watchdog gave up on a generation request.
    GenerationTimeout { request_id: u64 },
    /// The farewell screen has been on screen long enough.
    FarewellElapsed,
}

// ============================================================================
// SESSION STATE
// ============================================================================

/// Top-level session model.
///
/// Owns the user-configured fields, the results of the last generation,
/// and the current screen. Mutated only by the transition functions.
#[derive(Debug)]
pub struct Session {
    /// Current screen. Carries per-screen transient state.
    pub screen: Screen,

    /// True once the welcome intro has been shown. Never reverts.
    pub welcome_played: bool,
    /// True once the user has left the start screen. Never reverts.
    pub started: bool,

    /// Selected genre. Editable until a generation captures it.
    pub genre: Genre,
    /// Requested versions per generation, 1..=5.
    pub version_count: u8,
    /// Free-form prompt text. Starts as a non-empty placeholder.
    pub prompt_text: String,
    /// Visual theme. Never affects generation.
    pub theme: ThemeName,

    /// Stories from the most recent successful generation. Replaced, never
    /// appended; survives failed generations and re-edits untouched.
    pub last_results: Vec<GeneratedStory>,
    /// The request that produced `last_results`. Saving uses its prompt and
    /// genre, not the possibly re-edited session fields.
    pub last_request: Option<GenRequest>,

    /// Transient user-visible message, shown until the next one.
    pub status: Option<Status>,

    /// Monotonic counter behind generation request ids.
    pub request_seq: u64,

    /// Set when the app should exit on the next tick.
    pub should_quit: bool,
}

/// Startup configuration for a session, usually from CLI flags.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub theme: ThemeName,
    pub genre: Genre,
    pub version_count: u8,
    pub prompt_text: String,
    /// Treat the intro as already played.
    pub skip_intro: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            theme: ThemeName::default(),
            genre: Genre::default(),
            version_count: DEFAULT_VERSIONS,
            prompt_text: DEFAULT_PROMPT.to_string(),
            skip_intro: false,
        }
    }
}

impl Session {
    /// Fresh session with default options: intro not yet played.
    pub fn new() -> Session {
        Session::with_options(SessionOptions::default())
    }

    /// Session configured from options.
    pub fn with_options(opts: SessionOptions) -> Session {
        Session {
            screen: Screen::initial(opts.skip_intro),
            welcome_played: opts.skip_intro,
            started: false,
            genre: opts.genre,
            version_count: opts.version_count.clamp(
                crate::types::MIN_VERSIONS,
                crate::types::MAX_VERSIONS,
            ),
            prompt_text: opts.prompt_text,
            theme: opts.theme,
            last_results: Vec::new(),
            last_request: None,
            status: None,
            request_seq: 0,
            should_quit: false,
        }
    }

    /// Next unique generation request id.
    pub fn next_request_id(&mut self) -> u64 {
        self.request_seq += 1;
        self.request_seq
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

// ============================================================================
// SCREENS
// ============================================================================

/// Which part of the prompt form has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigField {
    #[default]
    Prompt,
    Genre,
    Versions,
    Theme,
}

impl ConfigField {
    pub const ALL: [ConfigField; 4] = [
        ConfigField::Prompt,
        ConfigField::Genre,
        ConfigField::Versions,
        ConfigField::Theme,
    ];

    pub fn next(self) -> ConfigField {
        let i = ConfigField::ALL.iter().position(|f| *f == self).unwrap_or(0);
        ConfigField::ALL[(i + 1) % ConfigField::ALL.len()]
    }

    pub fn prev(self) -> ConfigField {
        let i = ConfigField::ALL.iter().position(|f| *f == self).unwrap_or(0);
        ConfigField::ALL[(i + ConfigField::ALL.len() - 1) % ConfigField::ALL.len()]
    }
}

/// The current screen.
///
/// Each variant is a state in the session state machine, in typical
/// progression order. Variants carry only per-screen transient state.
#[derive(Debug, PartialEq, Eq)]
pub enum Screen {
    /// One-shot animated welcome. Advances by timer, at most once per
    /// session.
    WelcomeIntro,

    /// Static landing screen. Leaving it requires an explicit start.
    StartScreen,

    /// The main form: prompt entry plus genre, versions, and theme
    /// selectors.
    Configuring { focus: ConfigField },

    /// A generation request is in flight. The captured request is pinned
    /// here so later edits cannot touch it; the id links worker and
    /// watchdog events back to this request.
    Generating { request: GenRequest, request_id: u64 },

    /// Stories from the last generation, scrollable.
    ResultsReady { scroll: usize },

    /// Terminal farewell screen. No way out but quitting.
    Exiting,
}

impl Screen {
    /// Entry screen for a session: the intro plays at most once.
    pub fn initial(welcome_played: bool) -> Screen {
        if welcome_played {
            Screen::StartScreen
        } else {
            Screen::WelcomeIntro
        }
    }

    /// The form with focus on the prompt.
    pub fn configuring() -> Screen {
        Screen::Configuring {
            focus: ConfigField::Prompt,
        }
    }

    /// Results at the top of the scroll.
    pub fn results() -> Screen {
        Screen::ResultsReady { scroll: 0 }
    }
}

/// Placeholder during ownership handoffs in the transition function.
impl Default for Screen {
    fn default() -> Self {
        Screen::StartScreen
    }
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Semantic user action, decoupled from raw key events.
///
/// The effects layer maps key presses to Actions once, with no screen
/// context. The transition function decides what each Action means per
/// screen; in particular `Input` is prompt text while the prompt has
/// focus and a shortcut elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A printable character.
    Input(char),
    /// Backspace.
    DeleteBack,
    /// Enter: start the session, or trigger a generation.
    Confirm,
    /// Tab / Shift-Tab: cycle form focus.
    FocusNext,
    FocusPrev,
    /// Arrow up/down: focus movement or result scrolling.
    MoveUp,
    MoveDown,
    /// Arrow left/right: cycle the focused selector's value.
    ValuePrev,
    ValueNext,
    /// Ctrl-S: save the last generation.
    Save,
    /// Esc: leave for the farewell screen (once started).
    Exit,
    /// Ctrl-C: hard quit.
    Quit,
}

// ============================================================================
// TRANSITIONS
// ============================================================================

/// Result of a pure state transition.
///
/// The transition functions mutate the session in place and return this
/// so the effects boundary knows whether anything impure must happen.
/// Pure code describes WHAT should happen, effectful code decides HOW.
#[derive(Debug, PartialEq, Eq)]
pub enum Transition {
    /// State updated in place; nothing further to do.
    Stay,
    /// Execute a side effect.
    Effect(Effect),
    /// Quit the application.
    Quit,
}

/// Side effect requested by a pure transition.
///
/// Pure code never executes these, it only describes them.
#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    /// Run the captured request on the generation worker and arm the
    /// watchdog for it.
    StartGeneration { request: GenRequest, request_id: u64 },
    /// Persist the last generation as an artifact.
    SaveBatch,
}

// ============================================================================
// STATUS LINE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Warn,
    Error,
}

/// A transient message for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

impl Status {
    pub fn info(text: impl Into<String>) -> Status {
        Status { kind: StatusKind::Info, text: text.into() }
    }

    pub fn warn(text: impl Into<String>) -> Status {
        Status { kind: StatusKind::Warn, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Status {
        Status { kind: StatusKind::Error, text: text.into() }
    }
}

// ============================================================================
// TESTS
// ============================================================================
