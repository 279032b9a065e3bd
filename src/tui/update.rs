//! Pure state transitions: (Session, Action) -> Transition.
//!
//! This is the core logic of the application. Fully testable without a
//! terminal, a model, or a filesystem. Each screen defines which actions
//! it accepts; unhandled actions leave the session unchanged (no-op).
//!
//! Background events (worker results, timers) go through
//! [`handle_app_event`], which enforces the one-in-flight generation
//! discipline: events carrying a stale request id are discarded.

use crate::model::GenerationError;
use crate::types::{GenRequest, GeneratedStory, MAX_VERSIONS, MIN_VERSIONS};

use super::state::{
    Action, AppEvent, ConfigField, Effect, Screen, Session, Status, Transition,
};

// ============================================================================
// USER ACTIONS
// ============================================================================

/// Pure transition function for user actions.
///
/// Mutates the session in place and tells the effects boundary whether a
/// side effect or a quit is required.
pub fn update(session: &mut Session, action: &Action) -> Transition {
    // Ctrl-C is a hard quit from anywhere.
    if *action == Action::Quit {
        return Transition::Quit;
    }

    let screen = std::mem::take(&mut session.screen);
    match screen {
        // The intro ignores input: it advances by timer, exactly once.
        Screen::WelcomeIntro => {
            session.screen = Screen::WelcomeIntro;
            Transition::Stay
        }
        Screen::StartScreen => update_start(session, action),
        Screen::Configuring { focus } => update_configuring(session, focus, action),
        Screen::Generating { request, request_id } => {
            update_generating(session, request, request_id, action)
        }
        Screen::ResultsReady { scroll } => update_results(session, scroll, action),
        Screen::Exiting => update_exiting(session, action),
    }
}

// ============================================================================
// PER-SCREEN HANDLERS
// ============================================================================

/// StartScreen: only an explicit start leaves it. `started` is monotonic;
/// nothing past this screen can ever unset it.
fn update_start(session: &mut Session, action: &Action) -> Transition {
    match action {
        Action::Confirm => {
            session.started = true;
            session.screen = Screen::configuring();
        }
        // Exit requires started == true, so it is inert here.
        _ => session.screen = Screen::StartScreen,
    }
    Transition::Stay
}

/// Configuring: prompt editing, selector cycling, and the generate trigger.
fn update_configuring(session: &mut Session, focus: ConfigField, action: &Action) -> Transition {
    match action {
        Action::Input(c) => {
            if focus == ConfigField::Prompt {
                session.prompt_text.push(*c);
            }
            session.screen = Screen::Configuring { focus };
            Transition::Stay
        }
        Action::DeleteBack => {
            if focus == ConfigField::Prompt {
                session.prompt_text.pop();
            }
            session.screen = Screen::Configuring { focus };
            Transition::Stay
        }
        Action::FocusNext | Action::MoveDown => {
            session.screen = Screen::Configuring { focus: focus.next() };
            Transition::Stay
        }
        Action::FocusPrev | Action::MoveUp => {
            session.screen = Screen::Configuring { focus: focus.prev() };
            Transition::Stay
        }
        Action::ValueNext => {
            cycle_value(session, focus, true);
            session.screen = Screen::Configuring { focus };
            Transition::Stay
        }
        Action::ValuePrev => {
            cycle_value(session, focus, false);
            session.screen = Screen::Configuring { focus };
            Transition::Stay
        }
        Action::Confirm => trigger_generation(session, focus),
        Action::Exit => {
            session.screen = Screen::Exiting;
            Transition::Stay
        }
        _ => {
            session.screen = Screen::Configuring { focus };
            Transition::Stay
        }
    }
}

/// Cycle the value under a selector focus. The prompt has no cycle.
fn cycle_value(session: &mut Session, focus: ConfigField, forward: bool) {
    match focus {
        ConfigField::Prompt => {}
        ConfigField::Genre => {
            session.genre = if forward { session.genre.next() } else { session.genre.prev() };
        }
        ConfigField::Versions => {
            session.version_count = if forward {
                (session.version_count + 1).min(MAX_VERSIONS)
            } else {
                session.version_count.saturating_sub(1).max(MIN_VERSIONS)
            };
        }
        ConfigField::Theme => {
            session.theme = if forward { session.theme.next() } else { session.theme.prev() };
        }
    }
}

/// Capture the request and hand it to the effects boundary, or reject a
/// blank prompt on the spot with no state change.
fn trigger_generation(session: &mut Session, focus: ConfigField) -> Transition {
    let prompt = session.prompt_text.trim();
    if prompt.is_empty() {
        session.status = Some(Status::error("Enter a prompt before generating."));
        session.screen = Screen::Configuring { focus };
        return Transition::Stay;
    }

    // Snapshot the fields now: edits after this point belong to the next
    // request, never to this one.
    let request = GenRequest {
        prompt: prompt.to_string(),
        genre: session.genre,
        version_count: session.version_count,
    };
    let request_id = session.next_request_id();
    session.status = None;
    session.screen = Screen::Generating {
        request: request.clone(),
        request_id,
    };
    Transition::Effect(Effect::StartGeneration { request, request_id })
}

/// Generating: the sole suspension point. A second generate trigger is
/// rejected outright, never queued. Only exit remains available.
fn update_generating(
    session: &mut Session,
    request: GenRequest,
    request_id: u64,
    action: &Action,
) -> Transition {
    match action {
        Action::Exit => {
            session.screen = Screen::Exiting;
        }
        _ => {
            session.screen = Screen::Generating { request, request_id };
        }
    }
    Transition::Stay
}

/// ResultsReady: scroll, re-edit, save, or leave. Results are kept until
/// the next successful generation replaces them.
fn update_results(session: &mut Session, scroll: usize, action: &Action) -> Transition {
    match action {
        Action::MoveDown | Action::Input('j') => {
            let limit = scroll_limit(&session.last_results);
            session.screen = Screen::ResultsReady {
                scroll: (scroll + 1).min(limit),
            };
            Transition::Stay
        }
        Action::MoveUp | Action::Input('k') => {
            session.screen = Screen::ResultsReady {
                scroll: scroll.saturating_sub(1),
            };
            Transition::Stay
        }
        Action::Confirm | Action::FocusNext | Action::Input('e') | Action::Input('E') => {
            session.screen = Screen::configuring();
            Transition::Stay
        }
        Action::Save | Action::Input('s') | Action::Input('S') => {
            session.screen = Screen::ResultsReady { scroll };
            if session.last_results.is_empty() || session.last_request.is_none() {
                session.status = Some(Status::warn("Nothing to save yet."));
                Transition::Stay
            } else {
                Transition::Effect(Effect::SaveBatch)
            }
        }
        Action::Exit | Action::Input('q') => {
            session.screen = Screen::Exiting;
            Transition::Stay
        }
        _ => {
            session.screen = Screen::ResultsReady { scroll };
            Transition::Stay
        }
    }
}

/// Exiting is terminal: repeated exit actions are idempotent no-ops, and
/// the farewell timer (or an impatient key) ends the process.
fn update_exiting(session: &mut Session, action: &Action) -> Transition {
    session.screen = Screen::Exiting;
    match action {
        Action::Confirm | Action::Input('q') => Transition::Quit,
        _ => Transition::Stay,
    }
}

/// Coarse upper bound for result scrolling. The renderer clamps exactly;
/// this only keeps the counter from running away under held keys.
fn scroll_limit(results: &[GeneratedStory]) -> usize {
    results
        .iter()
        .map(|s| s.text.split_whitespace().count() / 8 + 4)
        .sum()
}

// ============================================================================
// BACKGROUND EVENTS
// ============================================================================

/// Pure handler for non-key events from worker and timer threads.
///
/// Generation events are honored only while the session is still waiting
/// on exactly that request id. Anything else arriving late is stale and
/// dropped without touching state.
pub fn handle_app_event(session: &mut Session, event: AppEvent) -> Transition {
    match event {
        // Keys are dispatched through map_key + update by the event loop.
        AppEvent::Key(_) => Transition::Stay,

        AppEvent::IntroElapsed => {
            if session.screen == Screen::WelcomeIntro {
                session.welcome_played = true;
                session.screen = Screen::StartScreen;
            }
            Transition::Stay
        }

        AppEvent::GenerationDone { request_id, stories } => {
            let screen = std::mem::take(&mut session.screen);
            match screen {
                Screen::Generating { request, request_id: id } if id == request_id => {
                    let n = stories.len();
                    session.last_results = stories;
                    session.last_request = Some(request);
                    session.screen = Screen::results();
                    session.status = Some(Status::info(format!(
                        "Generated {} version{}.",
                        n,
                        if n == 1 { "" } else { "s" }
                    )));
                }
                other => session.screen = other,
            }
            Transition::Stay
        }

        AppEvent::GenerationFailed { request_id, error } => {
            if matches!(session.screen, Screen::Generating { request_id: id, .. } if id == request_id)
            {
                session.screen = Screen::configuring();
                session.status = Some(Status::error(format!("Generation failed: {error}")));
            }
            Transition::Stay
        }

        AppEvent::GenerationTimeout { request_id } => {
            if matches!(session.screen, Screen::Generating { request_id: id, .. } if id == request_id)
            {
                session.screen = Screen::configuring();
                session.status =
                    Some(Status::error(GenerationError::TimedOut.to_string()));
            }
            Transition::Stay
        }

        AppEvent::FarewellElapsed => {
            if session.screen == Screen::Exiting {
                Transition::Quit
            } else {
                Transition::Stay
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Genre, ThemeName};

    fn stories(texts: &[&str]) -> Vec<GeneratedStory> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| GeneratedStory {
                version: i as u32 + 1,
                text: t.to_string(),
            })
            .collect()
    }

    /// Session driven past the intro and start screen, sitting on the form.
    fn configuring_session() -> Session {
        let mut session = Session::new();
        handle_app_event(&mut session, AppEvent::IntroElapsed);
        update(&mut session, &Action::Confirm);
        assert_eq!(session.screen, Screen::configuring());
        session
    }

    /// Session with a generation in flight; returns its request id.
    fn generating_session() -> (Session, u64) {
        let mut session = configuring_session();
        let transition = update(&mut session, &Action::Confirm);
        let Screen::Generating { request_id, .. } = &session.screen else {
            panic!("expected Generating, got {:?}", session.screen);
        };
        let request_id = *request_id;
        assert!(matches!(
            transition,
            Transition::Effect(Effect::StartGeneration { .. })
        ));
        (session, request_id)
    }

    // -- Welcome intro --

    #[test]
    fn intro_advances_only_by_timer() {
        let mut session = Session::new();
        for action in [Action::Confirm, Action::Exit, Action::Input('x'), Action::Save] {
            update(&mut session, &action);
            assert_eq!(session.screen, Screen::WelcomeIntro);
        }
        handle_app_event(&mut session, AppEvent::IntroElapsed);
        assert_eq!(session.screen, Screen::StartScreen);
        assert!(session.welcome_played);
    }

    #[test]
    fn intro_plays_at_most_once_across_refreshes() {
        // First launch: intro shows, then marks itself played.
        let mut session = Session::new();
        assert_eq!(session.screen, Screen::WelcomeIntro);
        handle_app_event(&mut session, AppEvent::IntroElapsed);
        assert!(session.welcome_played);

        // A relaunch carrying the flag must never show the intro again.
        assert_eq!(Screen::initial(session.welcome_played), Screen::StartScreen);

        // A stray second timer event changes nothing.
        handle_app_event(&mut session, AppEvent::IntroElapsed);
        assert_eq!(session.screen, Screen::StartScreen);
    }

    // -- Start screen --

    #[test]
    fn start_requires_explicit_confirm() {
        let mut session = Session::new();
        handle_app_event(&mut session, AppEvent::IntroElapsed);

        update(&mut session, &Action::Input('x'));
        assert_eq!(session.screen, Screen::StartScreen);
        assert!(!session.started);

        update(&mut session, &Action::Confirm);
        assert_eq!(session.screen, Screen::configuring());
        assert!(session.started);
    }

    #[test]
    fn exit_is_inert_before_start() {
        let mut session = Session::new();
        handle_app_event(&mut session, AppEvent::IntroElapsed);
        update(&mut session, &Action::Exit);
        assert_eq!(session.screen, Screen::StartScreen);
    }

    #[test]
    fn started_is_monotonic() {
        let (mut session, request_id) = generating_session();
        let actions = [
            Action::Exit,
            Action::Confirm,
            Action::Input('z'),
            Action::DeleteBack,
            Action::Save,
            Action::MoveUp,
        ];
        handle_app_event(
            &mut session,
            AppEvent::GenerationFailed { request_id, error: "boom".into() },
        );
        for action in &actions {
            update(&mut session, action);
            assert!(session.started, "started reverted after {action:?}");
        }
    }

    // -- Configuring --

    #[test]
    fn prompt_editing_appends_and_deletes() {
        let mut session = configuring_session();
        session.prompt_text.clear();
        update(&mut session, &Action::Input('h'));
        update(&mut session, &Action::Input('i'));
        assert_eq!(session.prompt_text, "hi");
        update(&mut session, &Action::DeleteBack);
        assert_eq!(session.prompt_text, "h");
    }

    #[test]
    fn focus_cycles_with_tab_and_arrows() {
        let mut session = configuring_session();
        update(&mut session, &Action::FocusNext);
        assert_eq!(
            session.screen,
            Screen::Configuring { focus: ConfigField::Genre }
        );
        update(&mut session, &Action::MoveDown);
        assert_eq!(
            session.screen,
            Screen::Configuring { focus: ConfigField::Versions }
        );
        update(&mut session, &Action::FocusPrev);
        update(&mut session, &Action::MoveUp);
        assert_eq!(
            session.screen,
            Screen::Configuring { focus: ConfigField::Prompt }
        );
    }

    #[test]
    fn typing_is_ignored_while_a_selector_has_focus() {
        let mut session = configuring_session();
        let before = session.prompt_text.clone();
        update(&mut session, &Action::FocusNext);
        update(&mut session, &Action::Input('x'));
        assert_eq!(session.prompt_text, before);
    }

    #[test]
    fn genre_selector_cycles() {
        let mut session = configuring_session();
        update(&mut session, &Action::FocusNext); // Genre
        update(&mut session, &Action::ValueNext);
        assert_eq!(session.genre, Genre::Mystery);
        update(&mut session, &Action::ValuePrev);
        update(&mut session, &Action::ValuePrev);
        assert_eq!(session.genre, Genre::Romance);
    }

    #[test]
    fn version_selector_clamps_to_bounds() {
        let mut session = configuring_session();
        update(&mut session, &Action::FocusNext); // Genre
        update(&mut session, &Action::FocusNext); // Versions

        for _ in 0..10 {
            update(&mut session, &Action::ValueNext);
        }
        assert_eq!(session.version_count, MAX_VERSIONS);

        for _ in 0..10 {
            update(&mut session, &Action::ValuePrev);
        }
        assert_eq!(session.version_count, MIN_VERSIONS);
    }

    #[test]
    fn theme_change_is_cosmetic_only() {
        let mut session = configuring_session();
        session.last_results = stories(&["kept"]);
        update(&mut session, &Action::FocusPrev); // Theme
        update(&mut session, &Action::ValueNext);
        assert_eq!(session.theme, ThemeName::Dark);
        assert_eq!(session.last_results, stories(&["kept"]));
        assert!(session.started);
    }

    // -- Generate trigger --

    #[test]
    fn blank_prompt_never_reaches_generating() {
        for blank in ["", "   ", "\t \n"] {
            let mut session = configuring_session();
            session.prompt_text = blank.to_string();
            let transition = update(&mut session, &Action::Confirm);
            assert_eq!(transition, Transition::Stay);
            assert_eq!(session.screen, Screen::configuring());
            let status = session.status.expect("blank prompt must set a status");
            assert_eq!(status.kind, super::super::state::StatusKind::Error);
        }
    }

    #[test]
    fn generate_captures_fields_at_trigger_time() {
        let mut session = configuring_session();
        session.prompt_text = "  The tower had no door  ".to_string();
        session.genre = Genre::Horror;
        session.version_count = 3;

        let transition = update(&mut session, &Action::Confirm);
        let Transition::Effect(Effect::StartGeneration { request, request_id }) = transition
        else {
            panic!("expected a generation effect");
        };
        assert_eq!(request.prompt, "The tower had no door");
        assert_eq!(request.genre, Genre::Horror);
        assert_eq!(request.version_count, 3);
        assert_eq!(
            session.screen,
            Screen::Generating { request, request_id }
        );
    }

    #[test]
    fn second_generate_while_in_flight_is_a_noop() {
        let (mut session, request_id) = generating_session();
        let transition = update(&mut session, &Action::Confirm);
        assert_eq!(transition, Transition::Stay);
        // Still the same pending request, no duplicate effect.
        assert!(matches!(
            session.screen,
            Screen::Generating { request_id: id, .. } if id == request_id
        ));
    }

    #[test]
    fn edits_are_rejected_while_generating() {
        let (mut session, _) = generating_session();
        let prompt_before = session.prompt_text.clone();
        update(&mut session, &Action::Input('x'));
        update(&mut session, &Action::ValueNext);
        assert_eq!(session.prompt_text, prompt_before);
        assert_eq!(session.genre, Genre::Fantasy);
    }

    // -- Generation completion --

    #[test]
    fn completion_installs_results_in_order() {
        let mut session = configuring_session();
        session.version_count = 3;
        update(&mut session, &Action::Confirm);
        let Screen::Generating { request_id, .. } = &session.screen else {
            panic!("expected Generating");
        };
        let request_id = *request_id;

        handle_app_event(
            &mut session,
            AppEvent::GenerationDone {
                request_id,
                stories: stories(&["A", "B", "C"]),
            },
        );

        assert_eq!(session.screen, Screen::results());
        assert_eq!(session.last_results.len(), 3);
        for (i, (story, text)) in session.last_results.iter().zip(["A", "B", "C"]).enumerate() {
            assert_eq!(story.version, i as u32 + 1);
            assert_eq!(story.text, text);
        }
        assert!(session.last_request.is_some());
    }

    #[test]
    fn failure_returns_to_configuring_and_keeps_old_results() {
        // First generation succeeds.
        let (mut session, id1) = generating_session();
        handle_app_event(
            &mut session,
            AppEvent::GenerationDone { request_id: id1, stories: stories(&["old"]) },
        );

        // Second one fails: the old results must survive untouched.
        update(&mut session, &Action::Confirm); // back to Configuring
        let transition = update(&mut session, &Action::Confirm);
        assert!(matches!(transition, Transition::Effect(_)));
        let Screen::Generating { request_id: id2, .. } = &session.screen else {
            panic!("expected Generating");
        };
        let id2 = *id2;
        handle_app_event(
            &mut session,
            AppEvent::GenerationFailed { request_id: id2, error: "model choked".into() },
        );

        assert_eq!(session.screen, Screen::configuring());
        assert_eq!(session.last_results, stories(&["old"]));
        let status = session.status.clone().unwrap();
        assert!(status.text.contains("model choked"));
    }

    #[test]
    fn failure_on_first_attempt_leaves_results_empty() {
        let (mut session, request_id) = generating_session();
        handle_app_event(
            &mut session,
            AppEvent::GenerationFailed { request_id, error: "no".into() },
        );
        assert!(session.last_results.is_empty());
        assert_eq!(session.screen, Screen::configuring());
    }

    #[test]
    fn stale_completion_is_discarded() {
        let (mut session, request_id) = generating_session();
        handle_app_event(
            &mut session,
            AppEvent::GenerationDone {
                request_id: request_id + 99,
                stories: stories(&["phantom"]),
            },
        );
        assert!(session.last_results.is_empty());
        assert!(matches!(
            session.screen,
            Screen::Generating { request_id: id, .. } if id == request_id
        ));
    }

    #[test]
    fn timeout_fails_the_request_and_later_completion_is_ignored() {
        let (mut session, request_id) = generating_session();
        handle_app_event(&mut session, AppEvent::GenerationTimeout { request_id });
        assert_eq!(session.screen, Screen::configuring());
        assert!(session.status.clone().unwrap().text.contains("timed out"));

        // The worker finishes anyway, far too late.
        handle_app_event(
            &mut session,
            AppEvent::GenerationDone { request_id, stories: stories(&["late"]) },
        );
        assert!(session.last_results.is_empty());
        assert_eq!(session.screen, Screen::configuring());
    }

    #[test]
    fn stale_timeout_after_completion_is_ignored() {
        let (mut session, request_id) = generating_session();
        handle_app_event(
            &mut session,
            AppEvent::GenerationDone { request_id, stories: stories(&["ok"]) },
        );
        handle_app_event(&mut session, AppEvent::GenerationTimeout { request_id });
        assert_eq!(session.screen, Screen::results());
        assert_eq!(session.last_results, stories(&["ok"]));
    }

    // -- Results screen --

    #[test]
    fn results_scroll_clamps_at_both_ends() {
        let (mut session, request_id) = generating_session();
        handle_app_event(
            &mut session,
            AppEvent::GenerationDone { request_id, stories: stories(&["one two three"]) },
        );

        update(&mut session, &Action::MoveUp);
        assert_eq!(session.screen, Screen::ResultsReady { scroll: 0 });

        for _ in 0..1000 {
            update(&mut session, &Action::MoveDown);
        }
        let Screen::ResultsReady { scroll } = &session.screen else {
            panic!("expected ResultsReady");
        };
        assert!(*scroll <= scroll_limit(&session.last_results));
    }

    #[test]
    fn edit_reenters_configuring_without_clearing_results() {
        let (mut session, request_id) = generating_session();
        handle_app_event(
            &mut session,
            AppEvent::GenerationDone { request_id, stories: stories(&["keep me"]) },
        );
        update(&mut session, &Action::Input('e'));
        assert_eq!(session.screen, Screen::configuring());
        assert_eq!(session.last_results, stories(&["keep me"]));
    }

    #[test]
    fn save_from_results_requests_the_effect_and_stays() {
        let (mut session, request_id) = generating_session();
        handle_app_event(
            &mut session,
            AppEvent::GenerationDone { request_id, stories: stories(&["saved"]) },
        );
        let transition = update(&mut session, &Action::Save);
        assert_eq!(transition, Transition::Effect(Effect::SaveBatch));
        assert_eq!(session.screen, Screen::ResultsReady { scroll: 0 });
        assert_eq!(session.last_results, stories(&["saved"]));
    }

    // -- Exiting --

    #[test]
    fn exit_reaches_exiting_from_every_started_screen() {
        // Configuring
        let mut session = configuring_session();
        update(&mut session, &Action::Exit);
        assert_eq!(session.screen, Screen::Exiting);

        // Generating
        let (mut session, _) = generating_session();
        update(&mut session, &Action::Exit);
        assert_eq!(session.screen, Screen::Exiting);

        // ResultsReady
        let (mut session, request_id) = generating_session();
        handle_app_event(
            &mut session,
            AppEvent::GenerationDone { request_id, stories: stories(&["x"]) },
        );
        update(&mut session, &Action::Exit);
        assert_eq!(session.screen, Screen::Exiting);
    }

    #[test]
    fn repeated_exit_is_an_idempotent_noop() {
        let mut session = configuring_session();
        update(&mut session, &Action::Exit);
        let transition = update(&mut session, &Action::Exit);
        assert_eq!(transition, Transition::Stay);
        assert_eq!(session.screen, Screen::Exiting);
    }

    #[test]
    fn farewell_timer_quits_only_from_exiting() {
        let mut session = configuring_session();
        assert_eq!(
            handle_app_event(&mut session, AppEvent::FarewellElapsed),
            Transition::Stay
        );

        update(&mut session, &Action::Exit);
        assert_eq!(
            handle_app_event(&mut session, AppEvent::FarewellElapsed),
            Transition::Quit
        );
    }

    #[test]
    fn results_arriving_after_exit_are_dropped() {
        let (mut session, request_id) = generating_session();
        update(&mut session, &Action::Exit);
        handle_app_event(
            &mut session,
            AppEvent::GenerationDone { request_id, stories: stories(&["too late"]) },
        );
        assert_eq!(session.screen, Screen::Exiting);
        assert!(session.last_results.is_empty());
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let mut session = Session::new();
        assert_eq!(update(&mut session, &Action::Quit), Transition::Quit);

        let (mut session, _) = generating_session();
        assert_eq!(update(&mut session, &Action::Quit), Transition::Quit);
    }
}
