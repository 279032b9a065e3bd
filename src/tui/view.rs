//! Pure rendering: map session state to ratatui widget trees.
//!
//! Each screen has a dedicated render function; `render()` dispatches on
//! the current Screen variant. All widget building is pure (state in,
//! widgets out); the only effect is writing to the terminal buffer.
//!
//! Every screen draws through the active theme's palette, so switching
//! themes restyles the whole surface without touching any logic.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};

use crate::assets::AssetSet;
use crate::types::{GenRequest, GeneratedStory, MAX_VERSIONS, MIN_VERSIONS};

use super::state::{ConfigField, Screen, Session, Status, StatusKind};
use super::theme::{self, Palette};

// ============================================================================
// DISPATCH
// ============================================================================

/// Render the current screen to the terminal frame.
pub fn render(session: &Session, assets: &AssetSet, frame: &mut Frame) {
    let palette = theme::palette(session.theme);
    let area = frame.area();

    // Paint the themed background before anything else.
    frame.render_widget(Block::default().style(palette.base()), area);

    // Common layout: title, content, status, help.
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(area);

    frame.render_widget(render_title(&session.screen, palette), chunks[0]);
    frame.render_widget(render_status(session.status.as_ref(), palette), chunks[2]);
    frame.render_widget(render_help(&session.screen, palette), chunks[3]);

    let content = chunks[1];
    match &session.screen {
        Screen::WelcomeIntro => render_welcome(assets, palette, frame, content),
        Screen::StartScreen => render_start(assets, palette, frame, content),
        Screen::Configuring { focus } => {
            render_configuring(session, *focus, palette, frame, content)
        }
        Screen::Generating { request, .. } => {
            render_generating(request, assets, palette, frame, content)
        }
        Screen::ResultsReady { scroll } => {
            render_results(session, *scroll, palette, frame, content)
        }
        Screen::Exiting => render_exiting(assets, palette, frame, content),
    }
}

// ============================================================================
// SHARED CHROME
// ============================================================================

/// Title bar: app name plus screen context.
fn render_title(screen: &Screen, palette: &Palette) -> Paragraph<'static> {
    let context = match screen {
        Screen::WelcomeIntro => "",
        Screen::StartScreen => "",
        Screen::Configuring { .. } => "  ·  your story",
        Screen::Generating { .. } => "  ·  weaving",
        Screen::ResultsReady { .. } => "  ·  stories",
        Screen::Exiting => "  ·  farewell",
    };
    Paragraph::new(Line::from(vec![
        Span::styled(" storyloom", palette.title()),
        Span::styled(context.to_string(), palette.dim()),
    ]))
    .style(palette.base())
}

/// Help line: available keys for the current screen.
fn render_help(screen: &Screen, palette: &Palette) -> Paragraph<'static> {
    let help = match screen {
        Screen::WelcomeIntro => "^C quit",
        Screen::StartScreen => "[Enter] start creating  [^C] quit",
        Screen::Configuring { .. } => {
            "[Tab] field  [</>] change  [Enter] generate  [Esc] exit"
        }
        Screen::Generating { .. } => "[Esc] exit  (generation keeps its settings)",
        Screen::ResultsReady { .. } => {
            "[j/k] scroll  [s] save  [e] edit & regenerate  [Esc] exit"
        }
        Screen::Exiting => "[Enter] leave now",
    };
    Paragraph::new(Span::styled(help, palette.dim())).style(palette.base())
}

/// Status line: the last transient message, colored by kind.
fn render_status(status: Option<&Status>, palette: &Palette) -> Paragraph<'static> {
    let line = match status {
        None => Line::from(""),
        Some(status) => {
            let style = match status.kind {
                StatusKind::Info => palette.interactive(),
                StatusKind::Warn => Style::new().fg(Color::Yellow),
                StatusKind::Error => Style::new().fg(Color::Red),
            };
            Line::from(Span::styled(format!(" {}", status.text), style))
        }
    };
    Paragraph::new(line).style(palette.base())
}

/// Turn banner text into indented, styled lines.
fn banner_lines(text: &str, style: Style) -> Vec<Line<'static>> {
    text.lines()
        .map(|l| Line::from(Span::styled(format!("  {l}"), style)))
        .collect()
}

// ============================================================================
// SCREEN: WELCOME INTRO
// ============================================================================

fn render_welcome(assets: &AssetSet, palette: &Palette, frame: &mut Frame, area: Rect) {
    let mut lines = vec![Line::from("")];
    lines.extend(banner_lines(&assets.welcome, palette.interactive()));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Welcome to the storyloom...",
        palette.title(),
    )));
    frame.render_widget(
        Paragraph::new(lines).style(palette.base()).wrap(Wrap { trim: false }),
        area,
    );
}

// ============================================================================
// SCREEN: START
// ============================================================================

fn render_start(assets: &AssetSet, palette: &Palette, frame: &mut Frame, area: Rect) {
    let mut lines = vec![Line::from("")];
    lines.push(Line::from(Span::styled(
        "  Weave short stories from a single prompt",
        palette.title(),
    )));
    lines.push(Line::from(""));
    lines.extend(banner_lines(&assets.backdrop, palette.dim()));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  [Enter] ", palette.interactive()),
        Span::raw("Start creating"),
    ]));
    frame.render_widget(
        Paragraph::new(lines).style(palette.base()).wrap(Wrap { trim: false }),
        area,
    );
}

// ============================================================================
// SCREEN: CONFIGURING
// ============================================================================

fn render_configuring(
    session: &Session,
    focus: ConfigField,
    palette: &Palette,
    frame: &mut Frame,
    area: Rect,
) {
    let marker = |field: ConfigField| if field == focus { "▸ " } else { "  " };
    let field_style = |field: ConfigField| {
        if field == focus {
            palette.interactive()
        } else {
            palette.base()
        }
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Enter your story", palette.title())),
        Line::from(""),
    ];

    // Prompt: a one-line editor with a cursor mark while focused.
    let cursor = if focus == ConfigField::Prompt { "▏" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(marker(ConfigField::Prompt), palette.interactive()),
        Span::styled("Prompt   ", field_style(ConfigField::Prompt)),
        Span::styled(
            format!("{}{}", session.prompt_text, cursor),
            Style::new().fg(palette.fg).bg(palette.card),
        ),
    ]));
    lines.push(Line::from(""));

    // Selectors.
    let selector = |field: ConfigField, label: &str, value: String| -> Line<'static> {
        let arrows = if field == focus {
            format!("◂ {value} ▸")
        } else {
            value
        };
        Line::from(vec![
            Span::raw("  "),
            Span::styled(marker(field).to_string(), palette.interactive()),
            Span::styled(format!("{label:9}"), field_style(field)),
            Span::styled(arrows, field_style(field)),
        ])
    };
    lines.push(selector(
        ConfigField::Genre,
        "Genre",
        session.genre.label().to_string(),
    ));
    lines.push(selector(
        ConfigField::Versions,
        "Versions",
        format!("{} (of {}-{})", session.version_count, MIN_VERSIONS, MAX_VERSIONS),
    ));
    lines.push(selector(
        ConfigField::Theme,
        "Theme",
        session.theme.label().to_string(),
    ));

    if !session.last_results.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "  {} version{} from the last run are kept until you regenerate",
                session.last_results.len(),
                if session.last_results.len() == 1 { "" } else { "s" }
            ),
            palette.dim(),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).style(palette.base()).wrap(Wrap { trim: false }),
        area,
    );
}

// ============================================================================
// SCREEN: GENERATING
// ============================================================================

fn render_generating(
    request: &GenRequest,
    assets: &AssetSet,
    palette: &Palette,
    frame: &mut Frame,
    area: Rect,
) {
    let mut lines = vec![Line::from("")];
    lines.extend(banner_lines(&assets.loading, palette.interactive()));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "  Weaving {} {} version{}...",
            request.version_count,
            request.genre.label(),
            if request.version_count == 1 { "" } else { "s" }
        ),
        palette.title(),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("  \"{}\"", request.prompt),
        palette.dim(),
    )));
    frame.render_widget(
        Paragraph::new(lines).style(palette.base()).wrap(Wrap { trim: false }),
        area,
    );
}

// ============================================================================
// SCREEN: RESULTS
// ============================================================================

fn render_results(
    session: &Session,
    scroll: usize,
    palette: &Palette,
    frame: &mut Frame,
    area: Rect,
) {
    let mut lines: Vec<Line> = vec![Line::from("")];
    for story in &session.last_results {
        lines.extend(story_card(story, palette, area.width));
        lines.push(Line::from(""));
    }
    if session.last_results.is_empty() {
        lines.push(Line::from(Span::styled("  (no stories yet)", palette.dim())));
    }

    // Scroll is clamped so the last line can always reach the viewport.
    let total = lines.len();
    let visible = area.height as usize;
    let max_scroll = total.saturating_sub(visible);
    let offset = scroll.min(max_scroll);

    frame.render_widget(
        Paragraph::new(lines)
            .style(palette.base())
            .scroll((offset as u16, 0)),
        area,
    );
}

/// One story as card-styled lines: a glowing rule, a version header, and
/// the text on the card background.
fn story_card(story: &GeneratedStory, palette: &Palette, width: u16) -> Vec<Line<'static>> {
    let inner = width.saturating_sub(4).max(20) as usize;
    let mut lines = Vec::new();

    lines.push(Line::from(vec![
        Span::styled("  ✨ ", palette.card_border()),
        Span::styled(format!("Version {}", story.version), palette.title()),
    ]));
    lines.push(Line::from(Span::styled(
        format!("  {}", "─".repeat(inner)),
        palette.card_border(),
    )));
    for row in wrap_text(&story.text, inner) {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{row:<inner$}"), palette.card_body()),
        ]));
    }
    lines
}

/// Greedy word wrap. Words longer than the width get their own row.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    for paragraph in text.lines() {
        let mut row = String::new();
        for word in paragraph.split_whitespace() {
            if row.is_empty() {
                row = word.to_string();
            } else if row.len() + 1 + word.len() <= width {
                row.push(' ');
                row.push_str(word);
            } else {
                rows.push(std::mem::take(&mut row));
                row = word.to_string();
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }
    if rows.is_empty() {
        rows.push(String::new());
    }
    rows
}

// ============================================================================
// SCREEN: EXITING
// ============================================================================

fn render_exiting(assets: &AssetSet, palette: &Palette, frame: &mut Frame, area: Rect) {
    let mut lines = vec![Line::from("")];
    lines.extend(banner_lines(&assets.farewell, palette.interactive()));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Thanks for weaving stories with storyloom!",
        palette.title(),
    )));
    frame.render_widget(
        Paragraph::new(lines).style(palette.base()).wrap(Wrap { trim: false }),
        area,
    );
}

// ============================================================================
// TESTS
// ============================================================================
