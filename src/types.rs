//! Domain types for storyloom.

use serde::{Deserialize, Serialize};

// ============================================================================
// LIMITS & DEFAULTS
// ============================================================================

/// Smallest number of story versions a single generation may request.
pub const MIN_VERSIONS: u8 = 1;

/// Largest number of story versions a single generation may request.
pub const MAX_VERSIONS: u8 = 5;

/// Versions requested when the user has not touched the selector.
pub const DEFAULT_VERSIONS: u8 = 2;

/// Placeholder prompt shown in a fresh session. Non-empty on purpose:
/// a user can generate immediately without typing anything.
pub const DEFAULT_PROMPT: &str = "Once upon a time in a faraway kingdom...";

// ============================================================================
// ENUMS
// ============================================================================

/// Story genres the model knows how to voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Genre {
    #[default]
    Fantasy,
    Mystery,
    SciFi,
    Horror,
    Romance,
}

impl Genre {
    /// All genres, in selector order.
    pub const ALL: [Genre; 5] = [
        Genre::Fantasy,
        Genre::Mystery,
        Genre::SciFi,
        Genre::Horror,
        Genre::Romance,
    ];

    /// Display name, also used in saved artifacts.
    pub fn label(self) -> &'static str {
        match self {
            Genre::Fantasy => "Fantasy",
            Genre::Mystery => "Mystery",
            Genre::SciFi => "Sci-Fi",
            Genre::Horror => "Horror",
            Genre::Romance => "Romance",
        }
    }

    /// Section tag in the training corpus.
    pub fn corpus_tag(self) -> &'static str {
        match self {
            Genre::Fantasy => "fantasy",
            Genre::Mystery => "mystery",
            Genre::SciFi => "scifi",
            Genre::Horror => "horror",
            Genre::Romance => "romance",
        }
    }

    /// Next genre in selector order, wrapping.
    pub fn next(self) -> Genre {
        let i = Genre::ALL.iter().position(|g| *g == self).unwrap_or(0);
        Genre::ALL[(i + 1) % Genre::ALL.len()]
    }

    /// Previous genre in selector order, wrapping.
    pub fn prev(self) -> Genre {
        let i = Genre::ALL.iter().position(|g| *g == self).unwrap_or(0);
        Genre::ALL[(i + Genre::ALL.len() - 1) % Genre::ALL.len()]
    }

    /// Parse a display label back into a genre (artifact round-trip).
    /// Tolerates case and the hyphen in "Sci-Fi".
    pub fn parse(s: &str) -> Option<Genre> {
        let norm: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Genre::ALL.into_iter().find(|g| g.corpus_tag() == norm)
            .or_else(|| {
                Genre::ALL.into_iter().find(|g| {
                    g.label()
                        .chars()
                        .filter(|c| c.is_ascii_alphanumeric())
                        .collect::<String>()
                        .to_ascii_lowercase()
                        == norm
                })
            })
    }
}

/// Visual theme of the session. Cosmetic only: never affects generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThemeName {
    #[default]
    Light,
    Dark,
    Solarized,
    Midnight,
    Pastel,
}

impl ThemeName {
    /// All themes, in selector order.
    pub const ALL: [ThemeName; 5] = [
        ThemeName::Light,
        ThemeName::Dark,
        ThemeName::Solarized,
        ThemeName::Midnight,
        ThemeName::Pastel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ThemeName::Light => "Light",
            ThemeName::Dark => "Dark",
            ThemeName::Solarized => "Solarized",
            ThemeName::Midnight => "Midnight",
            ThemeName::Pastel => "Pastel",
        }
    }

    pub fn next(self) -> ThemeName {
        let i = ThemeName::ALL.iter().position(|t| *t == self).unwrap_or(0);
        ThemeName::ALL[(i + 1) % ThemeName::ALL.len()]
    }

    pub fn prev(self) -> ThemeName {
        let i = ThemeName::ALL.iter().position(|t| *t == self).unwrap_or(0);
        ThemeName::ALL[(i + ThemeName::ALL.len() - 1) % ThemeName::ALL.len()]
    }
}

/// Output format for headless generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable pretty output.
    #[default]
    Human,
    /// Machine-readable JSON.
    Json,
}

// ============================================================================
// VALUE OBJECTS
// ============================================================================

/// One generated story variant. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedStory {
    /// 1-based position within its batch, in generation order.
    pub version: u32,
    /// The generated continuation (never includes the prompt).
    pub text: String,
}

/// A completed generation: the unit of display, saving, and headless output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryBatch {
    /// The prompt as captured when generation was triggered.
    pub prompt: String,
    pub genre: Genre,
    /// Exactly as many stories as were requested, versions 1..=N.
    pub stories: Vec<GeneratedStory>,
}

/// Generation parameters captured at the moment the user triggers a request.
/// Later edits to the session fields must not affect an in-flight request,
/// so this is an owned snapshot, not a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenRequest {
    /// Trimmed, guaranteed non-empty.
    pub prompt: String,
    pub genre: Genre,
    /// Within [MIN_VERSIONS, MAX_VERSIONS].
    pub version_count: u8,
}

/// Sampling parameters for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenParams {
    /// Softens or sharpens the next-token distribution.
    pub temperature: f32,
    /// Nucleus threshold: sample only from the smallest set of tokens
    /// whose cumulative probability reaches this value.
    pub top_p: f32,
    /// Hard cap on continuation length, in tokens.
    pub max_tokens: usize,
    /// Fixed seed for reproducible output. None samples a fresh one.
    pub seed: Option<u64>,
}

impl Default for GenParams {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_p: 0.95,
            max_tokens: 300,
            seed: None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
