//! Text-art assets for the TUI screens.
//!
//! Four banners are loaded by path from an assets directory. A missing or
//! unreadable file is never fatal: the built-in fallback is used and a
//! warning is collected for the caller to surface before the TUI starts.

use std::fs;
use std::path::Path;

// ============================================================================
// FILENAMES & FALLBACKS
// ============================================================================

/// Expected filenames inside the assets directory.
pub const WELCOME_FILE: &str = "welcome.txt";
pub const LOADING_FILE: &str = "loading.txt";
pub const BACKDROP_FILE: &str = "backdrop.txt";
pub const FAREWELL_FILE: &str = "farewell.txt";

const FALLBACK_WELCOME: &str = r"
  _  _  _
 (_)(_)(_)   S T O R Y L O O M
";

const FALLBACK_LOADING: &str = "
   . o O o .
  the loom is turning . . .
";

const FALLBACK_BACKDROP: &str = "
  ~ once upon a terminal ~
";

const FALLBACK_FAREWELL: &str = "
  * the end *
";

// ============================================================================
// ASSET SET
// ============================================================================

/// The four banners, plus warnings about anything that had to fall back.
#[derive(Debug, Clone)]
pub struct AssetSet {
    pub welcome: String,
    pub loading: String,
    pub backdrop: String,
    pub farewell: String,
    /// One human-readable line per asset that fell back.
    pub warnings: Vec<String>,
}

impl AssetSet {
    /// Built-in banners only, no filesystem access. Used when no assets
    /// directory is configured, and by render tests.
    pub fn fallback() -> AssetSet {
        AssetSet {
            welcome: FALLBACK_WELCOME.to_string(),
            loading: FALLBACK_LOADING.to_string(),
            backdrop: FALLBACK_BACKDROP.to_string(),
            farewell: FALLBACK_FAREWELL.to_string(),
            warnings: Vec::new(),
        }
    }

    /// Load all four banners from `dir`, falling back per file.
    pub fn load(dir: &Path) -> AssetSet {
        let mut warnings = Vec::new();
        let mut load_one = |file: &str, fallback: &str| -> String {
            let path = dir.join(file);
            match fs::read_to_string(&path) {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    warnings.push(format!("{} is empty, using built-in art", path.display()));
                    fallback.to_string()
                }
                Err(e) => {
                    warnings.push(format!("{}: {}, using built-in art", path.display(), e));
                    fallback.to_string()
                }
            }
        };

        let welcome = load_one(WELCOME_FILE, FALLBACK_WELCOME);
        let loading = load_one(LOADING_FILE, FALLBACK_LOADING);
        let backdrop = load_one(BACKDROP_FILE, FALLBACK_BACKDROP);
        let farewell = load_one(FAREWELL_FILE, FALLBACK_FAREWELL);

        AssetSet {
            welcome,
            loading,
            backdrop,
            farewell,
            warnings,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
