//! storyloom CLI
//!
//! Themed interactive story generation in the terminal, with a headless
//! mode for scripts.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use humansize::{BINARY, format_size};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;

use storyloom::artifact::{default_story_dir, list_artifacts, save_batch};
use storyloom::model::{derive_seed, init_story_model, story_model};
use storyloom::report::format_batch;
use storyloom::tui::run::RunOptions;
use storyloom::tui::state::SessionOptions;
use storyloom::types::{
    GenParams, GeneratedStory, Genre, MAX_VERSIONS, MIN_VERSIONS, OutputFormat, StoryBatch,
    ThemeName,
};

#[derive(Parser)]
#[command(name = "storyloom")]
#[command(about = "Weave themed short stories from a prompt, in your terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive story studio
    Run {
        /// Visual theme
        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,

        /// Starting genre
        #[arg(long, value_enum)]
        genre: Option<GenreArg>,

        /// Starting number of versions per generation (1-5)
        #[arg(long)]
        versions: Option<u8>,

        /// Starting prompt text
        #[arg(long)]
        prompt: Option<String>,

        /// Directory with the banner art files
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Train the model from this corpus instead of the built-in one
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Where saved stories go (default: the storyloom documents folder)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Skip the welcome intro
        #[arg(long)]
        skip_intro: bool,
    },

    /// Generate stories without the TUI
    Generate {
        /// The story prompt
        #[arg(long)]
        prompt: String,

        /// Genre to generate in
        #[arg(long, value_enum, default_value = "fantasy")]
        genre: GenreArg,

        /// Number of versions (1-5)
        #[arg(long, default_value_t = 2)]
        versions: u8,

        /// Fixed seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Also save the batch as an artifact
        #[arg(long)]
        save: bool,

        /// Where saved stories go (default: the storyloom documents folder)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Train the model from this corpus instead of the built-in one
        #[arg(long)]
        corpus: Option<PathBuf>,
    },

    /// List saved story artifacts
    List {
        /// Directory to look in (default: the storyloom documents folder)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum GenreArg {
    Fantasy,
    Mystery,
    SciFi,
    Horror,
    Romance,
}

impl From<GenreArg> for Genre {
    fn from(arg: GenreArg) -> Self {
        match arg {
            GenreArg::Fantasy => Genre::Fantasy,
            GenreArg::Mystery => Genre::Mystery,
            GenreArg::SciFi => Genre::SciFi,
            GenreArg::Horror => Genre::Horror,
            GenreArg::Romance => Genre::Romance,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
    Solarized,
    Midnight,
    Pastel,
}

impl From<ThemeArg> for ThemeName {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => ThemeName::Light,
            ThemeArg::Dark => ThemeName::Dark,
            ThemeArg::Solarized => ThemeName::Solarized,
            ThemeArg::Midnight => ThemeName::Midnight,
            ThemeArg::Pastel => ThemeName::Pastel,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            theme,
            genre,
            versions,
            prompt,
            assets,
            corpus,
            out_dir,
            skip_intro,
        } => cmd_run(theme, genre, versions, prompt, assets, corpus, out_dir, skip_intro),
        Commands::Generate {
            prompt,
            genre,
            versions,
            seed,
            format,
            save,
            out_dir,
            corpus,
        } => cmd_generate(prompt, genre.into(), versions, seed, format.into(), save, out_dir, corpus),
        Commands::List { out_dir } => cmd_list(out_dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// MODEL SETUP
// ============================================================================

/// Load the model before anything depends on it: from a custom corpus if
/// given, otherwise the built-in one. This is the process's single
/// model-loading moment; later callers share the instance.
fn warm_model(corpus: Option<PathBuf>) -> Result<(), String> {
    if let Some(path) = corpus {
        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("Cannot read corpus {}: {}", path.display(), e))?;
        if !init_story_model(&text) {
            eprintln!("Note: model already loaded, ignoring --corpus");
        }
    }
    let model = story_model();
    for genre in Genre::ALL {
        if !model.has_genre(genre) {
            eprintln!(
                "Note: corpus has no [{}] section, {} generation will fail",
                genre.corpus_tag(),
                genre.label()
            );
        }
    }
    Ok(())
}

// ============================================================================
// PROGRESS HELPERS
// ============================================================================

fn progress_bar(total: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    theme: Option<ThemeArg>,
    genre: Option<GenreArg>,
    versions: Option<u8>,
    prompt: Option<String>,
    assets: Option<PathBuf>,
    corpus: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    skip_intro: bool,
) -> Result<(), String> {
    warm_model(corpus)?;

    let mut session = SessionOptions::default();
    if let Some(theme) = theme {
        session.theme = theme.into();
    }
    if let Some(genre) = genre {
        session.genre = genre.into();
    }
    if let Some(versions) = versions {
        session.version_count = check_versions(versions)?;
    }
    if let Some(prompt) = prompt {
        session.prompt_text = prompt;
    }
    session.skip_intro = skip_intro;

    let opts = RunOptions {
        session,
        assets_dir: assets,
        out_dir: out_dir.unwrap_or_else(default_story_dir),
    };

    storyloom::tui::run::run(opts).map_err(|e| e.to_string())
}

#[allow(clippy::too_many_arguments)]
fn cmd_generate(
    prompt: String,
    genre: Genre,
    versions: u8,
    seed: Option<u64>,
    format: OutputFormat,
    save: bool,
    out_dir: Option<PathBuf>,
    corpus: Option<PathBuf>,
) -> Result<(), String> {
    warm_model(corpus)?;
    let versions = check_versions(versions)?;
    let model = story_model();
    let params = GenParams { seed, ..GenParams::default() };
    let base_seed = seed.unwrap_or_else(rand::random);

    // Keep stdout clean for JSON; progress is for humans only.
    let show_progress = format == OutputFormat::Human;

    let results: Result<Vec<GeneratedStory>, _> = if show_progress {
        let pb = progress_bar(versions as u64, "Weaving...");
        let collected = (0..versions as usize)
            .into_par_iter()
            .progress_with(pb.clone())
            .map(|i| {
                let version = i as u32 + 1;
                model
                    .generate_version(&prompt, genre, &params, derive_seed(base_seed, version))
                    .map(|text| GeneratedStory { version, text })
            })
            .collect();
        pb.finish_and_clear();
        collected
    } else {
        (0..versions as usize)
            .into_par_iter()
            .map(|i| {
                let version = i as u32 + 1;
                model
                    .generate_version(&prompt, genre, &params, derive_seed(base_seed, version))
                    .map(|text| GeneratedStory { version, text })
            })
            .collect()
    };

    let batch = StoryBatch {
        prompt,
        genre,
        stories: results.map_err(|e| e.to_string())?,
    };

    print!("{}", format_batch(&batch, format));

    if save {
        let dir = out_dir.unwrap_or_else(default_story_dir);
        let saved = save_batch(&batch, &dir).map_err(|e| e.to_string())?;
        eprintln!(
            "Saved: {} ({})",
            saved.path.display(),
            format_size(saved.bytes, BINARY)
        );
    }

    Ok(())
}

fn cmd_list(out_dir: Option<PathBuf>) -> Result<(), String> {
    let dir = out_dir.unwrap_or_else(default_story_dir);
    let entries = list_artifacts(&dir).map_err(|e| e.to_string())?;

    if entries.is_empty() {
        println!("No saved stories in {}.", dir.display());
        return Ok(());
    }

    println!("Saved stories in {}:", dir.display());
    println!();

    let mut total_bytes = 0u64;
    for entry in &entries {
        total_bytes += entry.bytes;
        let name = entry
            .path
            .strip_prefix(&dir)
            .unwrap_or(&entry.path)
            .display();
        match &entry.batch {
            Some(batch) => println!(
                "  {}  {} version{}, {}  ({})",
                name,
                batch.stories.len(),
                if batch.stories.len() == 1 { "" } else { "s" },
                batch.genre.label(),
                format_size(entry.bytes, BINARY)
            ),
            None => println!("  {}  (unreadable)  ({})", name, format_size(entry.bytes, BINARY)),
        }
    }

    println!();
    println!(
        "Total: {} file{}, {}",
        entries.len(),
        if entries.len() == 1 { "" } else { "s" },
        format_size(total_bytes, BINARY)
    );

    Ok(())
}

/// Shared bounds check with a friendly message.
fn check_versions(versions: u8) -> Result<u8, String> {
    if (MIN_VERSIONS..=MAX_VERSIONS).contains(&versions) {
        Ok(versions)
    } else {
        Err(format!(
            "--versions must be between {} and {}, got {}",
            MIN_VERSIONS, MAX_VERSIONS, versions
        ))
    }
}
