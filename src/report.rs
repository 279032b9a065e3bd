//! Output formatting for headless generation.
//!
//! Pure functions: (StoryBatch, OutputFormat) -> String.
//! No I/O, no side effects.

use crate::types::{OutputFormat, StoryBatch};

/// Format a generation batch for output.
pub fn format_batch(batch: &StoryBatch, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_human(batch),
        OutputFormat::Json => format_json(batch),
    }
}

// ============================================================================
// HUMAN FORMAT
// ============================================================================

fn format_human(batch: &StoryBatch) -> String {
    let mut out = String::new();

    out.push_str("=== Generated Stories ===\n");
    out.push_str(&format!("Prompt: {}\n", batch.prompt));
    out.push_str(&format!("Genre:  {}\n", batch.genre.label()));
    out.push('\n');

    for story in &batch.stories {
        out.push_str(&format!("--- Version {} ---\n", story.version));
        out.push_str(&story.text);
        out.push_str("\n\n");
    }

    out.push_str(&format!(
        "=== Summary ===\nVersions: {}\n",
        batch.stories.len()
    ));
    out
}

// ============================================================================
// JSON FORMAT
// ============================================================================

fn format_json(batch: &StoryBatch) -> String {
    serde_json::to_string_pretty(batch).unwrap_or_else(|e| {
        // Should never happen with these types; fail loudly if it does.
        panic!("Failed to serialize batch to JSON: {}", e)
    })
}

// ============================================================================
// TESTS
// ============================================================================
