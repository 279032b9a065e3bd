//! Saved story artifacts.
//!
//! A save writes one plain-text file per generation, named by timestamp,
//! holding the prompt, the genre, and every version in order. The format
//! round-trips: [`parse_batch_text`] recovers the batch from the file.
//!
//! Structure:
//! - Pure functions: filename/timestamp computation, format, parse
//! - Effect functions: save, load, list

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use walkdir::WalkDir;

use crate::types::{GeneratedStory, Genre, StoryBatch};

/// Artifact filenames look like `story_20260806-153012.txt`.
pub const ARTIFACT_PREFIX: &str = "story_";
pub const ARTIFACT_EXT: &str = "txt";

// ============================================================================
// PURE FUNCTIONS (Computations)
// ============================================================================

/// Default directory for saved stories.
pub fn default_story_dir() -> PathBuf {
    dirs::document_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storyloom")
}

/// Filename for an artifact saved at `now` (seconds since the Unix epoch).
///
/// Second granularity only: two saves within the same second collide and
/// the later one wins.
pub fn artifact_filename(now_secs: u64) -> String {
    format!("{}{}.{}", ARTIFACT_PREFIX, timestamp_slug(now_secs), ARTIFACT_EXT)
}

/// `YYYYMMDD-HHMMSS` in UTC.
pub fn timestamp_slug(secs: u64) -> String {
    let days = (secs / 86_400) as i64;
    let (year, month, day) = civil_from_days(days);
    let rem = secs % 86_400;
    format!(
        "{:04}{:02}{:02}-{:02}{:02}{:02}",
        year,
        month,
        day,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

/// Gregorian date for a day count since 1970-01-01 (Hinnant's algorithm).
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe as i64 + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Render a batch in the on-disk artifact format.
pub fn format_batch_text(batch: &StoryBatch) -> String {
    let mut out = String::new();
    out.push_str(&format!("Prompt: {}\n", batch.prompt));
    out.push_str(&format!("Genre: {}\n\n", batch.genre.label()));

    let blocks: Vec<String> = batch
        .stories
        .iter()
        .map(|s| format!("--- Version {} ---\n{}", s.version, s.text))
        .collect();
    out.push_str(&blocks.join("\n\n"));
    out.push('\n');
    out
}

/// Parse artifact text back into a batch.
///
/// # Errors
/// `InvalidData` when the header or any version block is malformed.
pub fn parse_batch_text(text: &str) -> io::Result<StoryBatch> {
    let mut lines = text.lines();

    let prompt = lines
        .next()
        .and_then(|l| l.strip_prefix("Prompt: "))
        .ok_or_else(|| invalid("missing Prompt header"))?
        .to_string();
    let genre_label = lines
        .next()
        .and_then(|l| l.strip_prefix("Genre: "))
        .ok_or_else(|| invalid("missing Genre header"))?;
    let genre = Genre::parse(genre_label)
        .ok_or_else(|| invalid(&format!("unknown genre {genre_label:?}")))?;

    let mut stories = Vec::new();
    let mut current: Option<(u32, Vec<&str>)> = None;
    for line in lines {
        if let Some(version) = parse_version_header(line) {
            if let Some((v, body)) = current.take() {
                stories.push(assemble_story(v, body));
            }
            current = Some((version, Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
        // Lines before the first version header are the blank separator.
    }
    if let Some((v, body)) = current.take() {
        stories.push(assemble_story(v, body));
    }

    if stories.is_empty() {
        return Err(invalid("no version blocks"));
    }
    Ok(StoryBatch { prompt, genre, stories })
}

/// `--- Version 3 ---` yields 3.
fn parse_version_header(line: &str) -> Option<u32> {
    line.trim()
        .strip_prefix("--- Version ")?
        .strip_suffix(" ---")?
        .parse()
        .ok()
}

fn assemble_story(version: u32, body: Vec<&str>) -> GeneratedStory {
    GeneratedStory {
        version,
        text: body.join("\n").trim().to_string(),
    }
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("invalid artifact: {msg}"))
}

// ============================================================================
// EFFECT FUNCTIONS (Actions)
// ============================================================================

/// A successfully written artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Write a batch to `dir`, creating it if needed.
///
/// # Errors
/// Any filesystem failure. The caller's state is untouched either way.
pub fn save_batch(batch: &StoryBatch, dir: &Path) -> io::Result<SavedArtifact> {
    fs::create_dir_all(dir)?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let path = dir.join(artifact_filename(now));
    let text = format_batch_text(batch);
    fs::write(&path, &text)?;
    Ok(SavedArtifact {
        path,
        bytes: text.len() as u64,
    })
}

/// Read a batch back from an artifact file.
pub fn load_artifact(path: &Path) -> io::Result<StoryBatch> {
    parse_batch_text(&fs::read_to_string(path)?)
}

/// A saved artifact found on disk.
#[derive(Debug, Clone)]
pub struct ArtifactEntry {
    pub path: PathBuf,
    pub bytes: u64,
    /// None when the file no longer parses as an artifact.
    pub batch: Option<StoryBatch>,
}

/// Find every artifact under `dir`, recursively, sorted by filename
/// (timestamp names make that chronological).
pub fn list_artifacts(dir: &Path) -> io::Result<Vec<ArtifactEntry>> {
    let mut entries = Vec::new();
    if !dir.exists() {
        return Ok(entries);
    }
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.starts_with(ARTIFACT_PREFIX) || !name.ends_with(&format!(".{ARTIFACT_EXT}")) {
            continue;
        }
        let bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        let batch = load_artifact(entry.path()).ok();
        entries.push(ArtifactEntry {
            path: entry.path().to_path_buf(),
            bytes,
            batch,
        });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_batch() -> StoryBatch {
        StoryBatch {
            prompt: "Once upon a time in a faraway kingdom...".into(),
            genre: Genre::SciFi,
            stories: vec![
                GeneratedStory {
                    version: 1,
                    text: "The station woke him two years early.".into(),
                },
                GeneratedStory {
                    version: 2,
                    text: "Orbital command had gone quiet.\nThe silence had edges.".into(),
                },
            ],
        }
    }

    // -- Pure function tests --

    #[test]
    fn slug_at_epoch() {
        assert_eq!(timestamp_slug(0), "19700101-000000");
    }

    #[test]
    fn slug_handles_leap_day() {
        // 2000-02-29T12:34:56Z
        assert_eq!(timestamp_slug(951_827_696), "20000229-123456");
    }

    #[test]
    fn filename_has_prefix_and_extension() {
        let name = artifact_filename(0);
        assert_eq!(name, "story_19700101-000000.txt");
    }

    #[test]
    fn format_matches_expected_layout() {
        let text = format_batch_text(&sample_batch());
        assert!(text.starts_with("Prompt: Once upon a time"));
        assert!(text.contains("Genre: Sci-Fi\n"));
        assert!(text.contains("--- Version 1 ---\nThe station"));
        assert!(text.contains("--- Version 2 ---\nOrbital"));
    }

    #[test]
    fn format_then_parse_round_trips() {
        let batch = sample_batch();
        let parsed = parse_batch_text(&format_batch_text(&batch)).unwrap();
        assert_eq!(parsed, batch);
    }

    #[test]
    fn parse_preserves_version_order() {
        let batch = sample_batch();
        let parsed = parse_batch_text(&format_batch_text(&batch)).unwrap();
        let versions: Vec<u32> = parsed.stories.iter().map(|s| s.version).collect();
        assert_eq!(versions, vec![1, 2]);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_batch_text("not an artifact").is_err());
        assert!(parse_batch_text("Prompt: x\nGenre: Nope\n\n--- Version 1 ---\nhi").is_err());
        assert!(parse_batch_text("Prompt: x\nGenre: Horror\n\nno versions here").is_err());
    }

    #[test]
    fn version_header_parsing() {
        assert_eq!(parse_version_header("--- Version 3 ---"), Some(3));
        assert_eq!(parse_version_header("--- Version x ---"), None);
        assert_eq!(parse_version_header("Version 3"), None);
    }

    #[test]
    fn default_story_dir_mentions_app() {
        assert!(default_story_dir().to_string_lossy().contains("storyloom"));
    }

    // -- Effect function tests --

    #[test]
    fn save_writes_a_parseable_file() {
        let temp = TempDir::new().unwrap();
        let saved = save_batch(&sample_batch(), temp.path()).unwrap();

        assert!(saved.path.exists());
        assert!(saved.bytes > 0);
        let name = saved.path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(ARTIFACT_PREFIX));

        let loaded = load_artifact(&saved.path).unwrap();
        assert_eq!(loaded, sample_batch());
    }

    #[test]
    fn save_creates_missing_directories() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        let saved = save_batch(&sample_batch(), &nested).unwrap();
        assert!(saved.path.starts_with(&nested));
    }

    #[test]
    fn list_finds_nested_artifacts_and_skips_strangers() {
        let temp = TempDir::new().unwrap();
        let sub = temp.path().join("older");
        save_batch(&sample_batch(), temp.path()).unwrap();
        save_batch(&sample_batch(), &sub).unwrap();
        fs::write(temp.path().join("notes.txt"), "not an artifact").unwrap();

        let entries = list_artifacts(temp.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.batch.is_some()));
    }

    #[test]
    fn list_of_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let entries = list_artifacts(&temp.path().join("nowhere")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn corrupt_artifact_still_listed_without_batch() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("story_garbage.txt"), "scrambled").unwrap();
        let entries = list_artifacts(temp.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].batch.is_none());
    }
}
