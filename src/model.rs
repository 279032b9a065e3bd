//! The story model: a tagged n-gram chain standing in for a pretrained
//! text-generation network.
//!
//! Training builds per-genre transition tables from a tagged corpus at load
//! time (the "weights"). Generation walks a table with temperature plus
//! nucleus sampling, seeded from the tail of the user's prompt. Output is
//! deterministic for a fixed seed, which is what the tests rely on.
//!
//! The trained model is immutable. One instance is shared process-wide via
//! [`story_model`] and is safe to use from any number of worker threads.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use thiserror::Error;

use crate::types::{GenParams, GeneratedStory, Genre, MAX_VERSIONS, MIN_VERSIONS};

/// Corpus baked into the binary; used unless a custom corpus is installed.
pub const DEFAULT_CORPUS: &str = include_str!("../assets/corpus.txt");

/// Chain state start marker (two of these pad the front of every sentence).
const START: &str = "<s>";
/// Sentence end marker.
const END: &str = "</s>";

/// Punctuation split into standalone tokens. Apostrophes stay inside words.
const PUNCTUATION: &[char] = &['.', '!', '?', ',', ';', ':'];
const SENTENCE_ENDERS: &[char] = &['.', '!', '?'];

// ============================================================================
// ERRORS
// ============================================================================

/// Ways a generation request can fail. All recoverable: the session returns
/// to its configuration screen with the message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("requested {0} versions, supported range is {MIN_VERSIONS}-{MAX_VERSIONS}")]
    BadVersionCount(u8),
    #[error("no training data for genre {0}")]
    NoData(String),
    #[error("model produced no output")]
    Empty,
    #[error("generation timed out")]
    TimedOut,
}

// ============================================================================
// MODEL
// ============================================================================

/// Transition table: two-token state to weighted next-token choices.
type Table = HashMap<(String, String), Vec<(String, u32)>>;

/// A trained story model. Cheap to share, impossible to mutate.
#[derive(Debug, Default)]
pub struct StoryModel {
    /// One table per corpus tag (genre).
    tables: HashMap<String, Table>,
}

impl StoryModel {
    /// Train a model from a tagged corpus.
    ///
    /// Lines of the form `[tag]` open a section; every following line is
    /// tokenized, split into sentences, and folded into that tag's table.
    /// Lines before the first tag are ignored.
    pub fn train(corpus: &str) -> StoryModel {
        let mut tables: HashMap<String, Table> = HashMap::new();
        let mut current: Option<String> = None;

        for line in corpus.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed.len() > 2 {
                current = Some(trimmed[1..trimmed.len() - 1].to_ascii_lowercase());
                continue;
            }
            let Some(tag) = &current else { continue };
            let table = tables.entry(tag.clone()).or_default();

            for sentence in split_sentences(&tokenize(trimmed)) {
                let mut padded = vec![START.to_string(), START.to_string()];
                padded.extend(sentence);
                padded.push(END.to_string());
                for window in padded.windows(3) {
                    let key = (window[0].clone(), window[1].clone());
                    let next = window[2].clone();
                    let entries = table.entry(key).or_default();
                    match entries.iter_mut().find(|(tok, _)| *tok == next) {
                        Some(entry) => entry.1 += 1,
                        None => entries.push((next, 1)),
                    }
                }
            }
        }

        StoryModel { tables }
    }

    /// Whether the model has any data for a genre.
    pub fn has_genre(&self, genre: Genre) -> bool {
        self.tables.contains_key(genre.corpus_tag())
    }

    /// Generate `count` story continuations for a prompt.
    ///
    /// Versions are sampled in parallel from seeds derived per version, so
    /// the batch is both parallel and reproducible. Returns exactly `count`
    /// stories in version order, or the first error: no partial batches.
    pub fn generate(
        &self,
        prompt: &str,
        genre: Genre,
        count: u8,
        params: &GenParams,
    ) -> Result<Vec<GeneratedStory>, GenerationError> {
        if !(MIN_VERSIONS..=MAX_VERSIONS).contains(&count) {
            return Err(GenerationError::BadVersionCount(count));
        }
        let base_seed = params.seed.unwrap_or_else(rand::random);

        (0..count as usize)
            .into_par_iter()
            .map(|i| {
                let version = i as u32 + 1;
                let text =
                    self.generate_version(prompt, genre, params, derive_seed(base_seed, version))?;
                Ok(GeneratedStory { version, text })
            })
            .collect()
    }

    /// Generate a single continuation with an explicit seed.
    pub fn generate_version(
        &self,
        prompt: &str,
        genre: Genre,
        params: &GenParams,
        seed: u64,
    ) -> Result<String, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        let table = self
            .tables
            .get(genre.corpus_tag())
            .ok_or_else(|| GenerationError::NoData(genre.label().to_string()))?;

        let mut rng = StdRng::seed_from_u64(seed);
        walk(table, prompt, params, &mut rng)
    }
}

/// Mix a per-version seed out of the batch seed. Plain counter offsets would
/// correlate adjacent StdRng streams, so spread them first.
pub fn derive_seed(base: u64, version: u32) -> u64 {
    let mut x = base ^ (version as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x
}

// ============================================================================
// PROCESS-WIDE INSTANCE
// ============================================================================

static MODEL: OnceLock<StoryModel> = OnceLock::new();

/// The shared model, trained from the default corpus on first use.
pub fn story_model() -> &'static StoryModel {
    MODEL.get_or_init(|| StoryModel::train(DEFAULT_CORPUS))
}

/// Install the shared model from a custom corpus.
///
/// Must run before the first [`story_model`] call takes effect; returns
/// false (and changes nothing) if the model was already initialized.
pub fn init_story_model(corpus: &str) -> bool {
    let mut fresh = false;
    MODEL.get_or_init(|| {
        fresh = true;
        StoryModel::train(corpus)
    });
    fresh
}

// ============================================================================
// GENERATION WALK
// ============================================================================

/// Walk the chain from the prompt tail until the token budget runs out.
fn walk(
    table: &Table,
    prompt: &str,
    params: &GenParams,
    rng: &mut StdRng,
) -> Result<String, GenerationError> {
    let fresh = (START.to_string(), START.to_string());
    let mut state = seed_state(table, &tokenize(prompt));
    let mut out: Vec<String> = Vec::new();
    let mut last_sentence_end = 0;

    // Iteration cap guards against tables that emit END forever.
    for _ in 0..params.max_tokens * 3 {
        if out.len() >= params.max_tokens {
            break;
        }
        let Some(options) = table.get(&state) else {
            // Dead end mid-walk: restart at a sentence boundary once.
            if state == fresh {
                break;
            }
            state = fresh.clone();
            continue;
        };
        let Some(next) = sample_next(options, params, rng) else {
            break;
        };
        if next == END {
            last_sentence_end = out.len();
            state = fresh.clone();
            continue;
        }
        state = (state.1.clone(), next.clone());
        out.push(next);
    }

    if out.is_empty() {
        return Err(GenerationError::Empty);
    }
    // When the budget cut a sentence short, end at the last complete one.
    if out.len() >= params.max_tokens && last_sentence_end > 0 {
        out.truncate(last_sentence_end);
    }
    Ok(reassemble(&out))
}

/// Choose the starting state from the prompt's last tokens, backing off to a
/// sentence start when the prompt tail never occurs in the table.
fn seed_state(table: &Table, prompt_tokens: &[String]) -> (String, String) {
    if prompt_tokens.len() >= 2 {
        let key = (
            prompt_tokens[prompt_tokens.len() - 2].clone(),
            prompt_tokens[prompt_tokens.len() - 1].clone(),
        );
        if table.contains_key(&key) {
            return key;
        }
    }
    if let Some(last) = prompt_tokens.last() {
        let key = (START.to_string(), last.clone());
        if table.contains_key(&key) {
            return key;
        }
    }
    (START.to_string(), START.to_string())
}

/// Temperature plus nucleus sampling over a weighted option list.
fn sample_next(options: &[(String, u32)], params: &GenParams, rng: &mut StdRng) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let total: u32 = options.iter().map(|(_, c)| c).sum();
    if total == 0 {
        return None;
    }

    // Counts to probabilities, sharpened by 1/temperature.
    let t = f64::from(params.temperature.max(1e-3));
    let mut probs: Vec<(usize, f64)> = options
        .iter()
        .enumerate()
        .map(|(i, (_, c))| (i, (f64::from(*c) / f64::from(total)).powf(1.0 / t)))
        .collect();
    let z: f64 = probs.iter().map(|(_, p)| p).sum();
    if z <= 0.0 {
        return None;
    }
    for (_, p) in probs.iter_mut() {
        *p /= z;
    }

    // Nucleus: keep the smallest high-probability prefix reaching top_p.
    // Always keeps at least one option.
    probs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    let mut kept = Vec::with_capacity(probs.len());
    let mut cumulative = 0.0;
    for (i, p) in probs {
        kept.push((i, p));
        cumulative += p;
        if cumulative >= f64::from(params.top_p) {
            break;
        }
    }

    let dist = WeightedIndex::new(kept.iter().map(|(_, p)| *p)).ok()?;
    let (index, _) = kept[dist.sample(rng)];
    Some(options[index].0.clone())
}

// ============================================================================
// TOKENIZATION
// ============================================================================

/// Split text on whitespace, peeling punctuation into standalone tokens.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text.split_whitespace() {
        let mut core = word;
        let mut lead = Vec::new();
        while let Some(c) = core.chars().next() {
            if PUNCTUATION.contains(&c) {
                lead.push(c.to_string());
                core = &core[c.len_utf8()..];
            } else {
                break;
            }
        }
        let mut tail = Vec::new();
        while let Some(c) = core.chars().last() {
            if PUNCTUATION.contains(&c) {
                tail.insert(0, c.to_string());
                core = &core[..core.len() - c.len_utf8()];
            } else {
                break;
            }
        }
        tokens.extend(lead);
        if !core.is_empty() {
            tokens.push(core.to_string());
        }
        tokens.extend(tail);
    }
    tokens
}

/// Group a token stream into sentences at sentence-ending punctuation.
/// Trailing tokens without an ender still form a sentence.
fn split_sentences(tokens: &[String]) -> Vec<Vec<String>> {
    let mut sentences = Vec::new();
    let mut current = Vec::new();
    for tok in tokens {
        current.push(tok.clone());
        let is_ender = tok.len() == 1 && SENTENCE_ENDERS.contains(&tok.chars().next().unwrap());
        if is_ender {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

/// Join tokens back into text, attaching punctuation to the previous word.
fn reassemble(tokens: &[String]) -> String {
    let mut text = String::new();
    for (i, tok) in tokens.iter().enumerate() {
        let is_punct = tok.len() == 1 && PUNCTUATION.contains(&tok.chars().next().unwrap());
        if i > 0 && !is_punct {
            text.push(' ');
        }
        text.push_str(tok);
    }
    text
}

// ============================================================================
// TESTS
// ============================================================================
