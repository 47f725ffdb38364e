//! Sentence-aligned chunking under a size budget.
//!
//! Summarization models accept a bounded amount of input, so documents are cut into chunks
//! before the map stage. Highlights:
//!
//! - Sentence alignment: a sentence ends at `.`, `!`, or `?` followed by whitespace and is never
//!   split across chunks.
//! - Greedy packing: sentences are appended while the running size stays within the budget;
//!   the next sentence that would overflow starts a new chunk.
//! - Oversized sentences: a sentence larger than the whole budget is emitted as a chunk of its
//!   own rather than being cut.
//! - Size counting: whitespace words by default (`CHUNK_BUDGET_UNIT=words`), or BPE tokens via
//!   `tiktoken-rs` (`CHUNK_BUDGET_UNIT=tokens`).

use crate::config::BudgetUnit;
use anyhow::Error as TokenizerError;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::CharIndices;
use std::sync::{Arc, Mutex, OnceLock};
use tiktoken_rs::{
    CoreBPE, cl100k_base, get_bpe_from_model, o200k_base, p50k_base, p50k_edit, r50k_base,
};

use super::types::ChunkingError;

/// Measures the size of a text segment in budget units.
pub type SizeCounter = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// Token counters keyed by the requested tokenizer name; BPE tables are loaded once per process.
static TOKEN_COUNTERS: OnceLock<Mutex<HashMap<String, SizeCounter>>> = OnceLock::new();

/// Chunk text into sentence-aligned segments using the requested budget unit.
///
/// `tokenizer` names the encoding (or model) used when `unit` is [`BudgetUnit::Tokens`]; it is
/// ignored for word budgets. Returns an empty vector when the input is all whitespace.
pub fn chunk_text(
    text: &str,
    budget: usize,
    unit: BudgetUnit,
    tokenizer: &str,
) -> Result<Vec<String>, ChunkingError> {
    let counter = match unit {
        BudgetUnit::Words => word_counter(),
        BudgetUnit::Tokens => shared_tiktoken_counter(tokenizer)?,
    };
    Ok(Chunker::new(budget, counter)?.chunk(text))
}

/// Greedy sentence packer.
#[derive(Clone)]
pub struct Chunker {
    budget: usize,
    counter: SizeCounter,
}

impl Chunker {
    /// Build a chunker that keeps chunks within `budget` as measured by `counter`.
    pub fn new(budget: usize, counter: SizeCounter) -> Result<Self, ChunkingError> {
        if budget == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        Ok(Self { budget, counter })
    }

    /// Build a chunker measuring size in whitespace-delimited words.
    pub fn with_word_budget(budget: usize) -> Result<Self, ChunkingError> {
        Self::new(budget, word_counter())
    }

    /// Lazily iterate over the chunks of `text`, in source order.
    pub fn chunks<'a>(&'a self, text: &'a str) -> Chunks<'a> {
        Chunks {
            sentences: sentences(text).peekable(),
            chunker: self,
        }
    }

    /// Materialize every chunk of `text`.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        self.chunks(text).collect()
    }

    fn size_of(&self, segment: &str) -> usize {
        self.counter.as_ref()(segment)
    }
}

/// Iterator produced by [`Chunker::chunks`].
pub struct Chunks<'a> {
    sentences: Peekable<Sentences<'a>>,
    chunker: &'a Chunker,
}

impl Iterator for Chunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.sentences.next()?;
        let mut current = String::from(first);
        let mut used = self.chunker.size_of(first);

        while let Some(&sentence) = self.sentences.peek() {
            let size = self.chunker.size_of(sentence);
            if used + size > self.chunker.budget {
                break;
            }
            current.push(' ');
            current.push_str(sentence);
            used += size;
            self.sentences.next();
        }

        Some(current)
    }
}

/// Split `text` into trimmed, non-empty sentences.
///
/// A sentence ends at `.`, `!`, or `?` immediately followed by whitespace; the terminator stays
/// with the sentence and the whitespace run is dropped. Trailing text without a terminator forms
/// the last sentence.
pub fn sentences(text: &str) -> Sentences<'_> {
    Sentences {
        text,
        chars: text.char_indices().peekable(),
        start: 0,
    }
}

/// Iterator produced by [`sentences`].
pub struct Sentences<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    start: usize,
}

impl<'a> Iterator for Sentences<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, ch)) = self.chars.next() {
            if !matches!(ch, '.' | '!' | '?') {
                continue;
            }
            let followed_by_space = self
                .chars
                .peek()
                .is_some_and(|(_, next)| next.is_whitespace());
            if !followed_by_space {
                continue;
            }

            let end = index + ch.len_utf8();
            let sentence = self.text[self.start..end].trim();
            while self
                .chars
                .peek()
                .is_some_and(|(_, next)| next.is_whitespace())
            {
                self.chars.next();
            }
            self.start = self
                .chars
                .peek()
                .map(|(offset, _)| *offset)
                .unwrap_or(self.text.len());

            if !sentence.is_empty() {
                return Some(sentence);
            }
        }

        let tail = self.text[self.start..].trim();
        self.start = self.text.len();
        if tail.is_empty() { None } else { Some(tail) }
    }
}

/// Count whitespace-delimited words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Counter measuring whitespace-delimited words.
pub fn word_counter() -> SizeCounter {
    Arc::new(count_words)
}

/// Return the cached token counter for `model`, building it on first use.
///
/// Failures are not cached.
pub fn shared_tiktoken_counter(model: &str) -> Result<SizeCounter, ChunkingError> {
    let counters = TOKEN_COUNTERS.get_or_init(Default::default);
    let key = model.trim();
    if let Some(counter) = lock_counters(counters).get(key) {
        return Ok(counter.clone());
    }

    // Built outside the lock; a concurrent first use may load the table twice.
    let counter = build_tiktoken_counter(key)?;
    Ok(lock_counters(counters)
        .entry(key.to_string())
        .or_insert(counter)
        .clone())
}

fn lock_counters(
    counters: &Mutex<HashMap<String, SizeCounter>>,
) -> std::sync::MutexGuard<'_, HashMap<String, SizeCounter>> {
    counters
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Build a token counter for an encoding name or model identifier.
///
/// Model lookups go through `tiktoken-rs`; unknown names fall back to `cl100k_base` with a
/// warning so that chunking keeps flowing.
pub fn build_tiktoken_counter(model: &str) -> Result<SizeCounter, ChunkingError> {
    let normalized = model.trim();
    let target = if normalized.is_empty() {
        "cl100k_base"
    } else {
        normalized
    };
    let encoding = resolve_encoding(target).map_err(|source| ChunkingError::Tokenizer {
        model: target.to_string(),
        source,
    })?;
    let encoding = Arc::new(encoding);

    Ok(Arc::new(move |segment: &str| {
        encoding.encode_ordinary(segment).len()
    }))
}

fn resolve_encoding(model: &str) -> Result<CoreBPE, TokenizerError> {
    if let Some(candidate) = encoding_from_name(model) {
        return candidate;
    }
    match get_bpe_from_model(model) {
        Ok(encoding) => Ok(encoding),
        Err(model_err) => {
            tracing::warn!(
                model,
                error = %model_err,
                "Unknown tokenizer; falling back to 'cl100k_base' for chunk budgets"
            );
            cl100k_base()
        }
    }
}

fn encoding_from_name(name: &str) -> Option<Result<CoreBPE, TokenizerError>> {
    match name {
        "cl100k_base" => Some(cl100k_base()),
        "o200k_base" => Some(o200k_base()),
        "p50k_base" => Some(p50k_base()),
        "p50k_edit" => Some(p50k_edit()),
        "r50k_base" | "gpt2" => Some(r50k_base()),
        _ => None,
    }
}
