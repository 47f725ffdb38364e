//! Map-then-reduce summarization over document chunks.
//!
//! The map stage summarizes every chunk in order and keeps going when a chunk fails; each
//! failure becomes a warning instead of aborting the request. The reduce stage either returns
//! the joined chunk summaries as-is or submits them, truncated to a character budget, for one
//! more pass.

use crate::config::SummaryMode;
use crate::summarization::{
    GenerationParams, SummarizationClient, SummarizationClientError, SummarizationRequest,
    truncate_words,
};

use super::chunking::count_words;
use super::types::{Aggregate, ChunkFailure, ChunkOutcome, ChunkWarning};

/// Summarize each chunk sequentially, capturing per-chunk failures.
///
/// Each chunk is capped to `input_max_words` words before submission. The returned outcomes
/// are in chunk order and there is exactly one per chunk.
pub async fn summarize_chunks(
    client: &dyn SummarizationClient,
    model: &str,
    chunks: &[String],
    params: GenerationParams,
    input_max_words: usize,
) -> Vec<ChunkOutcome> {
    let mut outcomes = Vec::with_capacity(chunks.len());

    for (index, chunk) in chunks.iter().enumerate() {
        let words = count_words(chunk);
        let text = truncate_words(chunk, input_max_words);
        if words > input_max_words {
            tracing::debug!(
                chunk = index,
                words,
                cap = input_max_words,
                "Capped chunk before submission"
            );
        }

        let result = client
            .summarize(SummarizationRequest {
                model: model.to_string(),
                text,
                params,
            })
            .await
            .map_err(|error| {
                tracing::warn!(chunk = index, %error, "Chunk summarization failed; skipping");
                ChunkFailure {
                    message: error.to_string(),
                }
            });

        outcomes.push(ChunkOutcome {
            index,
            words,
            result,
        });
    }

    outcomes
}

/// Join successful chunk summaries in order and collect warnings for the failures.
pub fn aggregate(outcomes: &[ChunkOutcome]) -> Aggregate {
    let mut summaries = Vec::with_capacity(outcomes.len());
    let mut warnings = Vec::new();

    for outcome in outcomes {
        match &outcome.result {
            Ok(summary) => {
                let trimmed = summary.trim();
                if !trimmed.is_empty() {
                    summaries.push(trimmed);
                }
            }
            Err(failure) => warnings.push(ChunkWarning {
                chunk_index: outcome.index,
                message: format!(
                    "Skipped chunk {} of {}: {}",
                    outcome.index + 1,
                    outcomes.len(),
                    failure.message
                ),
            }),
        }
    }

    Aggregate {
        succeeded: outcomes.len() - warnings.len(),
        combined: summaries.join(" "),
        warnings,
    }
}

/// Produce the final summary from the aggregated chunk summaries.
///
/// Single-stage returns the combined text. Two-stage truncates it to `max_chars` characters
/// and summarizes it once more; an empty combined text skips the model call. Errors from the
/// final pass are returned to the caller unchanged.
pub async fn reduce(
    client: &dyn SummarizationClient,
    model: &str,
    aggregate: &Aggregate,
    mode: SummaryMode,
    params: GenerationParams,
    max_chars: usize,
) -> Result<String, SummarizationClientError> {
    match mode {
        SummaryMode::SingleStage => Ok(aggregate.combined.clone()),
        SummaryMode::TwoStage if aggregate.combined.is_empty() => Ok(String::new()),
        SummaryMode::TwoStage => {
            let text = truncate_chars(&aggregate.combined, max_chars);
            tracing::debug!(
                combined_chars = aggregate.combined.chars().count(),
                submitted_chars = text.chars().count(),
                "Running final summarization pass"
            );
            client
                .summarize(SummarizationRequest {
                    model: model.to_string(),
                    text: text.to_string(),
                    params,
                })
                .await
        }
    }
}

/// Return the longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}
