//! Core data types and error definitions for the summarization pipeline.

use crate::config::SummaryMode;
use crate::extraction::ExtractionError;
use crate::summarization::SummarizationClientError;
use anyhow::Error as TokenizerError;
use serde::Serialize;
use thiserror::Error;

/// Errors produced while turning raw text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// The request configured an impossible budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Tokenizer resources were unavailable for the configured encoding.
    #[error("failed to initialize tokenizer '{model}': {source}")]
    Tokenizer {
        /// Encoding or model we attempted to load.
        model: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: TokenizerError,
    },
}

/// Errors that abort a summarization request.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The uploaded document could not be turned into text.
    #[error("Failed to extract document text: {0}")]
    Extraction(#[from] ExtractionError),
    /// Chunking step failed to segment the document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// The summarization client could not be constructed.
    #[error("Summarization client unavailable: {0}")]
    Client(#[source] SummarizationClientError),
    /// The final re-summarization pass failed.
    #[error("Failed to produce final summary: {0}")]
    FinalSummary(#[source] SummarizationClientError),
    /// Blocking extraction task was cancelled or panicked.
    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Per-request knobs; unset values fall back to configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryOptions {
    /// Aggregation mode override.
    pub mode: Option<SummaryMode>,
    /// Chunk budget override, in the configured unit.
    pub chunk_size: Option<usize>,
    /// Whether to run the text cleaner.
    pub clean: Option<bool>,
}

/// Reason a single chunk produced no summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkFailure {
    /// Rendered error from the summarization client.
    pub message: String,
}

/// Result of summarizing one chunk during the map stage.
#[derive(Debug, Clone)]
pub struct ChunkOutcome {
    /// Position of the chunk in the document, starting at zero.
    pub index: usize,
    /// Word count of the chunk as produced by the chunker.
    pub words: usize,
    /// Summary text, or the reason the chunk was skipped.
    pub result: Result<String, ChunkFailure>,
}

/// Warning surfaced to the caller for a skipped chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkWarning {
    /// Position of the skipped chunk.
    pub chunk_index: usize,
    /// Human readable reason.
    pub message: String,
}

/// Successful summaries joined in order, plus warnings for the chunks that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    /// Space-joined chunk summaries.
    pub combined: String,
    /// Number of chunks that contributed a summary.
    pub succeeded: usize,
    /// One entry per skipped chunk, in chunk order.
    pub warnings: Vec<ChunkWarning>,
}

/// Completed summarization request.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryOutcome {
    /// Identifier assigned to this request, also attached to log lines.
    pub request_id: String,
    /// SHA-256 of the submitted document, hex encoded.
    pub document_digest: String,
    /// Aggregation mode that produced `summary`.
    pub mode: SummaryMode,
    /// Final summary shown to the user.
    pub summary: String,
    /// Space-joined chunk summaries before the final pass.
    pub combined_summary: String,
    /// Number of chunks produced by the chunker.
    pub chunk_count: usize,
    /// Chunks summarized successfully.
    pub chunks_succeeded: usize,
    /// Chunks skipped after a model failure.
    pub chunks_failed: usize,
    /// Warnings for each skipped chunk.
    pub warnings: Vec<ChunkWarning>,
    /// Page count when the input was a PDF.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    /// RFC 3339 completion timestamp.
    pub completed_at: String,
}

/// Extracted text together with its display preview.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    /// Preview limited to the configured number of characters.
    pub preview: crate::extraction::TextPreview,
    /// Number of pages reported by the parser.
    pub page_count: usize,
    /// Word count of the full text.
    pub word_count: usize,
}
