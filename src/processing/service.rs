//! Pipeline service coordinating extraction, chunking, and summarization.

use crate::{
    config::{Config, get_config},
    extraction::{self, ExtractedDocument},
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        aggregate::{aggregate, reduce, summarize_chunks},
        chunking::{chunk_text, count_words},
        cleaning::clean_text,
        types::{ExtractionOutcome, ProcessingError, SummaryOptions, SummaryOutcome},
    },
    summarization::{GenerationParams, SummarizationClient, shared_summarization_client},
};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::Instrument;
use uuid::Uuid;

/// Runs one document at a time through extract → clean → chunk → map → reduce.
///
/// The service is cheap to share behind an `Arc`; the HTTP surface, the MCP tools, and the CLI
/// all reuse one instance. Unless a client is injected, the model client is resolved lazily
/// through [`shared_summarization_client`] so that the first request pays for initialization.
pub struct DigestService {
    config: Config,
    client: Option<Arc<dyn SummarizationClient>>,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the pipeline used by external surfaces (HTTP, MCP, CLI).
#[async_trait]
pub trait DigestApi: Send + Sync {
    /// Extract the text of a PDF and summarize it.
    async fn summarize_pdf(
        &self,
        bytes: Vec<u8>,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, ProcessingError>;

    /// Summarize text that was already extracted.
    async fn summarize_text(
        &self,
        text: String,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, ProcessingError>;

    /// Extract the text of a PDF and return a display preview.
    async fn extract_preview(
        &self,
        bytes: Vec<u8>,
        max_chars: Option<usize>,
    ) -> Result<ExtractionOutcome, ProcessingError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl DigestService {
    /// Build a service from the global configuration.
    pub fn new() -> Self {
        Self {
            config: get_config().clone(),
            client: None,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Build a service around an explicit configuration and model client.
    pub fn with_client(config: Config, client: Arc<dyn SummarizationClient>) -> Self {
        Self {
            config,
            client: Some(client),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Configuration this service was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract PDF text on a blocking thread.
    pub async fn extract(&self, bytes: Vec<u8>) -> Result<ExtractedDocument, ProcessingError> {
        let document = tokio::task::spawn_blocking(move || extraction::extract_text_from_pdf(&bytes))
            .await
            .map_err(|error| ProcessingError::Task(error.to_string()))??;
        Ok(document)
    }

    /// Extract and summarize a PDF document.
    pub async fn summarize_pdf(
        &self,
        bytes: Vec<u8>,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, ProcessingError> {
        let request_id = Uuid::new_v4().to_string();
        let document_digest = digest(&bytes);
        let span = tracing::info_span!("summarize", request_id = %request_id);

        async move {
            tracing::info!(bytes = bytes.len(), digest = %document_digest, "Extracting PDF text");
            let ExtractedDocument { text, page_count } = self.extract(bytes).await?;
            tracing::info!(page_count, "Extracted PDF text");
            let mut outcome = self
                .run_pipeline(text, request_id, document_digest, options)
                .await?;
            outcome.page_count = Some(page_count);
            Ok::<_, ProcessingError>(outcome)
        }
        .instrument(span)
        .await
    }

    /// Summarize already extracted text.
    pub async fn summarize_text(
        &self,
        text: String,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, ProcessingError> {
        let request_id = Uuid::new_v4().to_string();
        let document_digest = digest(text.as_bytes());
        let span = tracing::info_span!("summarize", request_id = %request_id);

        self.run_pipeline(text, request_id, document_digest, options)
            .instrument(span)
            .await
    }

    /// Extract a PDF and build a preview limited to `max_chars` (or the configured default).
    pub async fn extract_preview(
        &self,
        bytes: Vec<u8>,
        max_chars: Option<usize>,
    ) -> Result<ExtractionOutcome, ProcessingError> {
        let ExtractedDocument { text, page_count } = self.extract(bytes).await?;
        let max_chars = max_chars.unwrap_or(self.config.preview_max_chars);
        Ok(ExtractionOutcome {
            preview: extraction::preview(&text, max_chars),
            page_count,
            word_count: count_words(&text),
        })
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn client(&self) -> Result<Arc<dyn SummarizationClient>, ProcessingError> {
        match &self.client {
            Some(client) => Ok(client.clone()),
            None => shared_summarization_client().map_err(ProcessingError::Client),
        }
    }

    async fn run_pipeline(
        &self,
        text: String,
        request_id: String,
        document_digest: String,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, ProcessingError> {
        let config = &self.config;
        let mode = options.mode.unwrap_or(config.summary_mode);
        let clean = options.clean.unwrap_or(config.text_cleaning);
        let budget = options.chunk_size.unwrap_or(config.chunk_max_size);

        let text = if clean { clean_text(&text) } else { text };
        let chunks = chunk_text(
            &text,
            budget,
            config.chunk_budget_unit,
            &config.chunk_tokenizer,
        )?;
        tracing::info!(
            chunks = chunks.len(),
            budget,
            unit = ?config.chunk_budget_unit,
            cleaned = clean,
            mode = mode.as_str(),
            "Chunked document"
        );

        let client = self.client()?;
        let outcomes = summarize_chunks(
            client.as_ref(),
            &config.summarization_model,
            &chunks,
            GenerationParams {
                max_length: config.summary_max_length,
                min_length: config.summary_min_length,
            },
            config.summary_input_max_words,
        )
        .await;
        let aggregate = aggregate(&outcomes);

        let summary = reduce(
            client.as_ref(),
            &config.summarization_model,
            &aggregate,
            mode,
            GenerationParams {
                max_length: config.reduce_max_length,
                min_length: config.reduce_min_length,
            },
            config.reduce_max_chars,
        )
        .await
        .map_err(ProcessingError::FinalSummary)?;

        let chunks_failed = aggregate.warnings.len();
        self.metrics
            .record_document(aggregate.succeeded as u64, chunks_failed as u64);
        tracing::info!(
            chunks = chunks.len(),
            succeeded = aggregate.succeeded,
            failed = chunks_failed,
            summary_chars = summary.chars().count(),
            "Document summarized"
        );

        Ok(SummaryOutcome {
            request_id,
            document_digest,
            mode,
            summary,
            combined_summary: aggregate.combined,
            chunk_count: chunks.len(),
            chunks_succeeded: aggregate.succeeded,
            chunks_failed,
            warnings: aggregate.warnings,
            page_count: None,
            completed_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
        })
    }
}

impl Default for DigestService {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA-256 of the submitted document, hex encoded.
fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[async_trait]
impl DigestApi for DigestService {
    async fn summarize_pdf(
        &self,
        bytes: Vec<u8>,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, ProcessingError> {
        DigestService::summarize_pdf(self, bytes, options).await
    }

    async fn summarize_text(
        &self,
        text: String,
        options: SummaryOptions,
    ) -> Result<SummaryOutcome, ProcessingError> {
        DigestService::summarize_text(self, text, options).await
    }

    async fn extract_preview(
        &self,
        bytes: Vec<u8>,
        max_chars: Option<usize>,
    ) -> Result<ExtractionOutcome, ProcessingError> {
        DigestService::extract_preview(self, bytes, max_chars).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        DigestService::metrics_snapshot(self)
    }
}
