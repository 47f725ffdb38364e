//! Abstractive summarization backends.
//!
//! The pipeline talks to a pretrained summarization model through [`SummarizationClient`]. Two
//! HTTP adapters are provided: a Hugging Face style inference endpoint (the default, serving
//! `facebook/bart-large-cnn`) and a local Ollama runtime. Generation is always greedy; callers
//! only choose the output length bounds.
//!
//! The configured client is built on first use and kept for the rest of the process, see
//! [`shared_summarization_client`].

use crate::config::{Config, SummarizationProvider, get_config};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced while attempting abstractive summarization.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider was unreachable, missing the model, or still loading it.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Output length bounds, in model tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    /// Upper bound on generated tokens.
    pub max_length: usize,
    /// Lower bound on generated tokens.
    pub min_length: usize,
}

/// Request payload passed to the summarization provider.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    /// Fully qualified model identifier understood by the provider.
    pub model: String,
    /// Text to summarize, already capped to the model's input budget.
    pub text: String,
    /// Output length bounds.
    pub params: GenerationParams,
}

/// Interface implemented by abstractive summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Produce a summary of `request.text` using greedy decoding.
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError>;
}

static SHARED_CLIENT: OnceLock<Arc<dyn SummarizationClient>> = OnceLock::new();

/// Return the process-wide summarization client, building it on first use.
///
/// A construction failure is returned to the caller and nothing is cached, so the next request
/// tries again. Once built, the client lives for the rest of the process.
pub fn shared_summarization_client()
-> Result<Arc<dyn SummarizationClient>, SummarizationClientError> {
    if let Some(client) = SHARED_CLIENT.get() {
        return Ok(client.clone());
    }

    let config = get_config();
    let client = build_summarization_client(config).inspect_err(|error| {
        tracing::error!(%error, "Failed to initialize summarization client");
    })?;
    tracing::info!(
        provider = config.summarization_provider.as_str(),
        model = %config.summarization_model,
        "Summarization client initialized"
    );
    Ok(SHARED_CLIENT.get_or_init(|| client).clone())
}

/// Build a summarization client for the given configuration.
pub fn build_summarization_client(
    config: &Config,
) -> Result<Arc<dyn SummarizationClient>, SummarizationClientError> {
    let http = Client::builder()
        .user_agent("rusty-digest/summary")
        .timeout(Duration::from_secs(config.summarization_timeout_secs.max(1)))
        .build()
        .map_err(|error| {
            SummarizationClientError::ProviderUnavailable(format!(
                "failed to construct HTTP client: {error}"
            ))
        })?;
    let base_url = config.summarization_url.clone();

    let client: Arc<dyn SummarizationClient> = match config.summarization_provider {
        SummarizationProvider::HuggingFace => Arc::new(HuggingFaceSummarizationClient {
            http,
            base_url,
            api_key: config.summarization_api_key.clone(),
        }),
        SummarizationProvider::Ollama => Arc::new(OllamaSummarizationClient { http, base_url }),
    };
    Ok(client)
}

/// Keep at most `max_words` whitespace-delimited words of `text`.
///
/// Text within the limit is returned unchanged; longer text is rebuilt from its first
/// `max_words` words joined by single spaces.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let head: Vec<&str> = words.by_ref().take(max_words).collect();
    if words.next().is_none() {
        return text.trim().to_string();
    }
    head.join(" ")
}

struct HuggingFaceSummarizationClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HuggingFaceSummarizationClient {
    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url.trim_end_matches('/'), model)
    }
}

#[derive(Debug, Deserialize)]
struct HuggingFaceSummary {
    summary_text: String,
}

#[async_trait]
impl SummarizationClient for HuggingFaceSummarizationClient {
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let endpoint = self.endpoint(&request.model);
        let payload = json!({
            "inputs": request.text,
            "parameters": {
                "max_length": request.params.max_length,
                "min_length": request.params.min_length,
                "do_sample": false,
            },
            "options": {
                "wait_for_model": true,
            }
        });

        let mut builder = self.http.post(&endpoint).json(&payload);
        if let Some(api_key) = self.api_key.as_deref() {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|error| {
            SummarizationClientError::ProviderUnavailable(format!(
                "failed to reach inference endpoint at {}: {error}",
                self.base_url
            ))
        })?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::NOT_FOUND | StatusCode::SERVICE_UNAVAILABLE
        ) {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::ProviderUnavailable(format!(
                "{endpoint} returned {status}: {body}"
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "inference endpoint returned {status}: {body}"
            )));
        }

        let summaries: Vec<HuggingFaceSummary> = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode inference response: {error}"
            ))
        })?;

        summaries
            .into_iter()
            .next()
            .map(|summary| summary.summary_text.trim().to_string())
            .ok_or_else(|| {
                SummarizationClientError::InvalidResponse(
                    "inference response contained no summaries".into(),
                )
            })
    }
}

struct OllamaSummarizationClient {
    http: Client,
    base_url: String,
}

impl OllamaSummarizationClient {
    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

fn build_ollama_prompt(text: &str, params: GenerationParams) -> String {
    format!(
        "Summarize the following text in a single paragraph of roughly {min} to {max} tokens. \
         Stay factual and do not add information that is not in the text.\n\n{text}",
        min = params.min_length,
        max = params.max_length,
    )
}

#[async_trait]
impl SummarizationClient for OllamaSummarizationClient {
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "model": request.model,
            "prompt": build_ollama_prompt(&request.text, request.params),
            "stream": false,
            "options": {
                // Greedy decoding.
                "temperature": 0.0,
                "top_k": 1,
                "num_predict": request.params.max_length,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::NOT_FOUND | StatusCode::SERVICE_UNAVAILABLE
        ) {
            return Err(SummarizationClientError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned {status}",
                self.endpoint()
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode Ollama response: {error}"
            ))
        })?;

        if !body.done {
            return Err(SummarizationClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}
