//! Formatting helpers shared across MCP handlers and resources.

use crate::config::Config;
use rmcp::model::ResourceContents;
use schemars::JsonSchema;
use serde::Serialize;

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}

/// Effective defaults reported by the `settings` resource.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SettingsSnapshot {
    /// Model backend used for every summarization call.
    pub(crate) summarization: ProviderSettingsSnapshot,
    /// Chunk budget applied before the map stage.
    pub(crate) chunking: ChunkingSettingsSnapshot,
    /// Generation lengths for the map and reduce passes.
    pub(crate) summary: SummarySettingsSnapshot,
    /// Whether the cleaner runs by default.
    pub(crate) text_cleaning: bool,
    /// Characters shown by `extract-text` when `max_chars` is omitted.
    pub(crate) preview_max_chars: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProviderSettingsSnapshot {
    pub(crate) provider: &'static str,
    pub(crate) model: String,
    pub(crate) url: String,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChunkingSettingsSnapshot {
    pub(crate) max_size: usize,
    pub(crate) unit: &'static str,
    pub(crate) tokenizer: String,
    pub(crate) input_max_words: usize,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SummarySettingsSnapshot {
    pub(crate) mode: &'static str,
    pub(crate) max_length: usize,
    pub(crate) min_length: usize,
    pub(crate) reduce_max_chars: usize,
    pub(crate) reduce_max_length: usize,
    pub(crate) reduce_min_length: usize,
}

impl SettingsSnapshot {
    pub(crate) fn from_config(config: &Config) -> Self {
        Self {
            summarization: ProviderSettingsSnapshot {
                provider: config.summarization_provider.as_str(),
                model: config.summarization_model.clone(),
                url: config.summarization_url.clone(),
            },
            chunking: ChunkingSettingsSnapshot {
                max_size: config.chunk_max_size,
                unit: config.chunk_budget_unit.as_str(),
                tokenizer: config.chunk_tokenizer.clone(),
                input_max_words: config.summary_input_max_words,
            },
            summary: SummarySettingsSnapshot {
                mode: config.summary_mode.as_str(),
                max_length: config.summary_max_length,
                min_length: config.summary_min_length,
                reduce_max_chars: config.reduce_max_chars,
                reduce_max_length: config.reduce_max_length,
                reduce_min_length: config.reduce_min_length,
            },
            text_cleaning: config.text_cleaning,
            preview_max_chars: config.preview_max_chars,
        }
    }
}
