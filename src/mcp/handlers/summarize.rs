//! Handler for the `summarize-document` MCP tool.

use std::sync::Arc;

use crate::{
    config::SummaryMode,
    mcp::handlers::{map_processing_error, parse_arguments, read_document},
    processing::{DigestService, SummaryOptions},
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;
use serde_json::Value;

/// Raw request payload accepted from MCP clients.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SummarizeToolRequest {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    chunk_size: Option<usize>,
    #[serde(default)]
    clean: Option<bool>,
}

#[derive(Debug, PartialEq, Eq)]
enum DocumentSource {
    Path(String),
    Text(String),
}

#[derive(Debug)]
struct ValidatedSummarizeInput {
    source: DocumentSource,
    options: SummaryOptions,
}

/// Handle the `summarize-document` tool invocation.
pub(crate) async fn handle_summarize(
    service: &Arc<DigestService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: SummarizeToolRequest = parse_arguments(arguments)?;
    let ValidatedSummarizeInput { source, options } = validate_summarize_request(args)?;

    let (source_label, outcome) = match source {
        DocumentSource::Path(path) => {
            let bytes = read_document(&path).await?;
            let outcome = service.summarize_pdf(bytes, options).await;
            (path, outcome)
        }
        DocumentSource::Text(text) => {
            let outcome = service.summarize_text(text, options).await;
            ("inline-text".to_string(), outcome)
        }
    };
    let outcome = outcome.map_err(map_processing_error)?;

    let mut payload = serde_json::to_value(&outcome)
        .map_err(|err| McpError::internal_error(format!("Failed to encode summary: {err}"), None))?;
    if let Value::Object(map) = &mut payload {
        map.insert("source".into(), Value::String(source_label));
    }
    Ok(CallToolResult::structured(payload))
}

fn validate_summarize_request(
    args: SummarizeToolRequest,
) -> Result<ValidatedSummarizeInput, McpError> {
    let SummarizeToolRequest {
        path,
        text,
        mode,
        chunk_size,
        clean,
    } = args;

    let source = match (path, text) {
        (Some(path), None) => DocumentSource::Path(path),
        (None, Some(text)) => DocumentSource::Text(text),
        (Some(_), Some(_)) => {
            return Err(McpError::invalid_params(
                "Provide either `path` or `text`, not both",
                None,
            ));
        }
        (None, None) => {
            return Err(McpError::invalid_params(
                "One of `path` or `text` is required",
                None,
            ));
        }
    };

    let mode = mode
        .map(|raw| {
            raw.parse::<SummaryMode>().map_err(|_| {
                McpError::invalid_params(
                    format!("`mode` must be 'single-stage' or 'two-stage', got '{raw}'"),
                    None,
                )
            })
        })
        .transpose()?;

    if chunk_size == Some(0) {
        return Err(McpError::invalid_params(
            "`chunk_size` must be greater than zero",
            None,
        ));
    }

    Ok(ValidatedSummarizeInput {
        source,
        options: SummaryOptions {
            mode,
            chunk_size,
            clean,
        },
    })
}
