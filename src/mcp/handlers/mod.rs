//! Tool handlers for the MCP server.

use crate::processing::{ChunkingError, ProcessingError};
use rmcp::{ErrorData as McpError, model::JsonObject};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod extract;
pub mod metrics;
pub mod summarize;

/// Parse structured arguments supplied to a tool invocation.
pub(crate) fn parse_arguments<T: DeserializeOwned>(
    arguments: Option<JsonObject>,
) -> Result<T, McpError> {
    let value = arguments
        .map(Value::Object)
        .unwrap_or_else(|| Value::Object(JsonObject::new()));
    serde_json::from_value(value)
        .map_err(|err| McpError::invalid_params(format!("Invalid arguments: {err}"), None))
}

/// Read a PDF named by a tool argument.
pub(crate) async fn read_document(path: &str) -> Result<Vec<u8>, McpError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(McpError::invalid_params("`path` must not be empty", None));
    }
    tokio::fs::read(trimmed).await.map_err(|err| {
        McpError::invalid_params(format!("Failed to read '{trimmed}': {err}"), None)
    })
}

/// Map pipeline failures onto MCP error codes.
///
/// Problems with the caller's document or parameters become `invalid_params`; model and
/// runtime failures become `internal_error`.
pub(crate) fn map_processing_error(error: ProcessingError) -> McpError {
    match error {
        ProcessingError::Extraction(source) => {
            McpError::invalid_params(format!("Failed to extract document text: {source}"), None)
        }
        ProcessingError::Chunking(ChunkingError::InvalidChunkSize) => {
            McpError::invalid_params("`chunk_size` must be greater than zero", None)
        }
        other => McpError::internal_error(other.to_string(), None),
    }
}
