//! Handler for the `extract-text` MCP tool.

use std::sync::Arc;

use crate::{
    mcp::handlers::{map_processing_error, parse_arguments, read_document},
    processing::DigestService,
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExtractToolRequest {
    path: String,
    #[serde(default)]
    max_chars: Option<usize>,
}

/// Handle the `extract-text` tool invocation.
pub(crate) async fn handle_extract(
    service: &Arc<DigestService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let ExtractToolRequest { path, max_chars } = parse_arguments(arguments)?;
    if max_chars == Some(0) {
        return Err(McpError::invalid_params(
            "`max_chars` must be greater than zero",
            None,
        ));
    }

    let bytes = read_document(&path).await?;
    let outcome = service
        .extract_preview(bytes, max_chars)
        .await
        .map_err(map_processing_error)?;

    Ok(CallToolResult::structured(json!({
        "path": path,
        "text": outcome.preview.text,
        "truncated": outcome.preview.truncated,
        "totalChars": outcome.preview.total_chars,
        "pageCount": outcome.page_count,
        "wordCount": outcome.word_count,
    })))
}
