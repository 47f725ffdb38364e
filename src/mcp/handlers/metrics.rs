//! Handler for the metrics tool.

use std::sync::Arc;

use crate::processing::DigestService;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde_json::json;

/// Handle the `metrics` tool, returning the current summarization counters.
pub(crate) async fn handle_metrics(
    service: &Arc<DigestService>,
) -> Result<CallToolResult, McpError> {
    let snapshot = service.metrics_snapshot();
    Ok(CallToolResult::structured(json!({
        "documentsSummarized": snapshot.documents_summarized,
        "chunksSummarized": snapshot.chunks_summarized,
        "chunksFailed": snapshot.chunks_failed,
        "lastChunkCount": snapshot.last_chunk_count,
    })))
}
