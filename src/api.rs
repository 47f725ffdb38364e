//! HTTP surface for Rusty Digest.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /summarize` – Upload a PDF as the raw request body and receive its summary. Optional
//!   query parameters `mode` (`single-stage` | `two-stage`), `chunk_size`, and `clean` override the
//!   configured defaults for this request only.
//! - `POST /summarize/text` – Summarize already extracted text supplied as JSON.
//! - `POST /extract` – Extract a PDF and return a text preview (`max_chars` query parameter).
//! - `GET /metrics` – Observe document and chunk counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! The HTTP surface shares the same pipeline with the MCP server and the CLI, so behavior is
//! identical across interfaces.

use crate::config::SummaryMode;
use crate::metrics::MetricsSnapshot;
use crate::processing::{
    ChunkingError, DigestApi, ExtractionOutcome, ProcessingError, SummaryOptions, SummaryOutcome,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Largest PDF accepted by the upload endpoints.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: DigestApi + 'static,
{
    Router::new()
        .route("/summarize", post(summarize_pdf::<S>))
        .route("/summarize/text", post(summarize_text::<S>))
        .route("/extract", post(extract_pdf::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

/// Query parameters shared by the summarization endpoints.
#[derive(Debug, Default, Deserialize)]
struct SummarizeQuery {
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    chunk_size: Option<usize>,
    #[serde(default)]
    clean: Option<bool>,
}

/// Request body for `POST /summarize/text`.
#[derive(Deserialize)]
struct SummarizeTextRequest {
    /// Text to summarize.
    text: String,
    /// Optional aggregation mode override.
    #[serde(default)]
    mode: Option<String>,
    /// Optional chunk budget override.
    #[serde(default)]
    chunk_size: Option<usize>,
    /// Optional cleaning toggle.
    #[serde(default)]
    clean: Option<bool>,
}

fn summary_options(
    mode: Option<&str>,
    chunk_size: Option<usize>,
    clean: Option<bool>,
) -> Result<SummaryOptions, AppError> {
    let mode = mode
        .map(|raw| {
            raw.parse::<SummaryMode>()
                .map_err(|_| AppError::BadRequest(format!("unknown summary mode '{raw}'")))
        })
        .transpose()?;
    Ok(SummaryOptions {
        mode,
        chunk_size,
        clean,
    })
}

/// Summarize an uploaded PDF.
async fn summarize_pdf<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<SummarizeQuery>,
    body: Bytes,
) -> Result<Json<SummaryOutcome>, AppError>
where
    S: DigestApi,
{
    if body.is_empty() {
        return Err(AppError::BadRequest("request body must contain a PDF".into()));
    }
    let options = summary_options(query.mode.as_deref(), query.chunk_size, query.clean)?;
    let outcome = service.summarize_pdf(body.to_vec(), options).await?;
    tracing::info!(
        request_id = %outcome.request_id,
        chunks = outcome.chunk_count,
        failed = outcome.chunks_failed,
        "Summarize request completed"
    );
    Ok(Json(outcome))
}

/// Summarize text supplied in the request body.
async fn summarize_text<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SummarizeTextRequest>,
) -> Result<Json<SummaryOutcome>, AppError>
where
    S: DigestApi,
{
    let SummarizeTextRequest {
        text,
        mode,
        chunk_size,
        clean,
    } = request;
    let options = summary_options(mode.as_deref(), chunk_size, clean)?;
    let outcome = service.summarize_text(text, options).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Default, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    max_chars: Option<usize>,
}

/// Extract an uploaded PDF and return its preview.
async fn extract_pdf<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<ExtractQuery>,
    body: Bytes,
) -> Result<Json<ExtractionOutcome>, AppError>
where
    S: DigestApi,
{
    if body.is_empty() {
        return Err(AppError::BadRequest("request body must contain a PDF".into()));
    }
    let outcome = service.extract_preview(body.to_vec(), query.max_chars).await?;
    Ok(Json(outcome))
}

/// Return document and chunk counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: DigestApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summarize?mode=two-stage&chunk_size=1000&clean=true",
                description: "Upload a PDF as the raw request body (application/pdf). Returns the final summary, the joined chunk summaries, and a warning for every skipped chunk.",
                request_example: None,
            },
            CommandDescriptor {
                name: "summarize_text",
                method: "POST",
                path: "/summarize/text",
                description: "Summarize already extracted text with the same chunk-and-reduce pipeline.",
                request_example: Some(json!({
                    "text": "Document contents",
                    "mode": "single-stage",
                    "chunk_size": 500,
                    "clean": false
                })),
            },
            CommandDescriptor {
                name: "extract",
                method: "POST",
                path: "/extract?max_chars=3000",
                description: "Upload a PDF and return a preview of its extracted text with page and word counts.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summarization counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    BadRequest(String),
    Processing(ProcessingError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Processing(ProcessingError::Extraction(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Processing(ProcessingError::Chunking(ChunkingError::InvalidChunkSize)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self {
            AppError::BadRequest(message) => message,
            AppError::Processing(error) => {
                tracing::error!(%error, "Request failed");
                error.to_string()
            }
        };
        (status, message).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self::Processing(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::config::SummaryMode;
    use crate::extraction::ExtractionError;
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{
        ChunkingError, DigestApi, ExtractionOutcome, ProcessingError, SummaryOptions,
        SummaryOutcome,
    };
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[tokio::test]
    async fn commands_catalog_exposes_summarize_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let summarize = commands
            .iter()
            .find(|cmd| cmd.name == "summarize")
            .expect("summarize command present");

        assert_eq!(summarize.method, "POST");
        assert!(summarize.path.starts_with("/summarize"));
        assert!(summarize.description.to_lowercase().contains("pdf"));
        assert!(commands.len() >= 3);
    }

    #[tokio::test]
    async fn summarize_route_forwards_pdf_and_query_overrides() {
        let service = Arc::new(StubDigestService::default());
        let app = create_router(service.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/summarize?mode=single-stage&chunk_size=250&clean=false")
                    .header("content-type", "application/pdf")
                    .body(Body::from("%PDF-1.4 stub"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["summary"], "stub summary");
        assert_eq!(json["mode"], "single-stage");
        assert_eq!(json["page_count"], 2);

        let calls = service.recorded_calls().await;
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.input, "%PDF-1.4 stub");
        assert_eq!(call.options.mode, Some(SummaryMode::SingleStage));
        assert_eq!(call.options.chunk_size, Some(250));
        assert_eq!(call.options.clean, Some(false));
    }

    #[tokio::test]
    async fn summarize_text_route_accepts_json_payload() {
        let service = Arc::new(StubDigestService::default());
        let app = create_router(service.clone());

        let payload = json!({ "text": "Plain text body.", "mode": "two-stage" });
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/summarize/text")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let calls = service.recorded_calls().await;
        assert_eq!(calls[0].input, "Plain text body.");
        assert_eq!(calls[0].options.mode, Some(SummaryMode::TwoStage));
        assert_eq!(calls[0].options.chunk_size, None);
    }

    #[tokio::test]
    async fn unknown_mode_is_rejected() {
        let service = Arc::new(StubDigestService::default());
        let app = create_router(service.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/summarize?mode=three-stage")
                    .body(Body::from("%PDF-1.4 stub"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn zero_chunk_size_maps_to_bad_request() {
        let service = Arc::new(StubDigestService::default());
        let app = create_router(service.clone());

        let payload = json!({ "text": "Some text.", "chunk_size": 0 });
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/summarize/text")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let message = String::from_utf8_lossy(&body);
        assert!(message.contains(&ChunkingError::InvalidChunkSize.to_string()));
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn extraction_failures_map_to_unprocessable_entity() {
        let service = Arc::new(StubDigestService::default());
        let app = create_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/summarize")
                    .body(Body::from("not a pdf"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn extract_route_returns_preview() {
        let service = Arc::new(StubDigestService::default());
        let app = create_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/extract?max_chars=5")
                    .body(Body::from("%PDF-1.4 stub"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["preview"]["text"], "%PDF-...");
        assert_eq!(json["preview"]["truncated"], true);
    }

    #[tokio::test]
    async fn metrics_route_serializes_snapshot() {
        let app = create_router(Arc::new(StubDigestService::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["documents_summarized"], 3);
        assert_eq!(json["chunks_failed"], 1);
    }

    #[derive(Clone, Debug)]
    struct SummarizeCall {
        input: String,
        options: SummaryOptions,
    }

    /// Records calls; inputs lacking a `%PDF-` prefix fail extraction and a zero chunk size
    /// fails chunking.
    #[derive(Default)]
    struct StubDigestService {
        calls: Mutex<Vec<SummarizeCall>>,
    }

    impl StubDigestService {
        async fn recorded_calls(&self) -> Vec<SummarizeCall> {
            self.calls.lock().await.clone()
        }

        fn outcome(mode: SummaryMode) -> SummaryOutcome {
            SummaryOutcome {
                request_id: "req-1".into(),
                document_digest: "00".repeat(32),
                mode,
                summary: "stub summary".into(),
                combined_summary: "stub summary".into(),
                chunk_count: 1,
                chunks_succeeded: 1,
                chunks_failed: 0,
                warnings: Vec::new(),
                page_count: None,
                completed_at: "2024-01-01T00:00:00Z".into(),
            }
        }
    }

    #[async_trait]
    impl DigestApi for StubDigestService {
        async fn summarize_pdf(
            &self,
            bytes: Vec<u8>,
            options: SummaryOptions,
        ) -> Result<SummaryOutcome, ProcessingError> {
            if !bytes.starts_with(b"%PDF-") {
                return Err(ProcessingError::Extraction(ExtractionError::NotPdf));
            }
            self.calls.lock().await.push(SummarizeCall {
                input: String::from_utf8_lossy(&bytes).into_owned(),
                options,
            });
            let mut outcome = Self::outcome(options.mode.unwrap_or(SummaryMode::TwoStage));
            outcome.page_count = Some(2);
            Ok(outcome)
        }

        async fn summarize_text(
            &self,
            text: String,
            options: SummaryOptions,
        ) -> Result<SummaryOutcome, ProcessingError> {
            if options.chunk_size == Some(0) {
                return Err(ProcessingError::Chunking(ChunkingError::InvalidChunkSize));
            }
            self.calls.lock().await.push(SummarizeCall {
                input: text,
                options,
            });
            Ok(Self::outcome(options.mode.unwrap_or(SummaryMode::TwoStage)))
        }

        async fn extract_preview(
            &self,
            bytes: Vec<u8>,
            max_chars: Option<usize>,
        ) -> Result<ExtractionOutcome, ProcessingError> {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            Ok(ExtractionOutcome {
                preview: crate::extraction::preview(&text, max_chars.unwrap_or(3000)),
                page_count: 1,
                word_count: text.split_whitespace().count(),
            })
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_summarized: 3,
                chunks_summarized: 7,
                chunks_failed: 1,
                last_chunk_count: Some(2),
            }
        }
    }
}
