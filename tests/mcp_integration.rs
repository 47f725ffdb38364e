use std::sync::Arc;

use httpmock::{Method::POST, Mock, MockServer};
use rmcp::{
    handler::client::ClientHandler,
    model::{
        self, CallToolRequestParam, ClientInfo, PaginatedRequestParam, ReadResourceRequestParam,
        ResourceContents,
    },
    service::{RoleClient, RoleServer, RunningService, Service, serve_directly},
    transport::async_rw::AsyncRwTransport,
};
use rustydigest::{
    config, logging, mcp::RustyDigestMcpServer, processing::DigestService,
    summarization::build_summarization_client,
};
use serde_json::json;
use tokio::{io::split, sync::OnceCell};

static INIT: OnceCell<()> = OnceCell::const_new();
static MOCK_SERVER: OnceCell<&'static MockServer> = OnceCell::const_new();
static MOCK_HANDLES: OnceCell<Vec<Mock<'static>>> = OnceCell::const_new();

fn set_env(key: &str, value: &str) {
    // SAFETY: Tests run in a single process and establish deterministic configuration upfront.
    unsafe { std::env::set_var(key, value) }
}

fn arguments(value: serde_json::Value) -> Option<model::JsonObject> {
    value.as_object().cloned()
}

#[derive(Clone, Default)]
struct DummyClientHandler;

impl ClientHandler for DummyClientHandler {
    fn get_info(&self) -> ClientInfo {
        ClientInfo::default()
    }
}

struct TestHarness {
    service: RunningService<RoleClient, DummyClientHandler>,
    server: RunningService<RoleServer, RustyDigestMcpServer>,
}

impl TestHarness {
    async fn new() -> Self {
        INIT.get_or_init(|| async {
            let mock_server_owned = MockServer::start_async().await;
            let mock_server = Box::leak(Box::new(mock_server_owned));
            let base_url = mock_server.base_url();

            set_env("SUMMARIZATION_PROVIDER", "huggingface");
            set_env("SUMMARIZATION_URL", &base_url);
            set_env("SUMMARIZATION_MODEL", "test/summarizer");
            set_env("SUMMARIZATION_TIMEOUT_SECS", "5");
            set_env("CHUNK_MAX_SIZE", "4");
            set_env("SUMMARY_MODE", "two-stage");

            MOCK_SERVER.set(mock_server).ok();
            let server = MOCK_SERVER.get().expect("mock server initialized");

            let mocks: Vec<Mock<'static>> = vec![
                server
                    .mock_async(|when, then| {
                        when.method(POST).path("/models/test/summarizer");
                        then.status(200)
                            .json_body(json!([{ "summary_text": "mock summary" }]));
                    })
                    .await,
            ];
            MOCK_HANDLES.set(mocks).ok();

            config::init_config().expect("test configuration is valid");
            logging::init_tracing();
        })
        .await;

        // One HTTP client per test runtime; pooled connections must not outlive their runtime.
        let config = config::get_config().clone();
        let client = build_summarization_client(&config).expect("client builds");
        let server =
            RustyDigestMcpServer::new(Arc::new(DigestService::with_client(config, client)));

        let (client_stream, server_stream) = tokio::io::duplex(16 * 1024);
        let (client_read, client_write) = split(client_stream);
        let (server_read, server_write) = split(server_stream);

        let client_transport = AsyncRwTransport::new_client(client_read, client_write);
        let server_transport = AsyncRwTransport::new_server(server_read, server_write);

        let server_info = server.get_info();
        let client_handler = DummyClientHandler;
        let client_info = ClientHandler::get_info(&client_handler);

        let server =
            serve_directly::<RoleServer, _, _, _, _>(server, server_transport, Some(client_info));
        let service = serve_directly::<RoleClient, _, _, _, _>(
            client_handler,
            client_transport,
            Some(server_info),
        );

        Self { service, server }
    }

    async fn shutdown(self) {
        let Self { service, server } = self;
        let _ = service.cancel().await;
        let _ = server.cancel().await;
    }
}

#[tokio::test]
async fn initialize_and_list_tools() {
    let harness = TestHarness::new().await;
    let service = &harness.service;

    let info = service
        .peer_info()
        .expect("server info should be initialized");
    assert_eq!(info.server_info.name, "rusty-digest");
    assert!(info.capabilities.tools.is_some());
    assert!(info.capabilities.resources.is_some());

    let tools_result = service
        .list_tools(Some(PaginatedRequestParam { cursor: None }))
        .await
        .expect("list_tools");

    let names: Vec<_> = tools_result
        .tools
        .iter()
        .map(|tool| tool.name.as_ref())
        .collect();

    assert!(names.contains(&"summarize-document"));
    assert!(names.contains(&"extract-text"));
    assert!(names.contains(&"metrics"));

    harness.shutdown().await;
}

#[tokio::test]
async fn summarize_tool_runs_map_and_reduce() {
    let harness = TestHarness::new().await;
    let service = &harness.service;

    let response = service
        .call_tool(CallToolRequestParam {
            name: "summarize-document".into(),
            arguments: arguments(json!({
                "text": "Alpha beta gamma delta. Epsilon zeta eta theta."
            })),
        })
        .await
        .expect("summarize tool call");

    assert_eq!(response.is_error, Some(false));
    let payload = response.structured_content.expect("structured payload");
    assert_eq!(payload["chunk_count"], 2);
    assert_eq!(payload["chunks_failed"], 0);
    assert_eq!(payload["combined_summary"], "mock summary mock summary");
    assert_eq!(payload["summary"], "mock summary");
    assert_eq!(payload["mode"], "two-stage");

    let metrics_response = service
        .call_tool(CallToolRequestParam {
            name: "metrics".into(),
            arguments: arguments(json!({})),
        })
        .await
        .expect("metrics tool call");
    let metrics_payload = metrics_response
        .structured_content
        .expect("structured metrics payload");
    assert!(metrics_payload["documentsSummarized"].as_u64().is_some());

    harness.shutdown().await;
}

#[tokio::test]
async fn single_stage_override_skips_final_pass() {
    let harness = TestHarness::new().await;

    let response = harness
        .service
        .call_tool(CallToolRequestParam {
            name: "summarize-document".into(),
            arguments: arguments(json!({
                "text": "One two three. Four five six.",
                "mode": "single-stage",
                "chunk_size": 100
            })),
        })
        .await
        .expect("summarize tool call");

    let payload = response.structured_content.expect("structured payload");
    assert_eq!(payload["chunk_count"], 1);
    assert_eq!(payload["summary"], "mock summary");
    assert_eq!(payload["summary"], payload["combined_summary"]);

    harness.shutdown().await;
}

#[tokio::test]
async fn settings_resource_reports_environment() {
    let harness = TestHarness::new().await;

    let result = harness
        .service
        .read_resource(ReadResourceRequestParam {
            uri: "mcp://settings".into(),
        })
        .await
        .expect("read settings");

    match &result.contents[0] {
        ResourceContents::TextResourceContents { text, .. } => {
            let value: serde_json::Value = serde_json::from_str(text).expect("json settings");
            assert_eq!(value["summarization"]["model"], "test/summarizer");
            assert_eq!(value["chunking"]["maxSize"], 4);
        }
        other => panic!("unexpected contents: {other:?}"),
    }

    harness.shutdown().await;
}

#[tokio::test]
async fn invalid_payload_returns_error() {
    let harness = TestHarness::new().await;
    let service = &harness.service;

    let err = service
        .call_tool(CallToolRequestParam {
            name: "summarize-document".into(),
            arguments: arguments(json!({ "mode": "two-stage" })),
        })
        .await
        .expect_err("summarize should fail without a document");

    match err {
        rmcp::service::ServiceError::McpError(data) => {
            assert_eq!(data.code, model::ErrorCode::INVALID_PARAMS);
        }
        other => panic!("expected MCP error, got {other:?}"),
    }

    let err = service
        .call_tool(CallToolRequestParam {
            name: "extract-text".into(),
            arguments: arguments(json!({ "path": "/no/such/file.pdf" })),
        })
        .await
        .expect_err("extract should fail for a missing file");

    match err {
        rmcp::service::ServiceError::McpError(data) => {
            assert_eq!(data.code, model::ErrorCode::INVALID_PARAMS);
        }
        other => panic!("expected MCP error, got {other:?}"),
    }

    harness.shutdown().await;
}
