//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    mcp::{
        format::{SettingsSnapshot, json_resource_contents, serialize_json},
        handlers::{extract::handle_extract, metrics::handle_metrics, summarize::handle_summarize},
        registry, schemas,
    },
    processing::DigestService,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourcesResult, ListToolsResult,
        RawResource, ReadResourceRequestParam, ReadResourceResult, Resource, ServerCapabilities,
        ServerInfo, Tool, ToolAnnotations,
    },
};

const SETTINGS_URI: &str = "mcp://settings";

/// MCP server implementation exposing Rusty Digest operations.
#[derive(Clone)]
pub struct RustyDigestMcpServer {
    service: Arc<DigestService>,
    registry: Arc<registry::Registry>,
}

impl RustyDigestMcpServer {
    /// Create a new MCP server using the supplied pipeline.
    pub fn new(service: Arc<DigestService>) -> Self {
        let mut registry = registry::Registry::default();
        registry.register_resource(SETTINGS_URI, resource_settings);

        registry.register_tool("summarize-document", tool_summarize_document);
        registry.register_tool("extract-text", tool_extract_text);
        registry.register_tool("metrics", tool_metrics);

        Self {
            service,
            registry: Arc::new(registry),
        }
    }

    fn describe_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: Cow::Borrowed("summarize-document"),
                title: Some("Summarize Document".to_string()),
                description: Some(Cow::Borrowed(
                    "Summarize a PDF (by path) or raw text: the text is cut into sentence-aligned chunks, each chunk is summarized, and the results are joined or summarized once more.",
                )),
                input_schema: Arc::new(schemas::summarize_document_input_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Summarize Document")
                        .read_only(true)
                        .idempotent(false)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("extract-text"),
                title: Some("Extract PDF Text".to_string()),
                description: Some(Cow::Borrowed(
                    "Preview the text extracted from a PDF before summarizing it.",
                )),
                input_schema: Arc::new(schemas::extract_text_input_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Extract PDF Text")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed("metrics"),
                title: Some("Metrics Snapshot".to_string()),
                description: Some(Cow::Borrowed(
                    "Check how many documents and chunks were summarized and how many chunks were skipped.",
                )),
                input_schema: Arc::new(schemas::empty_object_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Metrics Snapshot")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
        ]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut settings = RawResource::new(SETTINGS_URI, "settings");
        settings.description =
            Some("Effective model, chunking, and summary-length defaults".into());
        settings.mime_type = Some(super::format::APPLICATION_JSON.into());

        vec![settings.no_annotation()]
    }
}

fn resource_settings(
    server: &RustyDigestMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let payload = SettingsSnapshot::from_config(server.service.config());
    Box::pin(async move {
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                SETTINGS_URI,
                serialize_json(&payload, SETTINGS_URI),
            )],
        })
    })
}

fn tool_summarize_document(
    server: &RustyDigestMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let service = server.service.clone();
    Box::pin(async move { handle_summarize(&service, request.arguments).await })
}

fn tool_extract_text(
    server: &RustyDigestMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let service = server.service.clone();
    Box::pin(async move { handle_extract(&service, request.arguments).await })
}

fn tool_metrics(
    server: &RustyDigestMcpServer,
    _request: CallToolRequestParam,
) -> registry::ToolFuture {
    let service = server.service.clone();
    Box::pin(async move { handle_metrics(&service).await })
}

impl ServerHandler for RustyDigestMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "rusty-digest".to_string();
        implementation.title = Some("Rusty Digest MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use this server to summarize long PDFs without pasting them into the conversation. Call extract-text to check a document, then summarize-document with its path; read mcp://settings for the active defaults.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    #[allow(clippy::manual_async_fn)]
    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.resources.get(request.uri.as_str()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown resource URI: {}", request.uri),
                None,
            ))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.tools.get(request.name.as_ref()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ))
        }
    }
}
