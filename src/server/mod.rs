//! Streamable HTTP transport host.
//!
//! The session/transport machinery is rmcp's; this module only adapts the
//! [`ToolGateway`] to the protocol surface (capability listing + tool calls),
//! mounts it at `/mcp`, and binds the listener — plaintext in development
//! mode, the attested TLS identity otherwise.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::routing::get;
use axum_server::tls_rustls::RustlsConfig;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};

use crate::gateway::ToolGateway;
use crate::{Error, Result};

/// MCP handler delegating every request to the gateway.
#[derive(Clone)]
pub struct DriveMcpServer {
    gateway: Arc<ToolGateway>,
}

impl DriveMcpServer {
    pub fn new(gateway: Arc<ToolGateway>) -> Self {
        Self { gateway }
    }

    fn tool_listing() -> Vec<Tool> {
        ToolGateway::definitions()
            .into_iter()
            .map(|definition| {
                let schema = definition
                    .input_schema
                    .as_object()
                    .cloned()
                    .unwrap_or_default();
                Tool::new(definition.name, definition.description, Arc::new(schema))
            })
            .collect()
    }
}

fn to_mcp_error(err: Error) -> McpError {
    if err.is_caller_error() {
        McpError::invalid_params(err.to_string(), None)
    } else {
        McpError::internal_error(err.to_string(), None)
    }
}

impl ServerHandler for DriveMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "attestable-mcp-server".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Searches and reads files in the connected Google Drive.".into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: Self::tool_listing(),
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        tracing::debug!(tool = %request.name, "tool call");
        let response = self
            .gateway
            .handle(&request.name, request.arguments.as_ref())
            .await
            .map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(
            response.response,
        )]))
    }
}

async fn healthz() -> &'static str {
    "ok"
}

/// Build the HTTP application: the MCP service in stateless mode at `/mcp`,
/// plus a plaintext liveness route.
pub fn router(gateway: Arc<ToolGateway>) -> axum::Router {
    let handler = DriveMcpServer::new(gateway);
    let service = StreamableHttpService::new(
        move || Ok(handler.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            sse_keep_alive: None,
            stateful_mode: false,
        },
    );

    axum::Router::new()
        .nest_service("/mcp", service)
        .route("/healthz", get(healthz))
}

/// Serve plaintext HTTP (development mode).
pub async fn serve_plain(app: axum::Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening (plaintext, development mode)");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Serve HTTPS with the attested identity written at startup.
pub async fn serve_tls(
    app: axum::Router,
    addr: SocketAddr,
    key: &Path,
    cert: &Path,
) -> Result<()> {
    let config = RustlsConfig::from_pem_file(cert, key)
        .await
        .map_err(|e| Error::Tls(format!("loading TLS identity: {}", e)))?;
    tracing::info!(%addr, "listening (RA-TLS)");
    axum_server::bind_rustls(addr, config)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
