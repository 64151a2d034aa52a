//! Binary entrypoint: CLI parsing, logging, wiring, listener bind.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use attestable_mcp_server::attest::{self, GramineQuoteSource};
use attestable_mcp_server::auth::{FileCredentialStore, OAuthProvider};
use attestable_mcp_server::config::ServerPaths;
use attestable_mcp_server::drive::DriveClient;
use attestable_mcp_server::gateway::ToolGateway;
use attestable_mcp_server::{server, Result};

/// MCP server exposing Google Drive search/read tools behind an attested
/// TLS listener.
#[derive(Debug, Parser)]
#[command(name = "attestable-mcp-server", version, about)]
struct Cli {
    /// Port to listen on for Streamable HTTP.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Development mode: serve plaintext HTTP and skip attestation identity
    /// generation.
    #[arg(long = "isDev")]
    is_dev: bool,

    /// OAuth client secrets file (operator-supplied, read-only).
    #[arg(long, default_value = "credentials.json")]
    client_secrets: PathBuf,

    /// Where the authorized user token is persisted.
    #[arg(long, default_value = "token.json")]
    token_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let paths = ServerPaths {
        client_secrets: cli.client_secrets,
        token_file: cli.token_file,
        ..ServerPaths::default()
    };

    let store = FileCredentialStore::new(paths.token_file.clone());
    let provider = OAuthProvider::new(paths.client_secrets.clone(), store);
    let drive = DriveClient::new(Arc::new(provider));
    let gateway = Arc::new(ToolGateway::new(Arc::new(drive)));
    let app = server::router(gateway);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    if cli.is_dev {
        server::serve_plain(app, addr).await
    } else {
        attest::write_identity(&GramineQuoteSource, &paths.tls_key, &paths.tls_cert).await?;
        server::serve_tls(app, addr, &paths.tls_key, &paths.tls_cert).await
    }
}
