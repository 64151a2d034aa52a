//! # attestable-mcp-server
//!
//! An MCP server that exposes two Google Drive tools — `search` and `read` —
//! over Streamable HTTP, with a lazily-authorized OAuth credential and, outside
//! development mode, a TLS identity whose certificate embeds a remote-attestation
//! quote (Gramine RA-TLS convention).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use attestable_mcp_server::auth::{FileCredentialStore, OAuthProvider};
//! use attestable_mcp_server::config::ServerPaths;
//! use attestable_mcp_server::drive::DriveClient;
//! use attestable_mcp_server::gateway::ToolGateway;
//!
//! # async fn run() -> Result<(), attestable_mcp_server::Error> {
//! let paths = ServerPaths::default();
//! let store = FileCredentialStore::new(paths.token_file.clone());
//! let provider = OAuthProvider::new(paths.client_secrets.clone(), store);
//! let drive = DriveClient::new(Arc::new(provider));
//! let gateway = ToolGateway::new(Arc::new(drive));
//! let response = gateway.search("quarterly report").await?;
//! println!("{}", response.response);
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod attest;
pub mod auth;
pub mod config;
pub mod drive;
pub mod gateway;
pub mod server;

pub use attest::{GramineQuoteSource, QuoteSource, RaTlsIdentity};
pub use auth::{CredentialProvider, CredentialStore, FileCredentialStore, OAuthProvider, StoredCredential};
pub use config::ServerPaths;
pub use drive::{DriveClient, FileDescriptor, RemoteFiles};
pub use gateway::{ToolDefinition, ToolGateway, ToolResponse};

/// Error type for all server operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Caller omitted a required tool argument.
    #[error("Missing required argument '{name}'")]
    MissingArgument { name: &'static str },

    /// Caller named a tool that is not registered.
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    /// Authorization against the storage backend could not be established.
    #[error("Authorization failed: {message}")]
    Auth { message: String },

    /// The storage backend rejected a query or download.
    #[error("Backend error (HTTP {status}): {message}", status = status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".into()))]
    Backend {
        message: String,
        status: Option<u16>,
    },

    /// Network connectivity or request failed.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Downloaded bytes are not valid UTF-8 text.
    #[error("Downloaded content is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// The matched file has a MIME type with no retrieval strategy.
    #[error("Unsupported file type: {mime_type}")]
    UnsupportedFileType { mime_type: String },

    /// Remote-attestation identity could not be produced.
    #[error("Attestation failed: {message}")]
    Attestation { message: String },

    /// TLS listener configuration failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>, status: Option<u16>) -> Self {
        Error::Backend {
            message: message.into(),
            status,
        }
    }

    pub fn attestation(message: impl Into<String>) -> Self {
        Error::Attestation {
            message: message.into(),
        }
    }

    /// Whether this error was the caller's fault (rejected before dispatch).
    ///
    /// Caller errors become protocol-level invalid-params responses; everything
    /// else surfaces as an internal error.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::MissingArgument { .. } | Error::UnknownTool { .. }
        )
    }
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
