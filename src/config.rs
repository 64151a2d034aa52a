//! Runtime path configuration.

use std::path::PathBuf;

/// File system locations the server reads and writes.
///
/// The client-secrets file is operator-supplied input; the token file is
/// written on first successful authorization; the key and certificate are
/// written by the identity bootstrapper when not running in development mode.
#[derive(Debug, Clone)]
pub struct ServerPaths {
    /// OAuth client-secrets JSON (Google "installed app" shape). Read-only.
    pub client_secrets: PathBuf,
    /// Persisted user credential (access + refresh token).
    pub token_file: PathBuf,
    /// PEM private key for the TLS listener.
    pub tls_key: PathBuf,
    /// PEM certificate (embeds the attestation quote) for the TLS listener.
    pub tls_cert: PathBuf,
}

impl Default for ServerPaths {
    fn default() -> Self {
        Self {
            client_secrets: PathBuf::from("credentials.json"),
            token_file: PathBuf::from("token.json"),
            tls_key: PathBuf::from("/app/tmp/key.pem"),
            tls_cert: PathBuf::from("/app/tmp/crt.pem"),
        }
    }
}
