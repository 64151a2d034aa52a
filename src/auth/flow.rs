//! Interactive installed-app OAuth flow.
//!
//! Mirrors the provider's "installed application" flow: an authorization URL
//! is printed for the operator, a loopback listener on an ephemeral port
//! receives the redirect, and the returned code is exchanged (PKCE S256) for
//! a bearer token scoped to read-only Drive access.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::RngCore;
use secrecy::SecretString;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use url::Url;

use super::{StoredCredential, TokenResponse};
use crate::{Error, Result};

/// Read-only Drive scope requested during authorization.
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";

/// How long the loopback listener waits for the operator to finish.
const AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(300);

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Operator-supplied OAuth client secrets (Google "installed app" shape).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub installed: InstalledClient,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstalledClient {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ClientSecrets {
    /// Load client secrets from a JSON file.
    pub async fn load(path: &std::path::Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::auth(format!(
                "Failed to read client secrets {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::auth(format!("Failed to parse client secrets: {}", e)))
    }
}

/// Parameters the identity provider appends to the loopback redirect.
#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
struct CallbackTx(Arc<Mutex<Option<oneshot::Sender<CallbackParams>>>>);

async fn callback(State(tx): State<CallbackTx>, Query(params): Query<CallbackParams>) -> &'static str {
    if let Some(sender) = tx.0.lock().await.take() {
        let _ = sender.send(params);
    }
    "Authorization complete. You may close this window."
}

fn random_token() -> String {
    let mut raw = [0u8; 32];
    rand::rng().fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}

fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn validate_callback(params: CallbackParams, expected_state: &str) -> Result<String> {
    if let Some(error) = params.error {
        return Err(Error::auth(format!(
            "Authorization was denied by the identity provider: {}",
            error
        )));
    }
    match params.state.as_deref() {
        Some(state) if state == expected_state => {}
        _ => return Err(Error::auth("Authorization response state mismatch")),
    }
    params
        .code
        .ok_or_else(|| Error::auth("Authorization response carried no code"))
}

/// Interactive authorization and token refresh against the identity provider.
pub struct OAuthFlow {
    secrets: ClientSecrets,
    http: reqwest::Client,
}

impl OAuthFlow {
    pub fn new(secrets: ClientSecrets) -> Self {
        Self {
            secrets,
            http: reqwest::Client::new(),
        }
    }

    /// Run the full interactive flow and return the granted credential.
    ///
    /// Fails with [`Error::Auth`] when the operator never completes the flow
    /// (no browser, no network) or the provider rejects the exchange.
    pub async fn authorize(&self) -> Result<StoredCredential> {
        let verifier = random_token();
        let challenge = pkce_challenge(&verifier);
        let state = random_token();

        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{}/", port);

        let (tx, rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = Router::new()
            .route("/", get(callback))
            .with_state(CallbackTx(Arc::new(Mutex::new(Some(tx)))));

        let server = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::warn!(error = %err, "authorization listener failed");
            }
        });

        let auth_url = Url::parse_with_params(
            &self.secrets.installed.auth_uri,
            &[
                ("client_id", self.secrets.installed.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", DRIVE_READONLY_SCOPE),
                ("state", state.as_str()),
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "S256"),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| Error::Config(format!("Invalid auth_uri: {}", e)))?;

        tracing::info!(port, "waiting for interactive authorization");
        println!("Open this URL in your browser to authorize Drive access:\n{}", auth_url);

        let params = match tokio::time::timeout(AUTHORIZATION_TIMEOUT, rx).await {
            Ok(Ok(params)) => params,
            Ok(Err(_)) => {
                return Err(Error::auth(
                    "Authorization listener closed before a code arrived",
                ))
            }
            Err(_) => {
                let _ = shutdown_tx.send(());
                return Err(Error::auth(format!(
                    "Authorization not completed within {}s",
                    AUTHORIZATION_TIMEOUT.as_secs()
                )));
            }
        };
        let _ = shutdown_tx.send(());
        let _ = server.await;

        let code = validate_callback(params, &state)?;
        self.exchange_code(&code, &verifier, &redirect_uri).await
    }

    /// Exchange a refresh token for a fresh access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<StoredCredential> {
        let response = self
            .token_request(&[
                ("client_id", self.secrets.installed.client_id.as_str()),
                ("client_secret", self.secrets.installed.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await?;
        Ok(response.into_credential(Some(SecretString::from(refresh_token.to_string()))))
    }

    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<StoredCredential> {
        let response = self
            .token_request(&[
                ("code", code),
                ("client_id", self.secrets.installed.client_id.as_str()),
                ("client_secret", self.secrets.installed.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
                ("code_verifier", verifier),
            ])
            .await?;
        Ok(response.into_credential(None))
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.secrets.installed.token_uri)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "Token endpoint returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        Ok(response.json().await?)
    }
}
