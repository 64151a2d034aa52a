//! Lazy credential provisioning.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::{ClientSecrets, CredentialStore, OAuthFlow, StoredCredential};
use crate::{Error, Result};

/// Hands out a usable credential for one backend call.
///
/// Invoked per call; implementations decide how much work that takes (stored
/// token, refresh, or a full interactive flow).
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn obtain(&self) -> Result<StoredCredential>;
}

/// Production provider: stored token first, refresh when stale, interactive
/// authorization only when no usable state exists.
///
/// Idempotent across process restarts; the first successful authorization
/// persists to the store so later runs skip the browser entirely.
pub struct OAuthProvider {
    client_secrets: PathBuf,
    store: Arc<dyn CredentialStore>,
}

impl OAuthProvider {
    pub fn new(client_secrets: PathBuf, store: impl CredentialStore + 'static) -> Self {
        Self {
            client_secrets,
            store: Arc::new(store),
        }
    }

    async fn flow(&self) -> Result<OAuthFlow> {
        let secrets = ClientSecrets::load(&self.client_secrets).await?;
        Ok(OAuthFlow::new(secrets))
    }

    async fn refresh(&self, token: &SecretString) -> Result<StoredCredential> {
        tracing::debug!("access token stale, refreshing");
        let refreshed = self.flow().await?.refresh(token.expose_secret()).await?;
        self.store.save(&refreshed).await?;
        Ok(refreshed)
    }

    async fn interactive(&self) -> Result<StoredCredential> {
        tracing::info!("no stored credential, starting interactive authorization");
        let credential = self.flow().await?.authorize().await?;
        self.store.save(&credential).await?;
        Ok(credential)
    }
}

#[async_trait]
impl CredentialProvider for OAuthProvider {
    async fn obtain(&self) -> Result<StoredCredential> {
        match self.store.load().await? {
            Some(credential) if !credential.needs_refresh() => Ok(credential),
            Some(credential) => match credential.refresh_token.clone() {
                Some(token) => self.refresh(&token).await,
                None => Err(Error::auth(
                    "Stored credential expired and no refresh token is available",
                )),
            },
            None => self.interactive().await,
        }
    }
}
