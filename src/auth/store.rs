//! Credential storage implementations.

use std::path::PathBuf;

use async_trait::async_trait;

use super::StoredCredential;
use crate::{Error, Result};

/// Durable storage for a single user credential.
///
/// An explicit seam instead of ambient file-system lookups, so the provider can
/// be exercised against in-memory stores in tests.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the persisted credential, if any.
    async fn load(&self) -> Result<Option<StoredCredential>>;
    /// Persist a credential, overwriting any prior one.
    async fn save(&self, credential: &StoredCredential) -> Result<()>;
}

/// File system credential storage (the `token.json` of the deployment).
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<StoredCredential>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::auth(format!("Failed to read token file: {}", e)))?;

        let credential: StoredCredential = serde_json::from_str(&content)
            .map_err(|e| Error::auth(format!("Failed to parse token file: {}", e)))?;

        Ok(Some(credential))
    }

    async fn save(&self, credential: &StoredCredential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(credential)?;
        tokio::fs::write(&self.path, content).await?;

        // The token file grants read access to the user's Drive; keep it
        // user-only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        Ok(())
    }
}
