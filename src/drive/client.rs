//! Drive v3 REST client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use super::{fetch, FileDescriptor, RemoteFiles};
use crate::auth::CredentialProvider;
use crate::{Error, Result};

const DRIVE_BASE_URL: &str = "https://www.googleapis.com";

/// Descriptor fields requested from the backend; nothing else is fetched.
const DESCRIPTOR_FIELDS: &str = "files(id,name,mimeType,modifiedTime)";

#[derive(Debug, Default, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileDescriptor>,
}

#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    error: BackendErrorDetail,
}

#[derive(Debug, Deserialize)]
struct BackendErrorDetail {
    message: String,
}

/// HTTP client for the Drive v3 API.
///
/// A credential is obtained from the provider on every call; there is no
/// session caching at this layer.
pub struct DriveClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl DriveClient {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::with_base_url(credentials, DRIVE_BASE_URL)
    }

    /// Point the client at a different API host (tests).
    pub fn with_base_url(
        credentials: Arc<dyn CredentialProvider>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            credentials,
        }
    }

    fn files_url(&self, suffix: &str) -> String {
        format!("{}/drive/v3/files{}", self.base_url, suffix)
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        let credential = self.credentials.obtain().await?;
        let response = self
            .http
            .get(url)
            .query(query)
            .header(AUTHORIZATION, credential.bearer())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<BackendErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(Error::backend(message, Some(status.as_u16())));
        }

        Ok(response)
    }

    /// Raw media download for a stored file.
    pub(crate) async fn get_media(&self, file_id: &str) -> Result<reqwest::Response> {
        let url = self.files_url(&format!("/{}", file_id));
        self.get(&url, &[("alt", "media")]).await
    }

    /// Export of a Google-native document to the given MIME type.
    pub(crate) async fn export_media(
        &self,
        file_id: &str,
        mime_type: &str,
    ) -> Result<reqwest::Response> {
        let url = self.files_url(&format!("/{}/export", file_id));
        self.get(&url, &[("mimeType", mime_type)]).await
    }
}

/// Escape a name fragment for use inside a single-quoted Drive query literal.
fn escape_query(pattern: &str) -> String {
    pattern.replace('\\', "\\\\").replace('\'', "\\'")
}

#[async_trait]
impl RemoteFiles for DriveClient {
    async fn search(&self, name_pattern: &str, limit: usize) -> Result<Vec<FileDescriptor>> {
        let query = format!("name contains '{}'", escape_query(name_pattern));
        let limit = limit.to_string();
        let url = self.files_url("");

        tracing::debug!(query = %query, "searching drive");
        let response = self
            .get(
                &url,
                &[
                    ("q", query.as_str()),
                    ("pageSize", limit.as_str()),
                    ("fields", DESCRIPTOR_FIELDS),
                ],
            )
            .await?;

        let list: FileList = response.json().await?;
        Ok(list.files)
    }

    async fn fetch(&self, descriptor: &FileDescriptor) -> Result<String> {
        fetch::fetch_content(self, descriptor).await
    }
}
