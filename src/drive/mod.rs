//! Drive v3 file index and content retrieval.

mod client;
mod fetch;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use client::DriveClient;
pub use fetch::{GOOGLE_DOC_MIME, PLAIN_TEXT_MIME};

use crate::Result;

/// Minimal metadata record identifying a remote file.
///
/// Produced by a search, consumed within the same request; nothing caches
/// descriptors across calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub modified_time: DateTime<Utc>,
}

/// The remote file operations the tool gateway dispatches to.
#[async_trait]
pub trait RemoteFiles: Send + Sync {
    /// Substring-containment search over file names, bounded to `limit`
    /// results, in the backend's native order. An empty result is a valid
    /// outcome, not an error.
    async fn search(&self, name_pattern: &str, limit: usize) -> Result<Vec<FileDescriptor>>;

    /// Retrieve the decoded text content of exactly one resolved descriptor.
    async fn fetch(&self, descriptor: &FileDescriptor) -> Result<String>;
}
