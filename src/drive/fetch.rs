//! Per-MIME-type content retrieval.

use futures::{Stream, StreamExt};

use super::{DriveClient, FileDescriptor};
use crate::{Error, Result};

/// Google-native document; retrieved via an export to plain text.
pub const GOOGLE_DOC_MIME: &str = "application/vnd.google-apps.document";

/// Plain text; retrieved via a raw media download.
pub const PLAIN_TEXT_MIME: &str = "text/plain";

/// Upper bound on the chunk-pull loop so a misbehaving backend that never
/// signals completion cannot hang a request forever.
const MAX_DOWNLOAD_CHUNKS: usize = 8192;

/// Retrieve and decode the content of exactly one descriptor.
///
/// MIME types outside the two supported strategies fail with
/// [`Error::UnsupportedFileType`] before any credential or network activity.
pub(crate) async fn fetch_content(
    client: &DriveClient,
    descriptor: &FileDescriptor,
) -> Result<String> {
    let response = match descriptor.mime_type.as_str() {
        GOOGLE_DOC_MIME => client.export_media(&descriptor.id, PLAIN_TEXT_MIME).await?,
        PLAIN_TEXT_MIME => client.get_media(&descriptor.id).await?,
        other => {
            return Err(Error::UnsupportedFileType {
                mime_type: other.to_string(),
            })
        }
    };

    let stream = response.bytes_stream().map(|chunk| chunk.map_err(Error::Network));
    let bytes = drain_bounded(stream).await?;
    Ok(String::from_utf8(bytes)?)
}

async fn drain_bounded(stream: impl Stream<Item = Result<bytes::Bytes>>) -> Result<Vec<u8>> {
    let mut stream = std::pin::pin!(stream);
    let mut buffer: Vec<u8> = Vec::new();
    let mut chunks = 0usize;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        chunks += 1;
        if chunks > MAX_DOWNLOAD_CHUNKS {
            return Err(Error::backend(
                format!(
                    "Download exceeded {} chunks without completing",
                    MAX_DOWNLOAD_CHUNKS
                ),
                None,
            ));
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use secrecy::SecretString;

    use super::*;
    use crate::auth::{CredentialProvider, StoredCredential};
    use crate::drive::RemoteFiles;

    /// Provider that fails the test if a credential is ever requested.
    struct UnreachableProvider;

    #[async_trait]
    impl CredentialProvider for UnreachableProvider {
        async fn obtain(&self) -> crate::Result<StoredCredential> {
            panic!("credential provider must not be consulted");
        }
    }

    fn descriptor(mime_type: &str) -> FileDescriptor {
        FileDescriptor {
            id: "file-1".into(),
            name: "notes.bin".into(),
            mime_type: mime_type.into(),
            modified_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn unsupported_mime_type_fails_before_any_backend_call() {
        let client = DriveClient::with_base_url(
            Arc::new(UnreachableProvider),
            "http://127.0.0.1:1/unreachable",
        );

        let err = client.fetch(&descriptor("image/png")).await.unwrap_err();
        match err {
            Error::UnsupportedFileType { mime_type } => assert_eq!(mime_type, "image/png"),
            other => panic!("expected UnsupportedFileType, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_decode_error() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xfe, 0xfd]),
            )
            .mount(&server)
            .await;

        struct StaticProvider;
        #[async_trait]
        impl CredentialProvider for StaticProvider {
            async fn obtain(&self) -> crate::Result<StoredCredential> {
                Ok(StoredCredential {
                    access_token: SecretString::from("ya29.test"),
                    refresh_token: None,
                    expires_at: None,
                    scopes: vec![],
                })
            }
        }

        let client = DriveClient::with_base_url(Arc::new(StaticProvider), server.uri());
        let err = client.fetch(&descriptor(PLAIN_TEXT_MIME)).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    fn one_byte_chunks(count: usize) -> impl futures::Stream<Item = crate::Result<bytes::Bytes>> {
        futures::stream::iter(
            std::iter::repeat_with(|| Ok(bytes::Bytes::from_static(b"x"))).take(count),
        )
    }

    #[tokio::test]
    async fn download_at_the_chunk_budget_drains_fully() {
        let bytes = drain_bounded(one_byte_chunks(MAX_DOWNLOAD_CHUNKS))
            .await
            .unwrap();
        assert_eq!(bytes.len(), MAX_DOWNLOAD_CHUNKS);
    }

    #[tokio::test]
    async fn download_exceeding_the_chunk_budget_is_rejected() {
        let err = drain_bounded(one_byte_chunks(MAX_DOWNLOAD_CHUNKS + 1))
            .await
            .unwrap_err();
        match err {
            Error::Backend { message, status } => {
                assert!(message.contains("chunks"), "unexpected message: {message}");
                assert_eq!(status, None);
            }
            other => panic!("expected Backend, got {other:?}"),
        }
    }
}
