//! Drive client behavior against a mocked backend.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use attestable_mcp_server::auth::{CredentialProvider, StoredCredential};
use attestable_mcp_server::drive::{DriveClient, FileDescriptor, RemoteFiles};
use attestable_mcp_server::gateway::ToolGateway;
use attestable_mcp_server::Error;

struct StaticProvider;

#[async_trait]
impl CredentialProvider for StaticProvider {
    async fn obtain(&self) -> attestable_mcp_server::Result<StoredCredential> {
        Ok(StoredCredential {
            access_token: SecretString::from("ya29.test"),
            refresh_token: None,
            expires_at: None,
            scopes: vec![],
        })
    }
}

fn client(server: &MockServer) -> DriveClient {
    DriveClient::with_base_url(Arc::new(StaticProvider), server.uri())
}

fn descriptor(id: &str, name: &str, mime_type: &str) -> FileDescriptor {
    FileDescriptor {
        id: id.into(),
        name: name.into(),
        mime_type: mime_type.into(),
        modified_time: Utc::now(),
    }
}

fn search_body(files: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "files": files })
}

#[tokio::test]
async fn search_sends_containment_query_and_descriptor_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("q", "name contains 'report'"))
        .and(query_param("pageSize", "10"))
        .and(query_param("fields", "files(id,name,mimeType,modifiedTime)"))
        .and(header("authorization", "Bearer ya29.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(serde_json::json!([
            {
                "id": "1",
                "name": "report-q1.txt",
                "mimeType": "text/plain",
                "modifiedTime": "2024-03-01T10:00:00Z"
            },
            {
                "id": "2",
                "name": "report-q2.txt",
                "mimeType": "text/plain",
                "modifiedTime": "2024-06-01T10:00:00Z"
            }
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server).search("report", 10).await.unwrap();
    assert_eq!(results.len(), 2);
    // Backend order is preserved, not re-sorted.
    assert_eq!(results[0].name, "report-q1.txt");
    assert_eq!(results[1].name, "report-q2.txt");
    assert_eq!(results[0].mime_type, "text/plain");
}

#[tokio::test]
async fn search_escapes_quotes_in_the_pattern() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("q", "name contains 'bob\\'s notes'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(serde_json::json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server).search("bob's notes", 10).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn empty_search_result_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let results = client(&server).search("nothing", 10).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn backend_rejection_surfaces_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": { "code": 403, "message": "Rate limit exceeded" }
        })))
        .mount(&server)
        .await;

    let err = client(&server).search("report", 10).await.unwrap_err();
    match err {
        Error::Backend { status, message } => {
            assert_eq!(status, Some(403));
            assert_eq!(message, "Rate limit exceeded");
        }
        other => panic!("expected Backend, got {other:?}"),
    }
}

#[tokio::test]
async fn plain_text_fetch_uses_raw_media_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/file-1"))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let content = client(&server)
        .fetch(&descriptor("file-1", "notes.txt", "text/plain"))
        .await
        .unwrap();
    assert_eq!(content, "hello");
}

#[tokio::test]
async fn google_doc_fetch_uses_export_not_media() {
    let server = MockServer::start().await;

    // The export endpoint is the only path that may be hit.
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/doc-1/export"))
        .and(query_param("mimeType", "text/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_string("exported text"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/doc-1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let content = client(&server)
        .fetch(&descriptor(
            "doc-1",
            "design doc",
            "application/vnd.google-apps.document",
        ))
        .await
        .unwrap();
    assert_eq!(content, "exported text");
}

#[tokio::test]
async fn failed_download_surfaces_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/file-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": { "code": 404, "message": "File not found" }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch(&descriptor("file-1", "gone.txt", "text/plain"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend { status: Some(404), .. }));
}

#[tokio::test]
async fn gateway_read_end_to_end_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(serde_json::json!([
            {
                "id": "file-1",
                "name": "notes.txt",
                "mimeType": "text/plain",
                "modifiedTime": "2024-03-01T10:00:00Z"
            }
        ]))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/file-1"))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&server)
        .await;

    let gateway = ToolGateway::new(Arc::new(client(&server)));
    let response = gateway.read("notes").await.unwrap();
    assert_eq!(response.response, "--- Contents of notes.txt ---\nhello\n");
}
