//! Tool-invocation gateway.
//!
//! Exposes exactly two named operations over the protocol — `search` and
//! `read` — validates arguments, dispatches to the remote file backend, and
//! renders outcomes into the single prose `response` field callers expect.
//! Stateless: nothing survives a request.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::drive::{FileDescriptor, RemoteFiles};
use crate::{Error, Result};

/// Name of the search operation.
pub const SEARCH_TOOL: &str = "search";
/// Name of the read operation.
pub const READ_TOOL: &str = "read";

const FILE_NAME_ARG: &str = "fileName";

/// Result-count bound applied to every backend search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Protocol response: one human-readable text field for every outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    pub response: String,
}

/// Static description of one operation for capability listing.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: serde_json::Value,
}

/// Input contract shared by both operations.
#[derive(Debug, Deserialize, JsonSchema)]
struct FileArgs {
    #[serde(rename = "fileName")]
    #[allow(dead_code)]
    file_name: String,
}

/// Derive the argument schema, with the `fileName` description worded per
/// tool to match the advertised capability listing.
fn input_schema(file_name_description: &str) -> serde_json::Value {
    let schema = schemars::schema_for!(FileArgs);
    let mut value = serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object"}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    if let Some(field) = value
        .pointer_mut("/properties/fileName")
        .and_then(|v| v.as_object_mut())
    {
        field.insert("description".into(), file_name_description.into());
    }
    value
}

/// Resolution of a `read` request, rendered to prose only at the protocol
/// boundary so the business logic stays testable apart from message text.
#[derive(Debug, PartialEq)]
enum ReadOutcome {
    NotFound,
    Ambiguous { count: usize },
    Content { name: String, text: String },
}

impl ReadOutcome {
    fn render(self) -> ToolResponse {
        let response = match self {
            ReadOutcome::NotFound => "File not present".to_string(),
            ReadOutcome::Ambiguous { .. } => "More than one file present".to_string(),
            ReadOutcome::Content { name, text } => {
                format!("--- Contents of {} ---\n{}\n", name, text)
            }
        };
        ToolResponse { response }
    }
}

fn render_search(files: &[FileDescriptor]) -> ToolResponse {
    let mut names = String::new();
    for file in files {
        // Trailing separator after the last name is load-bearing: external
        // callers already parse this exact format.
        names.push_str(&file.name);
        names.push_str(", ");
    }
    ToolResponse {
        response: format!("{} file(s) found: {}", files.len(), names),
    }
}

/// The gateway itself: argument policy plus dispatch, nothing else.
pub struct ToolGateway {
    backend: Arc<dyn RemoteFiles>,
}

impl ToolGateway {
    pub fn new(backend: Arc<dyn RemoteFiles>) -> Self {
        Self { backend }
    }

    /// Static enumeration of the two operations. Never changes at runtime.
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: SEARCH_TOOL,
                description: "Searches for file with FileName in Google Drive",
                input_schema: input_schema("FileName to search"),
            },
            ToolDefinition {
                name: READ_TOOL,
                description: "Read file with FileName in Google Drive",
                input_schema: input_schema("FileName to read"),
            },
        ]
    }

    /// Validate and dispatch one protocol request.
    ///
    /// Requests missing a string `fileName` are rejected before dispatch;
    /// unregistered tool names are rejected before any backend call.
    pub async fn handle(
        &self,
        tool: &str,
        arguments: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Result<ToolResponse> {
        let file_name = arguments
            .and_then(|args| args.get(FILE_NAME_ARG))
            .and_then(|value| value.as_str())
            .ok_or(Error::MissingArgument {
                name: FILE_NAME_ARG,
            })?;

        match tool {
            SEARCH_TOOL => self.search(file_name).await,
            READ_TOOL => self.read(file_name).await,
            other => Err(Error::UnknownTool {
                name: other.to_string(),
            }),
        }
    }

    /// Report the count and names of files matching the fragment.
    pub async fn search(&self, file_name: &str) -> Result<ToolResponse> {
        let files = self
            .backend
            .search(file_name, DEFAULT_SEARCH_LIMIT)
            .await?;
        tracing::debug!(matches = files.len(), "search complete");
        Ok(render_search(&files))
    }

    /// Retrieve the content of the single file matching the fragment.
    pub async fn read(&self, file_name: &str) -> Result<ToolResponse> {
        let outcome = self.resolve_read(file_name).await?;
        Ok(outcome.render())
    }

    async fn resolve_read(&self, file_name: &str) -> Result<ReadOutcome> {
        let mut files = self
            .backend
            .search(file_name, DEFAULT_SEARCH_LIMIT)
            .await?;

        match files.len() {
            0 => Ok(ReadOutcome::NotFound),
            1 => {
                let descriptor = files.remove(0);
                let text = self.backend.fetch(&descriptor).await?;
                Ok(ReadOutcome::Content {
                    name: descriptor.name,
                    text,
                })
            }
            count => Ok(ReadOutcome::Ambiguous { count }),
        }
    }
}
