//! Request and response bodies of the agent HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    /// Present when the backend answered synchronously; absent when the
    /// reply will arrive on the log stream.
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub message_history: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub tool_summary: Option<Vec<String>>,
    /// True when the reply will arrive on the log stream instead.
    #[serde(default)]
    pub streaming: bool,
}

impl SendMessageResponse {
    /// Whether the caller must subscribe to the log stream for the reply.
    pub fn needs_stream(&self) -> bool {
        self.streaming || self.reply.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub path: Option<String>,
}

impl FileEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == "directory"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesResponse {
    pub entries: Vec<FileEntry>,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FileContentResponse {
    pub content: String,
}
