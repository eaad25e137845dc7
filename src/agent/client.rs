//! HTTP client for the build-agent API.

use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::cancel::CancelToken;
use crate::config::AgentConfig;

use super::error::AgentError;
use super::stream::EventStreamReader;
use super::types::{
    CreateSessionRequest, CreateSessionResponse, FileContentResponse, FilesResponse,
    SendMessageRequest, SendMessageResponse,
};

const SESSIONS_PATH: &str = "/api/agent/sessions";
const EVENT_STREAM: &str = "text/event-stream";

/// Event reader over a live HTTP response body.
pub type LogStream = EventStreamReader<BoxStream<'static, Result<Bytes, reqwest::Error>>>;

#[derive(Clone)]
pub struct AgentClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    idle_timeout: Duration,
}

impl AgentClient {
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(u64::from(config.connect_timeout_seconds)))
            .build()
            .map_err(|source| AgentError::Request {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            idle_timeout: Duration::from_secs(u64::from(config.idle_timeout_seconds)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a session, optionally with a first message.
    ///
    /// With a message, the backend usually answers without `reply` and
    /// streams the work on the session's log stream.
    pub async fn create_session(
        &self,
        initial_message: Option<&str>,
    ) -> Result<CreateSessionResponse, AgentError> {
        let url = format!("{}{}", self.base_url, SESSIONS_PATH);
        let body = CreateSessionRequest {
            initial_message: initial_message.map(str::to_string),
        };
        let response: CreateSessionResponse = self
            .send_json(self.authorized(self.client.post(&url)).json(&body), &url)
            .await?;
        tracing::info!(session_id = %response.session_id, "Agent session created");
        Ok(response)
    }

    /// Post a follow-up message to an existing session.
    pub async fn send_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<SendMessageResponse, AgentError> {
        let url = self.session_url(session_id, "/messages");
        let body = SendMessageRequest {
            message: text.to_string(),
        };
        let response: SendMessageResponse = self
            .send_json(self.authorized(self.client.post(&url)).json(&body), &url)
            .await?;
        tracing::debug!(session_id, streaming = response.streaming, "Message sent");
        Ok(response)
    }

    /// Open the session's log stream.
    ///
    /// The returned reader honours `cancel` and the configured idle timeout.
    pub async fn subscribe_logs(
        &self,
        session_id: &str,
        cancel: CancelToken,
    ) -> Result<LogStream, AgentError> {
        let url = self.session_url(session_id, "/stream");
        let response = self
            .authorized(self.client.get(&url))
            .header(ACCEPT, EVENT_STREAM)
            .send()
            .await
            .map_err(|source| AgentError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(session_id, "Subscribed to agent log stream");
        let body = response.bytes_stream().boxed();
        Ok(EventStreamReader::new(body)
            .with_idle_timeout(self.idle_timeout)
            .with_cancel_token(cancel))
    }

    /// List a directory of the session's project.
    pub async fn list_files(
        &self,
        session_id: &str,
        path: &str,
    ) -> Result<FilesResponse, AgentError> {
        let url = self.session_url_with_path(session_id, "/files", path)?;
        self.send_json(self.authorized(self.client.get(url.clone())), url.as_str())
            .await
    }

    /// Read one file of the session's project.
    pub async fn read_file(&self, session_id: &str, path: &str) -> Result<String, AgentError> {
        let url = self.session_url_with_path(session_id, "/files/read", path)?;
        let response: FileContentResponse = self
            .send_json(self.authorized(self.client.get(url.clone())), url.as_str())
            .await?;
        Ok(response.content)
    }

    /// Delete the session and its project on the backend.
    pub async fn delete_session(&self, session_id: &str) -> Result<(), AgentError> {
        let url = self.session_url(session_id, "");
        let _: serde_json::Value = self
            .send_json(self.authorized(self.client.delete(&url)), &url)
            .await?;
        tracing::info!(session_id, "Agent session deleted");
        Ok(())
    }

    fn session_url(&self, session_id: &str, suffix: &str) -> String {
        format!("{}{}/{}{}", self.base_url, SESSIONS_PATH, session_id, suffix)
    }

    fn session_url_with_path(
        &self,
        session_id: &str,
        suffix: &str,
        path: &str,
    ) -> Result<Url, AgentError> {
        let raw = self.session_url(session_id, suffix);
        let mut url = Url::parse(&raw).map_err(|e| AgentError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("path", path);
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        url: &str,
    ) -> Result<T, AgentError> {
        let response = builder.send().await.map_err(|source| AgentError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(url, status = status.as_u16(), "Agent API request rejected");
            return Err(AgentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|source| AgentError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
