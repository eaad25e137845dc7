//! Conversation log for one build-agent session.
//!
//! Combines the create/send requests with the session's log stream into a
//! single ordered conversation. Progress lines go to a separate, transient
//! build log that is reset whenever a new stream opens.

use crate::cancel::CancelToken;

use super::client::{AgentClient, LogStream};
use super::error::AgentError;
use super::event::AgentEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub tool_summary: Option<Vec<String>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_summary: None,
        }
    }

    pub fn assistant(content: impl Into<String>, tool_summary: Option<Vec<String>>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLogEntry {
    pub message: String,
    pub level: Option<String>,
}

/// What changed after one step of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    /// A progress line was added to the build log.
    Log(BuildLogEntry),
    /// The final assistant reply was added to the conversation.
    Reply(ChatMessage),
    /// The agent reported an error; the stream stays open.
    Error(String),
    /// The stream ended on a read failure.
    Failed(String),
    /// The stream ended without a reply (closed by the server or cancelled).
    Ended,
}

pub struct AgentSession {
    client: AgentClient,
    session_id: Option<String>,
    conversation: Vec<ChatMessage>,
    build_log: Vec<BuildLogEntry>,
    error: Option<String>,
    stream: Option<LogStream>,
    awaiting_reply: bool,
    cancel: CancelToken,
}

impl AgentSession {
    pub fn new(client: AgentClient) -> Self {
        Self {
            client,
            session_id: None,
            conversation: Vec::new(),
            build_log: Vec::new(),
            error: None,
            stream: None,
            awaiting_reply: false,
            cancel: CancelToken::new(),
        }
    }

    /// Attach to a session created elsewhere.
    pub fn resume(client: AgentClient, session_id: impl Into<String>) -> Self {
        let mut session = Self::new(client);
        session.session_id = Some(session_id.into());
        session
    }

    /// Start a new session with `message` as its first user turn.
    ///
    /// The user message is logged before the request goes out. An immediate
    /// reply is appended directly; otherwise the log stream is opened and
    /// must be driven with [`AgentSession::next_update`].
    pub async fn start_session(&mut self, message: &str) -> Result<(), AgentError> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(());
        }

        self.close();
        self.session_id = None;
        self.conversation.clear();
        self.build_log.clear();
        self.error = None;
        self.conversation.push(ChatMessage::user(message));

        let response = match self.client.create_session(Some(message)).await {
            Ok(response) => response,
            Err(err) => return Err(self.fail(err)),
        };
        self.session_id = Some(response.session_id);

        match response.reply {
            Some(reply) => {
                self.conversation.push(ChatMessage::assistant(reply, None));
                Ok(())
            }
            None => self.open_stream().await,
        }
    }

    /// Send a follow-up message.
    ///
    /// Only allowed while no stream is active. A direct reply is appended to
    /// the conversation; a streaming answer opens a new subscription.
    pub async fn send_message(&mut self, text: &str) -> Result<(), AgentError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        if self.is_streaming() {
            return Err(self.fail(AgentError::Busy));
        }
        let Some(session_id) = self.session_id.clone() else {
            return Err(self.fail(AgentError::NoSession));
        };

        self.error = None;
        self.conversation.push(ChatMessage::user(text));

        let response = match self.client.send_message(&session_id, text).await {
            Ok(response) => response,
            Err(err) => return Err(self.fail(err)),
        };

        if response.needs_stream() {
            return self.open_stream().await;
        }

        let reply = response.reply.unwrap_or_default();
        self.conversation
            .push(ChatMessage::assistant(reply, response.tool_summary));
        Ok(())
    }

    /// Subscribe to the session's log stream, replacing any current one.
    pub async fn subscribe_logs(&mut self) -> Result<(), AgentError> {
        self.open_stream().await
    }

    /// Drive the stream by one event.
    ///
    /// Returns `None` when no stream is active.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        loop {
            let stream = self.stream.as_mut()?;
            match stream.next().await {
                Some(Ok(event)) => {
                    if let Some(update) = self.apply_event(event) {
                        return Some(update);
                    }
                }
                Some(Err(err)) => {
                    let message = err.to_string();
                    self.error = Some(message.clone());
                    self.close();
                    return Some(SessionUpdate::Failed(message));
                }
                None => {
                    self.close();
                    return Some(SessionUpdate::Ended);
                }
            }
        }
    }

    /// Drive the stream until it closes, reporting every update.
    pub async fn run_until_idle(&mut self, mut on_update: impl FnMut(&SessionUpdate)) {
        while let Some(update) = self.next_update().await {
            on_update(&update);
        }
    }

    /// Fold one stream event into the session state.
    pub fn apply_event(&mut self, event: AgentEvent) -> Option<SessionUpdate> {
        match event {
            AgentEvent::Log(log) => {
                let entry = BuildLogEntry {
                    message: log.message,
                    level: log.level,
                };
                self.build_log.push(entry.clone());
                Some(SessionUpdate::Log(entry))
            }
            AgentEvent::Done(done) => {
                if !self.awaiting_reply {
                    return None;
                }
                self.awaiting_reply = false;
                let message = ChatMessage::assistant(done.reply, done.tool_summary);
                self.conversation.push(message.clone());
                self.close();
                Some(SessionUpdate::Reply(message))
            }
            AgentEvent::Error(err) => {
                // Recorded but non-terminal: the server follows up with `done`.
                self.error = Some(err.error.clone());
                Some(SessionUpdate::Error(err.error))
            }
            AgentEvent::Unknown { event_type, .. } => {
                tracing::debug!(event_type = %event_type, "Ignoring unknown agent event");
                None
            }
        }
    }

    /// Tear down the active stream, if any.
    pub fn close(&mut self) {
        self.cancel.cancel();
        if let Some(stream) = self.stream.take() {
            tracing::debug!(stats = %stream.stats(), "Agent log stream closed");
        }
    }

    /// Token that cancels the current stream. Valid until the next stream opens.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn conversation(&self) -> &[ChatMessage] {
        &self.conversation
    }

    pub fn build_log(&self) -> &[BuildLogEntry] {
        &self.build_log
    }

    /// Latest error to show the user, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    pub fn client(&self) -> &AgentClient {
        &self.client
    }

    async fn open_stream(&mut self) -> Result<(), AgentError> {
        let Some(session_id) = self.session_id.clone() else {
            return Err(self.fail(AgentError::NoSession));
        };

        self.close();
        self.cancel = CancelToken::new();
        self.build_log.clear();

        match self
            .client
            .subscribe_logs(&session_id, self.cancel.clone())
            .await
        {
            Ok(stream) => {
                self.stream = Some(stream);
                self.awaiting_reply = true;
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn fail(&mut self, err: AgentError) -> AgentError {
        tracing::warn!(error = %err, "Agent session error");
        self.error = Some(err.to_string());
        err
    }
}

impl Drop for AgentSession {
    fn drop(&mut self) {
        self.close();
    }
}
