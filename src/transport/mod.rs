//! Command transports.
//!
//! Two backends can execute shell commands: a persistent websocket carrying a
//! raw interactive shell, and a one-shot HTTP endpoint for hosts that cannot
//! hold long-lived connections. Both produce the same ordered [`OutputLine`]s.

pub mod error;
pub mod interactive;
pub mod lines;
pub mod oneshot;
pub mod selector;

pub use error::TransportError;
pub use interactive::{InteractiveClient, TransportEvent};
pub use lines::LineAssembler;
pub use oneshot::{OneShotClient, RunRequest, RunResponse};
pub use selector::classify;

/// Which transport serves an address. Fixed for the lifetime of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Interactive,
    OneShot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Echo of a submitted command.
    Command,
    Output,
    Error,
    /// Connection status notices.
    Prompt,
}

/// One entry of the terminal log. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub kind: LineKind,
    pub text: String,
}

impl OutputLine {
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn command(text: impl Into<String>) -> Self {
        Self::new(LineKind::Command, text)
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self::new(LineKind::Output, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(LineKind::Error, text)
    }

    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(LineKind::Prompt, text)
    }
}
