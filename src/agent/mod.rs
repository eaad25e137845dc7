//! Build-agent session client.
//!
//! The agent API creates sessions, accepts follow-up messages and streams
//! build progress as server-sent events. [`AgentSession`] folds those events
//! into a conversation; [`EventStreamReader`] turns the raw body into events.

pub mod client;
pub mod error;
pub mod event;
pub mod session;
pub mod stream;
pub mod types;

pub use client::{AgentClient, LogStream};
pub use error::{AgentError, StreamError};
pub use event::{AgentEvent, DonePayload, ErrorPayload, LogPayload};
pub use session::{AgentSession, BuildLogEntry, ChatMessage, Role, SessionUpdate};
pub use stream::{EventStreamReader, FrameDecoder, FrameOutcome, StreamStats};
pub use types::{FileEntry, FilesResponse, SendMessageResponse};
