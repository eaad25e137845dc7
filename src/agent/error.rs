use thiserror::Error;

/// Terminal failures of a log stream. Decode problems on individual frames
/// are not errors; those frames are dropped and counted.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying read primitive failed.
    #[error("stream read failed: {0}")]
    Read(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// No bytes arrived within the idle window.
    #[error("idle timeout after {duration}s of inactivity")]
    IdleTimeout { duration: u64 },
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Agent API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response from '{url}': {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Log stream failed: {0}")]
    Stream(#[from] StreamError),

    #[error("No agent session has been started")]
    NoSession,

    #[error("The agent is still working on the previous message")]
    Busy,
}
