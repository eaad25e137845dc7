//! Errors raised by the command transports.
//!
//! These never reach the terminal log as typed values: the [`crate::terminal::Terminal`]
//! façade renders each one as a single Error line.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The address could not be turned into a connection request.
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The websocket handshake failed.
    #[error("Connection to '{address}' failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    /// No HTTP response was received.
    #[error("Request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON shape.
    #[error("Malformed response from '{url}': {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}
