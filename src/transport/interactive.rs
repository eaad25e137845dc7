//! Persistent websocket transport for an interactive remote shell.
//!
//! The socket is driven by a spawned task that talks to the owning
//! [`InteractiveClient`] over channels. All state (connection state, partial
//! line) lives in the client and is only touched by its owner, so events are
//! applied in strict arrival order.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::Message;

use super::error::TransportError;
use super::lines::LineAssembler;
use super::{ConnectionState, OutputLine};

const LINE_TERMINATOR: &str = "\n";

/// Signals from the socket task to the owning client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The remote accepted the connection.
    Opened,
    /// Raw output bytes, with no framing beyond newlines.
    Chunk(Vec<u8>),
    /// A socket-level failure. Does not by itself end the connection.
    Error(String),
    /// The connection is gone. Always the last event of a connection.
    Closed,
}

/// Resources of one live connection. Dropping `outbound` asks the socket
/// task to send a close frame and exit.
struct Connection {
    address: String,
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
    _task: JoinHandle<()>,
}

/// Client side of the interactive shell.
///
/// State machine: `Disconnected -> Connecting -> Connected -> Disconnected`.
/// The connection is held in an `Option` and taken exactly once on close, so
/// a second close or error after the first has nothing left to act on.
#[derive(Default)]
pub struct InteractiveClient {
    state: ConnectionState,
    connection: Option<Connection>,
    lines: LineAssembler,
}

impl InteractiveClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn address(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.address.as_str())
    }

    /// Start connecting to `address`.
    ///
    /// Returns as soon as the socket task is spawned, leaving the client in
    /// `Connecting`; the handshake outcome arrives later as [`TransportEvent::Opened`]
    /// or as an error followed by [`TransportEvent::Closed`]. Addresses that
    /// cannot form a request fail immediately and leave the client disconnected.
    pub fn connect(&mut self, address: &str) -> Result<(), TransportError> {
        if self.connection.is_some() {
            self.disconnect();
        }

        let request = address
            .into_client_request()
            .map_err(|e| TransportError::InvalidAddress {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let task_address = address.to_string();
        let task = tokio::spawn(async move {
            run_socket(task_address, request, outbound_rx, inbound_tx).await;
        });

        self.lines = LineAssembler::new();
        self.connection = Some(Connection {
            address: address.to_string(),
            outbound: outbound_tx,
            inbound: inbound_rx,
            _task: task,
        });
        self.state = ConnectionState::Connecting;
        tracing::debug!(address, "Interactive transport connecting");
        Ok(())
    }

    /// Wait for the next event from the socket task.
    ///
    /// Returns `None` when there is no connection to listen on. A task that
    /// vanished without reporting is surfaced as `Closed`.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        let connection = self.connection.as_mut()?;
        Some(
            connection
                .inbound
                .recv()
                .await
                .unwrap_or(TransportEvent::Closed),
        )
    }

    /// Apply one event and return the lines it produces.
    pub fn handle_event(&mut self, event: TransportEvent) -> Vec<OutputLine> {
        match event {
            TransportEvent::Opened => {
                if self.state != ConnectionState::Connecting {
                    return Vec::new();
                }
                self.state = ConnectionState::Connected;
                let address = self.address().unwrap_or_default().to_string();
                tracing::info!(address = %address, "Interactive transport connected");
                vec![OutputLine::prompt(format!("Connected to {address}"))]
            }
            TransportEvent::Chunk(bytes) => {
                if self.connection.is_none() {
                    return Vec::new();
                }
                self.lines
                    .push(&bytes)
                    .into_iter()
                    .map(OutputLine::output)
                    .collect()
            }
            TransportEvent::Error(message) => {
                if self.connection.is_none() {
                    return Vec::new();
                }
                tracing::warn!(error = %message, "Interactive transport error");
                vec![OutputLine::error(message)]
            }
            TransportEvent::Closed => {
                if self.close().is_none() {
                    return Vec::new();
                }
                vec![OutputLine::prompt("Disconnected")]
            }
        }
    }

    /// Transmit `command` followed by a single line terminator.
    ///
    /// Only valid while connected; otherwise nothing is sent and a notice is
    /// returned instead.
    pub fn send(&mut self, command: &str) -> Vec<OutputLine> {
        let sent = match (&self.connection, self.state) {
            (Some(connection), ConnectionState::Connected) => connection
                .outbound
                .send(format!("{command}{LINE_TERMINATOR}"))
                .is_ok(),
            _ => false,
        };

        if sent {
            Vec::new()
        } else {
            vec![OutputLine::error("Not connected")]
        }
    }

    /// Close the connection from this side.
    ///
    /// Any unterminated output is discarded. Returns a notice only if a
    /// connection was actually open.
    pub fn disconnect(&mut self) -> Vec<OutputLine> {
        match self.close() {
            Some(address) => vec![OutputLine::prompt(format!("Disconnected from {address}"))],
            None => Vec::new(),
        }
    }

    fn close(&mut self) -> Option<String> {
        let connection = self.connection.take()?;
        self.state = ConnectionState::Disconnected;
        let dropped = self.lines.discard();
        if dropped > 0 {
            tracing::debug!(bytes = dropped, "Discarded unterminated output on close");
        }
        tracing::info!(address = %connection.address, "Interactive transport closed");
        // Dropping the connection drops `outbound`, which ends the socket task.
        Some(connection.address)
    }
}

impl Drop for InteractiveClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// Socket task: performs the handshake, then shuttles commands out and
/// output chunks in until either side goes away.
async fn run_socket(
    address: String,
    request: Request,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let socket = match tokio_tungstenite::connect_async(request).await {
        Ok((socket, _response)) => socket,
        Err(source) => {
            let err = TransportError::Connect { address, source };
            let _ = events.send(TransportEvent::Error(err.to_string()));
            let _ = events.send(TransportEvent::Closed);
            return;
        }
    };

    if events.send(TransportEvent::Opened).is_err() {
        return;
    }

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        let _ = events.send(TransportEvent::Error(format!("Send failed: {e}")));
                        break;
                    }
                }
                None => {
                    // Owner disconnected.
                    let _ = sink.close().await;
                    tracing::trace!("Interactive socket closed by owner");
                    return;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(TransportEvent::Chunk(text.into_bytes()));
                }
                Some(Ok(Message::Binary(bytes))) => {
                    let _ = events.send(TransportEvent::Chunk(bytes));
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = events.send(TransportEvent::Error(format!("Connection error: {e}")));
                    break;
                }
            },
        }
    }

    let _ = events.send(TransportEvent::Closed);
}
