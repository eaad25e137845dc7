//! Terminal façade.
//!
//! Owns the command history, the output log, and at most one active
//! transport. Callers submit commands and read ordered lines back; every
//! failure along the way shows up as a line rather than as an error value.

pub mod history;
pub mod log;

use std::time::Duration;

use crate::config::TerminalConfig;
use crate::transport::{
    classify, ConnectionState, InteractiveClient, OneShotClient, OutputLine, TransportKind,
};

pub use history::{CommandHistory, Direction};
pub use log::OutputLog;

enum ActiveTransport {
    Interactive(InteractiveClient),
    OneShot(OneShotClient),
}

pub struct Terminal {
    settings: TerminalConfig,
    transport: Option<ActiveTransport>,
    history: CommandHistory,
    log: OutputLog,
}

impl Terminal {
    pub fn new(settings: TerminalConfig) -> Self {
        Self {
            settings,
            transport: None,
            history: CommandHistory::new(),
            log: OutputLog::new(),
        }
    }

    /// Open a transport for `address`, replacing any current one.
    ///
    /// The transport kind is chosen once here from the address scheme.
    pub fn connect(&mut self, address: &str) {
        self.disconnect();

        let kind = classify(address);
        tracing::debug!(address, ?kind, "Selecting transport");

        match kind {
            TransportKind::OneShot => {
                let connect_timeout =
                    Duration::from_secs(u64::from(self.settings.connect_timeout_seconds));
                match OneShotClient::new(
                    address,
                    self.settings.timeout_seconds,
                    self.settings.cwd.clone(),
                    connect_timeout,
                ) {
                    Ok(client) => {
                        self.log.push(OutputLine::prompt(format!(
                            "Using HTTP API at {}. Each command runs separately.",
                            client.base_url()
                        )));
                        self.transport = Some(ActiveTransport::OneShot(client));
                    }
                    Err(err) => self.log.push(OutputLine::error(err.to_string())),
                }
            }
            TransportKind::Interactive => {
                let mut client = InteractiveClient::new();
                match client.connect(address) {
                    Ok(()) => {
                        self.log
                            .push(OutputLine::prompt(format!("Connecting to {address}...")));
                        self.transport = Some(ActiveTransport::Interactive(client));
                    }
                    Err(err) => self.log.push(OutputLine::error(err.to_string())),
                }
            }
        }
    }

    /// Drop the current transport. History survives; the log is untouched
    /// apart from a notice.
    pub fn disconnect(&mut self) {
        match self.transport.take() {
            Some(ActiveTransport::Interactive(mut client)) => {
                let lines = client.disconnect();
                self.log.extend(lines);
            }
            Some(ActiveTransport::OneShot(client)) => {
                self.log.push(OutputLine::prompt(format!(
                    "Disconnected from {}",
                    client.base_url()
                )));
            }
            None => {}
        }
    }

    pub fn state(&self) -> ConnectionState {
        match &self.transport {
            Some(ActiveTransport::Interactive(client)) => client.state(),
            Some(ActiveTransport::OneShot(_)) => ConnectionState::Connected,
            None => ConnectionState::Disconnected,
        }
    }

    pub fn transport_kind(&self) -> Option<TransportKind> {
        match &self.transport {
            Some(ActiveTransport::Interactive(_)) => Some(TransportKind::Interactive),
            Some(ActiveTransport::OneShot(_)) => Some(TransportKind::OneShot),
            None => None,
        }
    }

    /// Submit a command. Blank input is ignored without a trace.
    pub async fn execute_command(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }

        self.history.push(text);
        self.log.push(OutputLine::command(text));

        match &mut self.transport {
            Some(ActiveTransport::Interactive(client)) => {
                let lines = client.send(text);
                self.log.extend(lines);
            }
            Some(ActiveTransport::OneShot(client)) => {
                let lines = client.execute(text).await;
                self.log.extend(lines);
            }
            None => self.log.push(OutputLine::error("Not connected")),
        }
    }

    pub fn navigate_history(&mut self, direction: Direction) -> Option<String> {
        self.history.navigate(direction)
    }

    /// Empty the output log.
    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Wait for and apply one inbound event from the interactive transport.
    ///
    /// Returns `false` when nothing can arrive: no transport, a one-shot
    /// transport, or a connection that has closed. Cancel-safe.
    pub async fn pump(&mut self) -> bool {
        let Some(ActiveTransport::Interactive(client)) = &mut self.transport else {
            return false;
        };
        let Some(event) = client.next_event().await else {
            return false;
        };
        let lines = client.handle_event(event);
        self.log.extend(lines);

        if client.state() == ConnectionState::Disconnected {
            self.transport = None;
        }
        true
    }

    pub fn log(&self) -> &OutputLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut OutputLog {
        &mut self.log
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn settings(&self) -> &TerminalConfig {
        &self.settings
    }
}
