use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Settings for the command terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Default target: `ws://`/`wss://` for the interactive shell,
    /// `http://`/`https://` for the one-shot endpoint.
    #[serde(default = "default_terminal_address")]
    pub address: String,
    /// Per-command timeout sent to the one-shot endpoint (default: 30).
    /// Enforced by the server, never by this client.
    #[serde(default = "default_command_timeout")]
    pub timeout_seconds: u32,
    /// Working directory forwarded to the one-shot endpoint.
    #[serde(default)]
    pub cwd: Option<String>,
    /// TCP connect timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
}

/// Settings for the build-agent session client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the agent API (scheme + host + port).
    #[serde(default = "default_agent_base_url")]
    pub base_url: String,
    /// Bearer token passed through as-is.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Seconds of silence after which a log stream is abandoned (default: 300).
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u32,
    /// TCP connect timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
}

fn default_terminal_address() -> String {
    "ws://127.0.0.1:8765/ws".to_string()
}

fn default_command_timeout() -> u32 {
    30
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_agent_base_url() -> String {
    "http://127.0.0.1:8765".to_string()
}

fn default_idle_timeout() -> u32 {
    300
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            address: default_terminal_address(),
            timeout_seconds: default_command_timeout(),
            cwd: None,
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: default_agent_base_url(),
            auth_token: None,
            idle_timeout_seconds: default_idle_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}
