//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use shellstream::config::{AgentConfig, TerminalConfig};
use shellstream::terminal::Terminal;
use shellstream::transport::{LineKind, OutputLine};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Write `content` to a temporary `config.toml`.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}

/// Agent settings pointing at a mock backend.
pub fn agent_config(base_url: &str) -> AgentConfig {
    AgentConfig {
        base_url: base_url.to_string(),
        idle_timeout_seconds: 5,
        connect_timeout_seconds: 2,
        ..AgentConfig::default()
    }
}

/// Terminal settings with short timeouts.
pub fn terminal_config() -> TerminalConfig {
    TerminalConfig {
        timeout_seconds: 10,
        connect_timeout_seconds: 2,
        ..TerminalConfig::default()
    }
}

/// Pump the terminal until `done` holds for its log, or fail after 5 seconds.
pub async fn pump_until(terminal: &mut Terminal, done: impl Fn(&[OutputLine]) -> bool) {
    let wait = async {
        while !done(terminal.log().lines()) {
            if !terminal.pump().await {
                break;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("terminal did not reach the expected state");
    assert!(
        done(terminal.log().lines()),
        "transport closed early: {:?}",
        terminal.log().lines()
    );
}

/// Texts of all lines of one kind.
pub fn texts(lines: &[OutputLine], kind: LineKind) -> Vec<String> {
    lines
        .iter()
        .filter(|l| l.kind == kind)
        .map(|l| l.text.clone())
        .collect()
}
