//! One-shot HTTP transport: one request per command, whole response at once.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::TransportError;
use super::OutputLine;

const RUN_PATH: &str = "/api/run";
const HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunRequest {
    pub command: String,
    pub timeout_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RunResponse {
    pub ok: bool,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    pub exit_code: i32,
    #[serde(default)]
    pub timed_out: bool,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

pub struct OneShotClient {
    client: Client,
    base_url: String,
    timeout_seconds: u32,
    cwd: Option<String>,
}

impl OneShotClient {
    /// Build a client for `address`.
    ///
    /// Only the TCP connect is bounded client-side; command timeouts are
    /// enforced by the server from `timeout_seconds`.
    pub fn new(
        address: &str,
        timeout_seconds: u32,
        cwd: Option<String>,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|source| TransportError::Request {
                url: address.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url(address),
            timeout_seconds,
            cwd,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn run_url(&self) -> String {
        format!("{}{}", self.base_url, RUN_PATH)
    }

    /// Run one command as a single round trip.
    pub async fn run(
        &self,
        command: &str,
        timeout_seconds: u32,
    ) -> Result<RunResponse, TransportError> {
        let url = self.run_url();
        let request = RunRequest {
            command: command.to_string(),
            timeout_seconds,
            cwd: self.cwd.clone(),
        };

        tracing::debug!(url = %url, command, timeout_seconds, "One-shot run");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: RunResponse = response
            .json()
            .await
            .map_err(|source| TransportError::Decode { url, source })?;

        tracing::debug!(
            exit_code = result.exit_code,
            timed_out = result.timed_out,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            "One-shot run finished"
        );
        Ok(result)
    }

    /// Run `command` with the configured timeout and render the outcome.
    ///
    /// Never fails: a transport failure becomes exactly one Error line.
    pub async fn execute(&self, command: &str) -> Vec<OutputLine> {
        match self.run(command, self.timeout_seconds).await {
            Ok(result) => output_lines(&result),
            Err(err) => {
                tracing::warn!(error = %err, "One-shot run failed");
                vec![OutputLine::error(err.to_string())]
            }
        }
    }

    /// Probe the backend's health endpoint and return its status string.
    pub async fn health(&self) -> Result<String, TransportError> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let health: HealthResponse = response
            .json()
            .await
            .map_err(|source| TransportError::Decode { url, source })?;
        Ok(health.status)
    }
}

/// Split a response into log lines.
///
/// All stdout lines precede all stderr lines; the endpoint does not preserve
/// their real interleaving. Empty fragments are never emitted.
pub fn output_lines(result: &RunResponse) -> Vec<OutputLine> {
    let mut lines: Vec<OutputLine> = split_lines(&result.stdout)
        .map(OutputLine::output)
        .collect();
    lines.extend(split_lines(&result.stderr).map(OutputLine::error));
    if result.timed_out {
        lines.push(OutputLine::error("Command timed out"));
    }
    lines
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
}

/// Strip trailing slashes and a trailing run path from `address`.
fn base_url(address: &str) -> String {
    let trimmed = address.trim().trim_end_matches('/');
    trimmed
        .strip_suffix(RUN_PATH)
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(stdout: &str, stderr: &str) -> RunResponse {
        RunResponse {
            ok: stderr.is_empty(),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: 0,
            timed_out: false,
        }
    }

    #[test]
    fn single_line_stdout() {
        let lines = output_lines(&response("hi\n", ""));
        assert_eq!(lines, vec![OutputLine::output("hi")]);
    }

    #[test]
    fn stdout_precedes_stderr() {
        let lines = output_lines(&response("a\nb\n", "warn\n"));
        assert_eq!(
            lines,
            vec![
                OutputLine::output("a"),
                OutputLine::output("b"),
                OutputLine::error("warn"),
            ]
        );
    }

    #[test]
    fn empty_fragments_are_skipped() {
        let lines = output_lines(&response("\n\nx\n\n", "\r\n"));
        assert_eq!(lines, vec![OutputLine::output("x")]);
    }

    #[test]
    fn timeout_adds_one_error_line() {
        let mut result = response("", "");
        result.timed_out = true;
        result.exit_code = -1;
        assert_eq!(
            output_lines(&result),
            vec![OutputLine::error("Command timed out")]
        );
    }

    #[test]
    fn request_omits_unset_cwd() {
        let request = RunRequest {
            command: "ls".to_string(),
            timeout_seconds: 10,
            cwd: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"command": "ls", "timeout_seconds": 10}));
    }

    #[test]
    fn response_defaults_timed_out() {
        let result: RunResponse =
            serde_json::from_str(r#"{"ok":true,"stdout":"x","stderr":"","exit_code":0}"#).unwrap();
        assert!(!result.timed_out);
    }

    #[test]
    fn base_url_normalization() {
        assert_eq!(base_url("http://host:8765/"), "http://host:8765");
        assert_eq!(base_url("https://host/api/run"), "https://host");
        assert_eq!(base_url("https://host/api/run/"), "https://host");
        assert_eq!(base_url("http://host/prefix"), "http://host/prefix");
    }
}
