mod common;

use common::temp_config;
use shellstream::config::{AgentConfig, Config, ConfigError, TerminalConfig};

#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.terminal.address, "ws://127.0.0.1:8765/ws");
    assert_eq!(config.terminal.timeout_seconds, 30);
    assert!(config.terminal.cwd.is_none());
    assert_eq!(config.terminal.connect_timeout_seconds, 5);

    assert_eq!(config.agent.base_url, "http://127.0.0.1:8765");
    assert!(config.agent.auth_token.is_none());
    assert_eq!(config.agent.idle_timeout_seconds, 300);
    assert_eq!(config.agent.connect_timeout_seconds, 5);
}

#[test]
fn test_config_path_ends_with_expected() {
    let path = Config::config_path();
    assert!(path.ends_with("shellstream/config.toml"));
}

#[test]
fn test_validation_passes_for_default() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_load_full_file() {
    let (_dir, path) = temp_config(
        r#"
[terminal]
address = "https://shell.example.com/api/run"
timeout_seconds = 120
cwd = "/workspace"

[agent]
base_url = "https://agent.example.com"
auth_token = "secret"
idle_timeout_seconds = 60
"#,
    );

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.terminal.address, "https://shell.example.com/api/run");
    assert_eq!(config.terminal.timeout_seconds, 120);
    assert_eq!(config.terminal.cwd.as_deref(), Some("/workspace"));
    assert_eq!(config.terminal.connect_timeout_seconds, 5);
    assert_eq!(config.agent.auth_token.as_deref(), Some("secret"));
    assert_eq!(config.agent.idle_timeout_seconds, 60);
}

#[test]
fn test_partial_file_uses_defaults() {
    let (_dir, path) = temp_config("[agent]\nbase_url = \"http://10.0.0.2:9000\"\n");

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.terminal, TerminalConfig::default());
    assert_eq!(config.agent.base_url, "http://10.0.0.2:9000");
    assert_eq!(config.agent.idle_timeout_seconds, 300);
}

#[test]
fn test_empty_file_is_default() {
    let (_dir, path) = temp_config("");
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_zero_command_timeout_rejected() {
    let (_dir, path) = temp_config("[terminal]\ntimeout_seconds = 0\n");

    match Config::load_from(&path).unwrap_err() {
        ConfigError::ValidationError { message } => {
            assert!(message.contains("timeout_seconds"));
        }
        other => panic!("Expected ValidationError, got {other:?}"),
    }
}

#[test]
fn test_zero_idle_timeout_rejected() {
    let config = Config {
        agent: AgentConfig {
            idle_timeout_seconds: 0,
            ..AgentConfig::default()
        },
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn test_empty_address_rejected() {
    let config = Config {
        terminal: TerminalConfig {
            address: "  ".to_string(),
            ..TerminalConfig::default()
        },
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_non_http_agent_url_rejected() {
    let (_dir, path) = temp_config("[agent]\nbase_url = \"ws://agent\"\n");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let (_dir, path) = temp_config("[terminal\naddress = ");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ReadError { .. })
    ));
}
