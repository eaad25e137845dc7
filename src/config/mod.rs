//! Configuration loaded from `config.toml`.

pub mod loader;
pub mod types;

pub use loader::ConfigError;
pub use types::{AgentConfig, Config, TerminalConfig};
