//! Streaming client for a remote command shell and a build-agent service.

pub mod agent;
pub mod cancel;
pub mod config;
pub mod logging;
pub mod terminal;
pub mod transport;
pub mod utf8;
