//! Server settings read from environment variables (after `.env` is loaded).

use crate::errors::{Error, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_SEED_CONFIG: &str = "config.toml";

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to (`BIND_ADDR`)
    pub bind_addr: SocketAddr,
    /// Path of the optional seed file (`SEED_CONFIG`)
    pub seed_config_path: PathBuf,
}

/// Parses a bind address, reporting the offending value on failure.
pub fn parse_bind_addr(value: &str) -> Result<SocketAddr> {
    value.trim().parse().map_err(|e| Error::Config {
        message: format!("Invalid BIND_ADDR {value:?}: {e}"),
    })
}

/// Reads `BIND_ADDR` and `SEED_CONFIG`, falling back to defaults when unset.
pub fn load_server_config() -> Result<ServerConfig> {
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let seed_config_path =
        std::env::var("SEED_CONFIG").unwrap_or_else(|_| DEFAULT_SEED_CONFIG.to_string());

    Ok(ServerConfig {
        bind_addr: parse_bind_addr(&bind_addr)?,
        seed_config_path: PathBuf::from(seed_config_path),
    })
}
