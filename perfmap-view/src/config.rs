//! Configuration resolution for perfmap-view
//!
//! Each setting resolves with CLI → environment → TOML → default priority.

use perfmap_common::config::{default_config_path, load_toml_config, TomlConfig};
use perfmap_common::{Error, Result};
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 5741;
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8080";

const ENV_BACKEND_URL: &str = "PERFMAP_BACKEND_URL";
const ENV_OWNER_ID: &str = "PERFMAP_OWNER_ID";
const ENV_REVIEWER: &str = "PERFMAP_REVIEWER";
const ENV_PORT: &str = "PERFMAP_PORT";

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Dashboard API base URL
    pub backend_url: String,
    /// Owner whose task aggregate is loaded at startup
    pub owner_id: i64,
    /// Reviewer identity recorded on review writes
    pub reviewer: String,
    /// HTTP listen port
    pub port: u16,
    /// tracing filter directive
    pub log_level: String,
}

/// Settings passed on the command line (highest priority)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub backend_url: Option<String>,
    pub owner_id: Option<i64>,
    pub reviewer: Option<String>,
    pub port: Option<u16>,
}

/// Resolve the service configuration
///
/// An explicitly passed config file must load; the default config file is
/// optional and parse failures there only warn.
pub fn resolve_config(cli: &CliOverrides) -> Result<ServiceConfig> {
    let toml_config = match &cli.config {
        Some(path) => load_toml_config(path)?,
        None => match default_config_path("perfmap-view") {
            Some(path) => load_toml_config(&path).unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring unreadable default config file");
                TomlConfig::default()
            }),
            None => TomlConfig::default(),
        },
    };

    let backend_url = cli
        .backend_url
        .clone()
        .or_else(|| std::env::var(ENV_BACKEND_URL).ok())
        .or_else(|| toml_config.backend_url.clone())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

    let owner_id = match cli.owner_id {
        Some(id) => id,
        None => match std::env::var(ENV_OWNER_ID).ok() {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                Error::Config(format!("{} must be an integer, got '{}'", ENV_OWNER_ID, raw))
            })?,
            None => toml_config.owner_id.ok_or_else(|| {
                Error::Config(format!(
                    "Owner id not configured. Provide one of:\n\
                     1. CLI: --owner <id>\n\
                     2. Environment: {}=<id>\n\
                     3. TOML config: owner_id = <id>",
                    ENV_OWNER_ID
                ))
            })?,
        },
    };

    let reviewer = cli
        .reviewer
        .clone()
        .or_else(|| std::env::var(ENV_REVIEWER).ok())
        .or_else(|| toml_config.reviewer.clone())
        .ok_or_else(|| {
            Error::Config(format!(
                "Reviewer identity not configured. Provide one of:\n\
                 1. CLI: --reviewer <name>\n\
                 2. Environment: {}=<name>\n\
                 3. TOML config: reviewer = \"<name>\"",
                ENV_REVIEWER
            ))
        })?;

    let port = match cli.port {
        Some(port) => port,
        None => match std::env::var(ENV_PORT).ok() {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                Error::Config(format!("{} must be a port number, got '{}'", ENV_PORT, raw))
            })?,
            None => toml_config.port.unwrap_or(DEFAULT_PORT),
        },
    };

    Ok(ServiceConfig {
        backend_url,
        owner_id,
        reviewer,
        port,
        log_level: toml_config.logging.level,
    })
}
