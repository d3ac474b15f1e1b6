//! Configuration file loading
//!
//! Services resolve each setting with the priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns the TOML schema and file resolution; the per-setting
//! priority logic lives in each service crate.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// tracing filter directive (e.g. "info", "perfmap_view=debug")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// TOML configuration file schema shared by perfmap services
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Base URL of the dashboard REST API
    pub backend_url: Option<String>,
    /// Owner whose task aggregate is loaded at startup
    pub owner_id: Option<i64>,
    /// Reviewer identity sent with review create/update requests
    pub reviewer: Option<String>,
    /// HTTP listen port
    pub port: Option<u16>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default configuration file path for the platform
///
/// `~/.config/perfmap/<service>.toml` on Linux/macOS (via the OS config
/// directory), with `/etc/perfmap/<service>.toml` as the system-wide Linux
/// fallback.
pub fn default_config_path(service: &str) -> Option<PathBuf> {
    let file_name = format!("{}.toml", service);

    if let Some(user_config) = dirs::config_dir().map(|d| d.join("perfmap").join(&file_name)) {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/perfmap").join(&file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load and parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perfmap-view.toml");
        std::fs::write(
            &path,
            r#"
backend_url = "http://localhost:9000"
owner_id = 7
reviewer = "lead"
port = 5741

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = load_toml_config(&path).unwrap();
        assert_eq!(config.backend_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.owner_id, Some(7));
        assert_eq!(config.reviewer.as_deref(), Some("lead"));
        assert_eq!(config.port, Some(5741));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perfmap-view.toml");
        std::fs::write(&path, "owner_id = 3\n").unwrap();

        let config = load_toml_config(&path).unwrap();
        assert_eq!(config.owner_id, Some(3));
        assert!(config.backend_url.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let result = load_toml_config(Path::new("/nonexistent/perfmap.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "backend_url = [not toml").unwrap();

        let result = load_toml_config(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
