//! Configuration file support
//!
//! Every field has a default, so a missing file or a partial file both work.

use std::{
    fs,
    path::{Path, PathBuf},
};

use bmctrace_engine::{HarnessConfig, ParseOptions};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How reports are matched to the source
    pub parser: ParseOptions,
    /// HTTP server settings
    pub server: ServerConfig,
    /// Ranges used by generated harnesses
    pub harness: HarnessConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 5000 }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| eyre::eyre!("Unable to determine home directory"))?;
        Ok(home.join(".bmctrace.toml"))
    }

    /// Load the configuration.
    ///
    /// An explicitly given file must exist. The default file is optional and
    /// defaults are used when it is absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let config_path = Self::config_path()?;
        if !config_path.exists() {
            debug!("Config file not found at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load the configuration from `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as TOML: {path:?}"))?;

        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bmctrace.toml");
        fs::write(&path, "[server]\nport = 8080\n\n[harness]\nnondet_int_max = 7\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.harness.nondet_int_max, 7);
        assert_eq!(config.harness.nondet_int_min, -100);
        assert_eq!(config.parser.file_name, None);
    }

    #[test]
    fn test_parser_section() {
        let config: Config = toml::from_str("[parser]\nfile_name = \"prog.py\"\n").unwrap();
        assert_eq!(config.parser.file_name.as_deref(), Some("prog.py"));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[server\nport = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    #[serial]
    fn test_missing_default_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let saved_home = std::env::var_os("HOME");
        std::env::set_var("HOME", dir.path());

        let path = Config::config_path().unwrap();
        let config = Config::load(None).unwrap();

        match saved_home {
            Some(home) => std::env::set_var("HOME", home),
            None => std::env::remove_var("HOME"),
        }

        assert_eq!(path, dir.path().join(".bmctrace.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_default_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".bmctrace.toml"), "[server]\nhost = \"0.0.0.0\"\n").unwrap();
        let saved_home = std::env::var_os("HOME");
        std::env::set_var("HOME", dir.path());

        let config = Config::load(None);

        match saved_home {
            Some(home) => std::env::set_var("HOME", home),
            None => std::env::remove_var("HOME"),
        }

        assert_eq!(config.unwrap().server.host, "0.0.0.0");
    }
}
