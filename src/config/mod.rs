//
//  quayctl
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration Module
//!
//! Loading and saving of the optional `quayctl` configuration file, and
//! resolution of the connection settings from file, environment and flags.
//!
//! ## Configuration File Location
//!
//! - **Linux**: `~/.config/quayctl/config.toml`
//! - **macOS**: `~/Library/Application Support/quayctl/config.toml`
//! - **Windows**: `C:\Users\<User>\AppData\Roaming\quayctl\config.toml`
//!
//! ## Example Configuration File
//!
//! ```toml
//! host = "https://quay.example.com"
//! token = "vFYyU2D0fHYXvcA3Y5TYfMrIMyVIH9YmxoVLy8mb"
//! validate_certs = true
//! timeout_secs = 30
//! ```
//!
//! ## Precedence
//!
//! Command-line flags win over environment variables (`QUAY_HOST`,
//! `QUAY_TOKEN`, ...), which win over the file. Anything left unset falls
//! back to the defaults below.
//!
//! | Setting | Default |
//! |---------|---------|
//! | `host` | `http://127.0.0.1` |
//! | `validate_certs` | `true` |
//! | `timeout_secs` | `30` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::api::common::ApiError;
use crate::api::transport::TransportOptions;

/// Registry used when no host is configured anywhere.
pub const DEFAULT_HOST: &str = "http://127.0.0.1";

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const CONFIG_KEYS: &[&str] = &["host", "token", "username", "validate_certs", "timeout_secs"];

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_certs: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Loads the configuration from the default location.
    ///
    /// A missing file is not an error; it yields the default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Loads the configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Saves the configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Saves the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", crate::APP_NAME)
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Reads a setting by key, as text.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "host" => self.host.clone(),
            "token" => self.token.clone(),
            "username" => self.username.clone(),
            "validate_certs" => self.validate_certs.map(|v| v.to_string()),
            "timeout_secs" => self.timeout_secs.map(|v| v.to_string()),
            _ => None,
        }
    }

    /// Sets a setting by key from text.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "host" => self.host = Some(value.to_string()),
            "token" => self.token = Some(value.to_string()),
            "username" => self.username = Some(value.to_string()),
            "validate_certs" => {
                self.validate_certs = Some(
                    value
                        .parse()
                        .with_context(|| format!("validate_certs must be true or false, got '{value}'"))?,
                )
            }
            "timeout_secs" => {
                self.timeout_secs = Some(
                    value
                        .parse()
                        .with_context(|| format!("timeout_secs must be a number, got '{value}'"))?,
                )
            }
            _ => anyhow::bail!(
                "Unknown config key '{}'. Valid keys: {}",
                key,
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// Clears a setting by key.
    pub fn unset(&mut self, key: &str) -> Result<()> {
        match key {
            "host" => self.host = None,
            "token" => self.token = None,
            "username" => self.username = None,
            "validate_certs" => self.validate_certs = None,
            "timeout_secs" => self.timeout_secs = None,
            _ => anyhow::bail!(
                "Unknown config key '{}'. Valid keys: {}",
                key,
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }
}

/// Turns a configured host into a base URL.
///
/// A host without a scheme gets `https://`. Any path is kept here and
/// replaced later by the client, which always talks to `/api/v1/`.
pub fn parse_host(host: &str) -> Result<Url, ApiError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(ApiError::InvalidUrl(host.to_string()));
    }
    let candidate = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    let url = Url::parse(&candidate).map_err(|_| ApiError::InvalidUrl(host.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ApiError::InvalidUrl(host.to_string()));
    }
    Ok(url)
}

/// Where and how to connect, after all overrides are applied.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub host: Url,
    pub validate_certs: bool,
    pub timeout: Option<Duration>,
}

impl ConnectionSettings {
    /// Merges explicit overrides with the configuration file.
    pub fn resolve(
        host: Option<&str>,
        validate_certs: Option<bool>,
        config: &Config,
    ) -> Result<Self, ApiError> {
        let host = host
            .or(config.host.as_deref())
            .unwrap_or(DEFAULT_HOST);
        let timeout_secs = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            host: parse_host(host)?,
            validate_certs: validate_certs.or(config.validate_certs).unwrap_or(true),
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        })
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            validate_certs: self.validate_certs,
            timeout: self.timeout,
            ..TransportOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("host", "quay.example.com").unwrap();
        config.set("validate_certs", "false").unwrap();
        config.set("timeout_secs", "5").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.get("validate_certs").as_deref(), Some("false"));
        assert!(loaded.get("token").is_none());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "host = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn test_set_rejects_unknown_and_malformed() {
        let mut config = Config::default();
        assert!(config.set("editor", "vim").is_err());
        assert!(config.set("timeout_secs", "soon").is_err());
        assert!(config.set("validate_certs", "maybe").is_err());

        config.set("token", "abc").unwrap();
        config.unset("token").unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_parse_host() {
        assert_eq!(
            parse_host("quay.example.com").unwrap().as_str(),
            "https://quay.example.com/"
        );
        assert_eq!(
            parse_host("http://127.0.0.1:8080").unwrap().as_str(),
            "http://127.0.0.1:8080/"
        );
        assert!(matches!(parse_host(""), Err(ApiError::InvalidUrl(_))));
        assert!(matches!(
            parse_host("ftp://quay.example.com"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_resolve_precedence() {
        let config = Config {
            host: Some("file.example.com".into()),
            validate_certs: Some(false),
            timeout_secs: Some(0),
            ..Config::default()
        };

        let settings = ConnectionSettings::resolve(None, None, &config).unwrap();
        assert_eq!(settings.host.host_str(), Some("file.example.com"));
        assert!(!settings.validate_certs);
        assert!(settings.timeout.is_none());

        let settings =
            ConnectionSettings::resolve(Some("flag.example.com"), Some(true), &config).unwrap();
        assert_eq!(settings.host.host_str(), Some("flag.example.com"));
        assert!(settings.validate_certs);

        let settings = ConnectionSettings::resolve(None, None, &Config::default()).unwrap();
        assert_eq!(settings.host.as_str(), "http://127.0.0.1/");
        assert_eq!(settings.timeout, Some(Duration::from_secs(30)));
    }
}
