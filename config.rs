//! Configuration management with environment variable support.
//!
//! This module provides [`Config`] for resolving the server address, key file
//! location and HTTP timeout from the `werender.config` JSON file and
//! environment variables.
//!
//! ## Environment Variables
//!
//! - `WERENDER_CONFIG`: Override config file path
//! - `WERENDER_CONFIG_DIR`: Override the directory holding config and key files
//! - `WERENDER_SERVER_ADDRESS`: Override server base address
//! - `WERENDER_KEY_PATH`: Override key file path
//! - `WERENDER_TIMEOUT_SECS`: Override per-request timeout

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable names for configuration overrides
pub const ENV_CONFIG_PATH: &str = "WERENDER_CONFIG";
pub const ENV_CONFIG_DIR: &str = "WERENDER_CONFIG_DIR";
pub const ENV_SERVER_ADDRESS: &str = "WERENDER_SERVER_ADDRESS";
pub const ENV_KEY_PATH: &str = "WERENDER_KEY_PATH";
pub const ENV_TIMEOUT_SECS: &str = "WERENDER_TIMEOUT_SECS";

pub const DEFAULT_SERVER_ADDRESS: &str = "https://api-us-east-2.werender.io/v1";
pub const DEFAULT_SERVER_VERSION: &str = "v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const CONFIG_FILE_NAME: &str = "werender.config";
pub const KEY_FILE_NAME: &str = "werender.key";

const MAX_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server_address: String,
    pub key_path: String,
    pub timeout_secs: u64,
}

/// On-disk layout of `werender.config`. Every level is optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    internal: Option<InternalSection>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct InternalSection {
    #[serde(default)]
    server: Option<ServerSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    #[serde(default)]
    server_address: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            key_path: default_config_dir()
                .join(KEY_FILE_NAME)
                .to_string_lossy()
                .into_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Parse the contents of a `werender.config` file on top of defaults
    pub fn from_json(s: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(s).context("parsing werender.config")?;
        let mut config = Config::default();

        if let Some(address) = file
            .internal
            .and_then(|i| i.server)
            .and_then(|s| s.server_address)
        {
            config.server_address = address;
        }
        if let Some(timeout) = file.timeout_secs {
            config.timeout_secs = timeout;
        }

        config.server_address = normalize_server_address(&config.server_address);
        Ok(config)
    }

    /// Load config from file path
    pub fn load(path: &str) -> Result<Self> {
        let s =
            fs::read_to_string(path).with_context(|| format!("reading config file {}", path))?;
        let mut config = Config::from_json(&s)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load config with environment variable overrides
    /// Priority: ENV vars > config file > defaults
    pub fn load_with_env(path: Option<&str>) -> Result<Self> {
        let config_path = path
            .map(String::from)
            .or_else(|| env::var(ENV_CONFIG_PATH).ok())
            .unwrap_or_else(|| {
                default_config_dir()
                    .join(CONFIG_FILE_NAME)
                    .to_string_lossy()
                    .into_owned()
            });

        let mut config = if Path::new(&config_path).exists() {
            info!(path = %config_path, "loading config from file");
            let s = fs::read_to_string(&config_path)
                .with_context(|| format!("reading config file {}", config_path))?;
            Config::from_json(&s)?
        } else {
            debug!(path = %config_path, "config file not found, using default configuration");
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to config
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(address) = env::var(ENV_SERVER_ADDRESS) {
            debug!(server_address = %address, "overriding server_address from environment");
            self.server_address = normalize_server_address(&address);
        }

        if let Ok(key_path) = env::var(ENV_KEY_PATH) {
            debug!(key_path = %key_path, "overriding key_path from environment");
            self.key_path = key_path;
        }

        if let Ok(timeout) = env::var(ENV_TIMEOUT_SECS) {
            self.timeout_secs = timeout
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds", ENV_TIMEOUT_SECS))?;
            debug!(timeout_secs = self.timeout_secs, "overriding timeout from environment");
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server_address.trim().is_empty() {
            anyhow::bail!("server_address cannot be empty");
        }

        if !self.server_address.starts_with("https://")
            && !self.server_address.starts_with("http://")
        {
            anyhow::bail!(
                "server_address must start with http:// or https://, got '{}'",
                self.server_address
            );
        }

        if self.key_path.trim().is_empty() {
            anyhow::bail!("key_path cannot be empty");
        }

        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            anyhow::bail!(
                "timeout_secs must be between 1 and {}, got {}",
                MAX_TIMEOUT_SECS,
                self.timeout_secs
            );
        }

        if self.server_address.starts_with("http://") {
            warn!(
                server_address = %self.server_address,
                "server address is not HTTPS - signed requests travel in clear text"
            );
        }

        Ok(())
    }

    /// Create a new config with explicit values
    pub fn new(server_address: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self {
            server_address: normalize_server_address(&server_address.into()),
            key_path: key_path.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_key_path(mut self, key_path: impl Into<String>) -> Self {
        self.key_path = key_path.into();
        self
    }
}

/// Strip trailing slashes and make sure the address ends in the API version.
pub fn normalize_server_address(address: &str) -> String {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.ends_with(DEFAULT_SERVER_VERSION) {
        trimmed.to_string()
    } else {
        format!("{}/{}", trimmed, DEFAULT_SERVER_VERSION)
    }
}

/// Directory holding `werender.config` and `werender.key`.
pub fn default_config_dir() -> PathBuf {
    if let Ok(dir) = env::var(ENV_CONFIG_DIR) {
        return PathBuf::from(dir);
    }

    let home = env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    if cfg!(target_os = "macos") {
        home.join("Library").join("Application Support").join("werender")
    } else {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".config"))
            .join("werender")
    }
}
