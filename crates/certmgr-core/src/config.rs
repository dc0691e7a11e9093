//! Settings resolution for certmgr.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Settings file (`$XDG_CONFIG_HOME/certmgr/settings.json`, or an explicit path)
//! 3. Environment variables
//!
//! The API host and port are deliberately left optional here: the provider
//! layers its own config block and `CERTMGR_HOST` / `CERTMGR_PORT` on top and
//! reports missing or malformed values as diagnostics.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default request timeout for the in-process HTTP transport (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Complete certmgr settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings for reaching the certmgr API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: Option<String>,
    pub port: Option<i64>,
    pub scheme: Scheme,
    pub transport: TransportKind,
    /// Required prefix of the PTR name the host resolves to. `None` accepts any name.
    pub ptr_prefix: Option<String>,
    /// Skip the forward/reverse DNS step and address `host` as given.
    pub verbatim_host: bool,
    pub timeout_secs: u64,
    pub curl_bin: PathBuf,
    pub delete_by: DeleteBy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            scheme: Scheme::Https,
            transport: TransportKind::Curl,
            ptr_prefix: None,
            verbatim_host: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            curl_bin: PathBuf::from("curl"),
            delete_by: DeleteBy::Id,
        }
    }
}

/// URL scheme used to reach the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Https,
    Http,
}

impl Scheme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "https" => Ok(Self::Https),
            "http" => Ok(Self::Http),
            other => Err(Error::Config(format!("unknown scheme {other:?}"))),
        }
    }
}

/// How requests reach the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// In-process reqwest client.
    Http,
    /// `curl --negotiate` subprocess, which handles the Kerberos handshake.
    Curl,
}

impl FromStr for TransportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "curl" => Ok(Self::Curl),
            other => Err(Error::Config(format!("unknown transport {other:?}"))),
        }
    }
}

/// Which identity the certificate resource deletes by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteBy {
    /// Delete the single staged entry carrying the tracked id.
    #[default]
    Id,
    /// Drain every staged entry matching the hostname.
    Hostname,
}

impl FromStr for DeleteBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "hostname" => Ok(Self::Hostname),
            other => Err(Error::Config(format!("unknown delete strategy {other:?}"))),
        }
    }
}

/// Load settings with hierarchical resolution.
///
/// An explicit `path` must exist; the global settings file is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading settings file");
            load_config_file(path)?
        }
        None => match global_config_path() {
            Some(global) if global.exists() => {
                debug!(path = %global.display(), "Loading global settings file");
                load_config_file(&global)?
            }
            _ => {
                debug!("No settings file found, using defaults");
                Config::default()
            }
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global settings file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("certmgr").join("settings.json"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `CERTMGR_*` overrides. Values that fail to parse are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("CERTMGR_TRANSPORT") {
        match val.parse() {
            Ok(kind) => config.api.transport = kind,
            Err(_) => warn!(value = %val, "Ignoring invalid CERTMGR_TRANSPORT"),
        }
    }
    if let Some(val) = lookup("CERTMGR_SCHEME") {
        match val.parse() {
            Ok(scheme) => config.api.scheme = scheme,
            Err(_) => warn!(value = %val, "Ignoring invalid CERTMGR_SCHEME"),
        }
    }
    if let Some(val) = lookup("CERTMGR_PTR_PREFIX") {
        config.api.ptr_prefix = Some(val).filter(|p| !p.is_empty());
    }
    if let Some(val) = lookup("CERTMGR_VERBATIM_HOST") {
        match val.parse() {
            Ok(flag) => config.api.verbatim_host = flag,
            Err(_) => warn!(value = %val, "Ignoring invalid CERTMGR_VERBATIM_HOST"),
        }
    }
    if let Some(val) = lookup("CERTMGR_TIMEOUT_SECS") {
        match val.parse() {
            Ok(n) => config.api.timeout_secs = n,
            Err(_) => warn!(value = %val, "Ignoring invalid CERTMGR_TIMEOUT_SECS"),
        }
    }
    if let Some(val) = lookup("CERTMGR_CURL_BIN") {
        config.api.curl_bin = PathBuf::from(val);
    }
    if let Some(val) = lookup("CERTMGR_DELETE_BY") {
        match val.parse() {
            Ok(by) => config.api.delete_by = by,
            Err(_) => warn!(value = %val, "Ignoring invalid CERTMGR_DELETE_BY"),
        }
    }
    if let Some(val) = lookup("CERTMGR_LOG_LEVEL") {
        config.log_level = val;
    }
}
