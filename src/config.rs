//! Client configuration.
//!
//! Settings live in an optional TOML file (conventionally `fotocrib.toml`).
//! The file is sparse: it is merged over the stock defaults, so it only needs
//! the keys it wants to change. Unknown keys are rejected to catch typos.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! endpoint = "http://fotocrib.com/fototools.php"
//! timeout_secs = 30          # Whole request, connect through last byte
//! connect_timeout_secs = 10
//! user_agent = "fotocrib/<version>"
//! decode = "sniff"           # or "source-extension"
//! output_dir = "."           # Where <name>.<format> files are written
//! max_response_bytes = 52428800
//! ```

use crate::codec::DecodeStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The public fotocrib processing script.
pub const DEFAULT_ENDPOINT: &str = "http://fotocrib.com/fototools.php";

/// Largest response body accepted by default (50 MiB).
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 50 * 1024 * 1024;

/// Config file the CLI picks up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "fotocrib.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the processing script; query parameters are appended.
    pub endpoint: String,
    /// Total request timeout in seconds.
    pub timeout_secs: u64,
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// How the response's image format is determined.
    pub decode: DecodeStrategy,
    /// Directory output files are written into.
    pub output_dir: PathBuf,
    /// Responses larger than this are rejected without being buffered.
    pub max_response_bytes: u64,
}

fn default_user_agent() -> String {
    format!("fotocrib/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: default_user_agent(),
            decode: DecodeStrategy::default(),
            output_dir: PathBuf::from("."),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::Validation(format!("endpoint is not a URL: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(
                "endpoint must be an http:// or https:// URL".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.max_response_bytes == 0 {
            return Err(ConfigError::Validation(
                "max_response_bytes must be greater than 0".into(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ClientConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ClientConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ClientConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file, layering it over the stock defaults.
///
/// `None` or a path that does not exist yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let overlay = match path {
        Some(p) if p.exists() => {
            let content = fs::read_to_string(p)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        _ => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock config file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# fotocrib configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Processing script on the remote service. Operation parameters are
# appended as a query string.
endpoint = "http://fotocrib.com/fototools.php"

# Give up on a request after this many seconds (connect through last byte).
timeout_secs = 30

# Give up on establishing the connection after this many seconds.
connect_timeout_secs = 10

# How to tell what kind of image the service sent back:
#   "sniff"            - inspect the response bytes, fall back to the
#                        source URL's extension
#   "source-extension" - trust the source URL's extension
decode = "sniff"

# Directory that <name>.<format> output files are written into.
output_dir = "."

# Refuse responses larger than this many bytes (50 MiB).
max_response_bytes = 52428800

# User-Agent header. Defaults to fotocrib/<version>.
# user_agent = "fotocrib"
"##
}
