//! Reader configuration via `chainread.toml`
//!
//! Client and server each load their own copy; the session default encoding
//! is configured independently on both sides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::EncodingVersion;
use crate::error::{Error, Result};

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "chainread.toml";

/// Reader session configuration.
///
/// # Example
///
/// ```toml
/// # Session default encoding: json, json-stringified, cbor or dynamic
/// encoding = "cbor"
/// # call_timeout_ms = 30000
/// service_name = "contract-reader"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Session default encoding, by name or numeric tag
    #[serde(default = "default_encoding_str")]
    pub encoding: String,
    /// Deadline applied to calls whose context carries none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timeout_ms: Option<u64>,
    /// Name reported by lifecycle calls
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_encoding_str() -> String {
    EncodingVersion::default().name().to_string()
}

fn default_service_name() -> String {
    "contract-reader".to_string()
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            encoding: default_encoding_str(),
            call_timeout_ms: None,
            service_name: default_service_name(),
        }
    }
}

impl ReaderConfig {
    /// Config using `encoding` and defaults elsewhere
    pub fn with_encoding(encoding: EncodingVersion) -> Self {
        Self {
            encoding: encoding.name().to_string(),
            ..Self::default()
        }
    }

    /// Parse the encoding setting.
    ///
    /// # Errors
    ///
    /// `InvalidEncoding` for an unknown numeric tag, `InvalidArgument` for an
    /// unknown name.
    pub fn encoding(&self) -> Result<EncodingVersion> {
        self.encoding.trim().parse()
    }

    /// Per-call timeout, if configured
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Contract reader configuration
#
# Session default encoding for outgoing payloads.
#   "json"             = baseline JSON (tag 0)
#   "json-stringified" = JSON with numbers as strings (tag 1)
#   "cbor"             = canonical CBOR (tag 2, default)
#   "dynamic"          = tagged dynamic values (tag 3)
# Incoming payloads are always decoded by their own tag.
encoding = "cbor"

# Deadline for calls made without one (milliseconds).
# call_timeout_ms = 30000

service_name = "contract-reader"
"#
    }

    /// Parse and validate config text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ReaderConfig = toml::from_str(content).map_err(|e| {
            Error::invalid_argument(format!("Failed to parse reader config: {}", e))
        })?;
        config.encoding()?;
        Ok(config)
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or names an
    /// unknown encoding.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::internal(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::internal(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::internal(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
