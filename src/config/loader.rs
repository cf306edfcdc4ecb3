//! Configuration file loader.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::{BridgeError, ProcessSpec};

/// Errors that can occur while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the config file.
    #[error("Failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The loaded config does not describe a valid process spec.
    #[error("Invalid bridge configuration: {0}")]
    Invalid(#[from] BridgeError),
}

/// Bridge configuration loaded from a TOML file.
///
/// ```toml
/// command = ["python3", "agent.py"]
/// timeout_secs = 30.0
///
/// [env]
/// CLI_MODE = "json"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Command argument vector.
    pub command: Vec<String>,
    /// Working directory for the process.
    pub working_dir: Option<PathBuf>,
    /// Invocation deadline in seconds.
    pub timeout_secs: Option<f64>,
    /// Text encoding label.
    pub encoding: Option<String>,
    /// Environment overrides.
    pub env: BTreeMap<String, String>,
    /// Passthrough options.
    pub options: BTreeMap<String, Value>,
}

impl BridgeConfig {
    /// Load configuration from the first available default location:
    /// `./.clibridge.toml`, then `~/.config/clibridge/config.toml`. Missing
    /// files fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or
    /// parsed.
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut search_paths = vec![PathBuf::from(".clibridge.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("clibridge").join("config.toml"));
        }

        for path in search_paths {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading config file");
                return Self::load(&path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Convert into a validated [`ProcessSpec`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty command, an unsupported
    /// encoding, or a non-finite/negative timeout.
    pub fn into_spec(self) -> Result<ProcessSpec, ConfigError> {
        let mut builder = ProcessSpec::builder(self.command).envs(self.env);
        if let Some(dir) = self.working_dir {
            builder = builder.working_dir(dir);
        }
        if let Some(secs) = self.timeout_secs {
            let timeout =
                Duration::try_from_secs_f64(secs).map_err(|_| BridgeError::InvalidOption {
                    key: "timeout_secs".to_string(),
                    value: secs.to_string(),
                })?;
            builder = builder.timeout(timeout);
        }
        if let Some(encoding) = self.encoding {
            builder = builder.encoding(encoding);
        }
        for (key, value) in self.options {
            builder = builder.option(key, value);
        }
        Ok(builder.build()?)
    }
}
