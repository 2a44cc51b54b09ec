//! Errors from loading, validating and saving the `serial-line` config.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a config file could not be turned into a validated
/// [`Config`](super::Config), or written back out.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists in the resolution order but could not be read.
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not TOML, or does not fit the `[serial]`/`[logging]` schema.
    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The in-memory config could not be rendered as TOML.
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file or its parent directory could not be written.
    #[error("cannot write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A value parsed but is out of range, e.g. `serial.default_baud = 0`.
    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },

    /// A `SERIAL_LINE_*` override is set but does not parse.
    #[error("invalid environment override {var}: {message}")]
    EnvOverride { var: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_override(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.into(),
            message: message.into(),
        }
    }

    /// The file involved, for errors tied to one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Write { path, .. } => {
                Some(path.as_path())
            }
            Self::Serialize(_) | Self::Invalid { .. } | Self::EnvOverride { .. } => None,
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
