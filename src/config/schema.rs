//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! Every section has defaults, so an empty file (or no file) is valid.

use super::error::{ConfigError, ConfigResult};
use crate::port::{
    PartialLinePolicy, PortConfig, PortConfigBuilder, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for ports opened by the CLI
    pub serial: SerialDefaults,
    pub logging: LoggingConfig,
}

impl Config {
    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.default_baud == 0 {
            return Err(ConfigError::invalid(
                "serial.default_baud",
                "must be positive",
            ));
        }
        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("not a valid filter: {}", self.logging.level),
            ));
        }
        Ok(())
    }
}

/// Serial port defaults section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialDefaults {
    /// Baud rate used when none is given on the command line
    pub default_baud: u32,
    /// Read timeout in milliseconds; 0 waits until data or close
    pub read_timeout_ms: u64,
    /// Write timeout in milliseconds; 0 waits until everything is accepted
    pub write_timeout_ms: u64,
    /// What a timed-out line read does with bytes that lack a terminator
    pub partial_line: PartialLinePolicy,
    /// Friendly names for device paths, e.g. `gps = "/dev/ttyUSB1"`
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialDefaults {
    fn default() -> Self {
        Self {
            default_baud: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_TIMEOUT_MS,
            partial_line: PartialLinePolicy::Return,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialDefaults {
    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// A port config builder for `name` seeded with these defaults.
    pub fn port_builder(&self, name: &str) -> PortConfigBuilder {
        PortConfig::builder(self.resolve_port(name))
            .baud_rate(self.default_baud)
            .read_timeout_millis(self.read_timeout_ms)
            .write_timeout_millis(self.write_timeout_ms)
            .partial_line(self.partial_line)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "serial_line=debug"
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    Compact,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
        })
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(ConfigError::invalid(
                "logging.format",
                format!("expected json, pretty or compact, got {other}"),
            )),
        }
    }
}
