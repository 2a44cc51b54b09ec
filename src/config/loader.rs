//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use crate::port::PartialLinePolicy;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_LINE";

/// Config file name
const CONFIG_FILE_NAME: &str = "serial-line.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_LINE_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIAL_LINE_CONFIG` environment variable (explicit path)
    /// 2. `./serial-line.toml` (current directory)
    /// 3. `serial-line.toml` in the platform config directory
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    ///
    /// Environment overrides that fail to parse are ignored here.
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        if let Err(e) = apply_env_overrides(&mut config) {
            debug!(error = %e, "ignoring environment override");
        }

        Self {
            config_path: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        debug!(path = %path.display(), "explicit config path does not exist");
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    get_default_config_path().filter(|path| path.exists())
}

/// Platform config directory, e.g. `~/.config/serial-line` on Linux.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "serial-line").map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "loaded configuration file");
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse `SERIAL_LINE_<key>` if it is set.
fn env_value<T: FromStr>(key: &str, message: &str) -> ConfigResult<Option<T>> {
    let var = format!("{ENV_PREFIX}_{key}");
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_override(var, message)),
        Err(_) => Ok(None),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern `SERIAL_LINE_<SECTION>_<KEY>`:
/// - `SERIAL_LINE_SERIAL_DEFAULT_BAUD=4800`
/// - `SERIAL_LINE_SERIAL_READ_TIMEOUT_MS=1000`
/// - `SERIAL_LINE_LOGGING_LEVEL=serial_line=debug`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some(baud) = env_value("SERIAL_DEFAULT_BAUD", "expected a baud rate")? {
        config.serial.default_baud = baud;
    }
    if let Some(ms) = env_value("SERIAL_READ_TIMEOUT_MS", "expected milliseconds")? {
        config.serial.read_timeout_ms = ms;
    }
    if let Some(ms) = env_value("SERIAL_WRITE_TIMEOUT_MS", "expected milliseconds")? {
        config.serial.write_timeout_ms = ms;
    }
    if let Some(policy) =
        env_value::<PartialLinePolicy>("SERIAL_PARTIAL_LINE", "expected return or retain")?
    {
        config.serial.partial_line = policy;
    }

    if let Ok(level) = std::env::var(format!("{ENV_PREFIX}_LOGGING_LEVEL")) {
        config.logging.level = level;
    }
    if let Some(format) =
        env_value::<LogFormat>("LOGGING_FORMAT", "expected json, pretty or compact")?
    {
        config.logging.format = format;
    }

    Ok(())
}
