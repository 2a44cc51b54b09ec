//! Configuration for the `serial-line` tool.
//!
//! TOML configuration with environment variable overrides. The library's
//! [`SerialPort`](crate::port::SerialPort) never reads it; it only seeds the
//! port configs the CLI builds and sets up logging.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_LINE_CONFIG` environment variable (explicit path)
//! 2. `./serial-line.toml` (current directory)
//! 3. `~/.config/serial-line/serial-line.toml` (Linux), or the platform
//!    equivalent reported by `directories`
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `SERIAL_LINE_<SECTION>_<KEY>`, e.g.
//! `SERIAL_LINE_SERIAL_DEFAULT_BAUD=4800` or `SERIAL_LINE_LOGGING_FORMAT=json`.
//!
//! # Example
//!
//! ```toml
//! [serial]
//! default_baud = 4800
//! read_timeout_ms = 1000
//! write_timeout_ms = 500
//! partial_line = "return"
//!
//! [serial.port_aliases]
//! gps = "/dev/ttyUSB1"
//!
//! [logging]
//! level = "serial_line=debug"
//! format = "compact"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, SerialDefaults};
