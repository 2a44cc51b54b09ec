//! Serial Line Library
//!
//! Timeout-bounded serial port access with line-oriented reads, for talking to
//! instruments and other devices that speak `\r\n`-terminated text.
//!
//! # Modules
//!
//! - `port`: the serial port itself, its configuration, errors and transports
//! - `config`: TOML configuration for the `serial-line` tool
//! - `logging`: tracing subscriber setup for applications
//!
//! # Example
//!
//! ```no_run
//! use serial_line::{PortConfig, SerialPort};
//!
//! let config = PortConfig::from_json(r#"{"port": "/dev/ttyUSB1", "baudRate": 4800}"#)?;
//! let mut port = SerialPort::open(config)?;
//! port.write_str("$RECALL\r\n")?;
//! let reply = port.read_line_str()?;
//! port.close();
//! # Ok::<(), serial_line::PortError>(())
//! ```

pub mod config;
pub mod logging;
pub mod port;

pub use port::{
    DataBits, Line, Parity, PartialLinePolicy, PortCloser, PortConfig, PortError, PortErrorKind,
    PortResult, SerialPort, StopBits, Transport,
};

#[cfg(feature = "async")]
pub use port::AsyncSerialPort;

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
