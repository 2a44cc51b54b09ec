//! Serial port layer.
//!
//! [`SerialPort`] is the timeout-bounded, line-oriented port. It drives a
//! [`Transport`], which is either an OS device ([`SystemTransport`]) or the
//! in-memory [`MockTransport`] used by tests.

pub mod config;
pub mod error;
pub mod line;
pub mod mock;
pub mod serial;
pub mod system;
pub mod transport;

#[cfg(feature = "async")]
pub mod async_port;

pub use config::{
    DataBits, Parity, PartialLinePolicy, PortConfig, PortConfigBuilder, StopBits,
    DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS,
};
pub use error::{PortError, PortErrorKind, PortResult};
pub use line::{Line, LineBuffer, MAX_LINE_LEN};
pub use mock::{MockDevice, MockTransport};
pub use serial::{PortCloser, SerialPort, POLL_SLICE};
pub use system::SystemTransport;
pub use transport::{LineSetting, Transport};

#[cfg(feature = "async")]
pub use async_port::AsyncSerialPort;

/// Names of the serial devices the OS currently reports.
pub fn available_ports() -> PortResult<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
